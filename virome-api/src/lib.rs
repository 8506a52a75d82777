//! virome-api library - music and video metadata aggregator
//!
//! Fans requests out to third-party catalog, search, chart, lyrics and
//! stream-mirror services and reshapes their responses into flat JSON.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use virome_common::config::TomlConfig;
use virome_common::time::SystemClock;

pub mod api;
pub mod error;
pub mod extract;
pub mod models;
pub mod services;

use services::mirror_registry::HttpManifestSource;
use services::{
    ChannelFeed, Discovery, IdentityMatcher, LastFm, LyricsClient, MirrorRegistry, MusicCatalog,
    StreamResolver, UpstreamError, UpstreamHttp, VideoSearch,
};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<MusicCatalog>,
    pub video_search: Arc<VideoSearch>,
    pub lastfm: Arc<LastFm>,
    pub lyrics: Arc<LyricsClient>,
    pub discovery: Arc<Discovery>,
    pub channel_feed: Arc<ChannelFeed>,
    pub matcher: Arc<IdentityMatcher>,
    pub resolver: Arc<StreamResolver>,
    /// Client without a whole-request timeout, for proxied media
    pub proxy_http: UpstreamHttp,
}

impl AppState {
    /// Build every upstream client from configuration
    ///
    /// One Mirror Registry is created here and lives as long as the state.
    pub fn new(config: &TomlConfig) -> Result<Self, UpstreamError> {
        let upstream = &config.upstream;
        let http = UpstreamHttp::new(upstream)?;
        let proxy_http = UpstreamHttp::streaming(upstream)?;

        let catalog = Arc::new(MusicCatalog::new(http.clone(), upstream));
        let video_search = Arc::new(VideoSearch::new(http.clone(), upstream));
        let lastfm = Arc::new(LastFm::new(http.clone(), upstream));

        let registry = Arc::new(MirrorRegistry::new(
            Arc::new(HttpManifestSource::new(
                http.clone(),
                config.mirrors.manifest_url.clone(),
            )),
            Arc::new(SystemClock),
            config.mirrors.cache_ttl(),
        ));

        Ok(Self {
            discovery: Arc::new(Discovery::new(
                catalog.clone(),
                lastfm.clone(),
                video_search.clone(),
            )),
            matcher: Arc::new(IdentityMatcher::new(catalog.clone())),
            resolver: Arc::new(StreamResolver::with_default_providers(registry, http.clone())),
            lyrics: Arc::new(LyricsClient::new(http.clone(), upstream)),
            channel_feed: Arc::new(ChannelFeed::new(http, upstream)),
            catalog,
            video_search,
            lastfm,
            proxy_http,
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let search = Router::new()
        .route("/api/search", get(api::search))
        .route("/api/search/suggestions", get(api::search_suggestions))
        .route("/api/yt_search", get(api::yt_search));

    let entities = Router::new()
        .route("/api/songs/:video_id", get(api::get_song))
        .route("/api/albums/:browse_id", get(api::get_album))
        .route("/api/album/:browse_id", get(api::get_album))
        .route("/api/artists/:browse_id", get(api::get_artist))
        .route("/api/artist/info", get(api::artist_info))
        .route("/api/artist/:artist_id", get(api::get_artist_summary))
        .route("/api/playlists/:playlist_id", get(api::get_playlist))
        .route("/api/playlist/:playlist_id", get(api::get_playlist))
        .route("/api/related/:video_id", get(api::get_related))
        .route("/api/track/info", get(api::track_info))
        .route("/api/lyrics", get(api::get_lyrics));

    let explore = Router::new()
        .route("/api/charts", get(api::get_charts))
        .route("/api/moods", get(api::get_moods))
        .route("/api/moods/:category_id", get(api::get_mood_playlists))
        .route("/api/watch_playlist", get(api::get_watch_playlist));

    let streaming = Router::new()
        .route("/api/music/find", get(api::find_music))
        .route("/api/stream", get(api::get_stream))
        .route("/api/proxy", get(api::proxy_media));

    let discovery = Router::new()
        .route("/api/similar", get(api::get_similar))
        .route("/api/trending", get(api::get_trending))
        .route("/api/radio", get(api::get_radio))
        .route("/api/top/artists", get(api::get_top_artists))
        .route("/api/top/tracks", get(api::get_top_tracks))
        .route("/api/feed/unauthenticated", get(api::feed_unauthenticated))
        .route("/api/feed/:channels", get(api::feed_by_path));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/favicon.ico", get(api::favicon))
        .merge(api::health_routes());

    Router::new()
        .merge(search)
        .merge(entities)
        .merge(explore)
        .merge(streaming)
        .merge(discovery)
        .merge(public)
        .fallback(api::route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
