//! HTTP API handlers for virome-api

pub mod discovery;
pub mod entities;
pub mod explore;
pub mod feed;
pub mod health;
pub mod info;
pub mod proxy;
pub mod search;
pub mod streaming;
pub mod ui;

pub use discovery::{get_radio, get_similar, get_top_artists, get_top_tracks, get_trending};
pub use entities::{
    get_album, get_artist, get_artist_summary, get_playlist, get_related, get_song,
};
pub use explore::{get_charts, get_mood_playlists, get_moods, get_watch_playlist};
pub use feed::{feed_by_path, feed_unauthenticated};
pub use health::health_routes;
pub use info::{artist_info, get_lyrics, track_info};
pub use proxy::proxy_media;
pub use search::{search, search_suggestions, yt_search};
pub use streaming::{find_music, get_stream};
pub use ui::{favicon, route_not_found, serve_index};

/// A query value that is present and not blank
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `{"success": true, ...body}`
#[derive(Debug, serde::Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

pub(crate) fn success<T: serde::Serialize>(body: T) -> axum::Json<Success<T>> {
    axum::Json(Success {
        success: true,
        body,
    })
}
