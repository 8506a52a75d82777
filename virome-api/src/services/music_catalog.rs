//! Music catalog client (innertube, WEB_REMIX client)
//!
//! Every call is a POST of `{context, ...params}` to
//! `{music_api_base}/{endpoint}`. Response trees are handed to
//! [`crate::extract::catalog`].

use crate::extract::{catalog, video};
use crate::models::{
    ArtistOverview, ArtistPage, CatalogItem, CollectionPage, MoodSection, Page, ShelfSection,
    Track, VideoSummary,
};
use crate::services::http::{UpstreamError, UpstreamHttp};
use crate::services::identity_matcher::TrackSearch;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use unicode_normalization::UnicodeNormalization;
use virome_common::config::UpstreamConfig;

const CLIENT_NAME: &str = "WEB_REMIX";
const CLIENT_VERSION: &str = "1.20251015.03.00";
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_REGION: &str = "US";

/// Video platform WEB client used for the related-videos sidebar
const WEB_CLIENT_NAME: &str = "WEB";
const WEB_CLIENT_VERSION: &str = "2.20251013.01.00";

const CHARTS_BROWSE_ID: &str = "FEmusic_charts";
const MOODS_BROWSE_ID: &str = "FEmusic_moods_and_genres";

/// Default number of tracks in a watch playlist
pub const WATCH_PLAYLIST_LIMIT: usize = 25;

/// Search filter, sent as an opaque `params` blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFilter {
    Songs,
    Videos,
    Albums,
    Artists,
    Playlists,
    CommunityPlaylists,
    FeaturedPlaylists,
}

impl SearchFilter {
    /// Unknown names mean an unfiltered search
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "songs" => Some(SearchFilter::Songs),
            "videos" => Some(SearchFilter::Videos),
            "albums" => Some(SearchFilter::Albums),
            "artists" => Some(SearchFilter::Artists),
            "playlists" => Some(SearchFilter::Playlists),
            "community_playlists" => Some(SearchFilter::CommunityPlaylists),
            "featured_playlists" => Some(SearchFilter::FeaturedPlaylists),
            _ => None,
        }
    }

    pub fn params(self) -> &'static str {
        match self {
            SearchFilter::Songs => "EgWKAQIIAWoKEAkQAxAEEAoQBQ%3D%3D",
            SearchFilter::Videos => "EgWKAQIQAWoKEAkQAxAEEAoQBQ%3D%3D",
            SearchFilter::Albums => "EgWKAQIYAWoKEAkQAxAEEAoQBQ%3D%3D",
            SearchFilter::Artists => "EgWKAQIgAWoKEAkQAxAEEAoQBQ%3D%3D",
            SearchFilter::Playlists => "EgWKAQIoAWoKEAkQAxAEEAoQBQ%3D%3D",
            SearchFilter::CommunityPlaylists => "EgeKAQQoAEABagoQAxAEEAkQChAF",
            SearchFilter::FeaturedPlaylists => "EgeKAQQoADgBagoQAxAEEAkQChAF",
        }
    }
}

/// Catalog search parameters
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub filter: Option<SearchFilter>,
    /// When set, the query and filter are ignored
    pub continuation: Option<String>,
    pub region: Option<String>,
    pub language: Option<String>,
}

/// Watch-next queue parameters
#[derive(Debug, Clone)]
pub struct WatchRequest {
    pub video_id: Option<String>,
    pub playlist_id: Option<String>,
    pub radio: bool,
    pub shuffle: bool,
    pub limit: usize,
}

impl WatchRequest {
    pub fn radio(video_id: &str, limit: usize) -> Self {
        Self {
            video_id: Some(video_id.to_string()),
            playlist_id: None,
            radio: true,
            shuffle: false,
            limit,
        }
    }

    fn body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        if let Some(video_id) = &self.video_id {
            body.insert("videoId".to_string(), json!(video_id));
        }
        // Radio queues are the automix playlist seeded by the video
        let playlist_id = match (&self.playlist_id, &self.video_id) {
            (Some(id), _) => Some(id.clone()),
            (None, Some(video_id)) if self.radio => Some(format!("RDAMVM{}", video_id)),
            _ => None,
        };
        if let Some(playlist_id) = playlist_id {
            body.insert("playlistId".to_string(), json!(playlist_id));
        }
        body.insert("radio".to_string(), json!(self.radio));
        body.insert("shuffle".to_string(), json!(self.shuffle));
        body
    }
}

/// Client context block for the music catalog
pub fn music_context(region: Option<&str>, language: Option<&str>) -> Value {
    json!({
        "client": {
            "hl": language.unwrap_or(DEFAULT_LANGUAGE),
            "gl": region.unwrap_or(DEFAULT_REGION),
            "clientName": CLIENT_NAME,
            "clientVersion": CLIENT_VERSION,
            "platform": "DESKTOP",
            "utcOffsetMinutes": 0,
        }
    })
}

pub struct MusicCatalog {
    http: UpstreamHttp,
    base_url: String,
    video_api_base: String,
    api_key: Option<String>,
}

impl MusicCatalog {
    pub fn new(http: UpstreamHttp, config: &UpstreamConfig) -> Self {
        Self {
            http,
            base_url: config.music_api_base.trim_end_matches('/').to_string(),
            video_api_base: config.video_api_base.trim_end_matches('/').to_string(),
            api_key: config.music_api_key.clone(),
        }
    }

    async fn post(&self, base: &str, endpoint: &str, context: Value, params: Map<String, Value>) -> Result<Value, UpstreamError> {
        let url = format!("{}/{}", base, endpoint);
        let mut body = params;
        body.insert("context".to_string(), context);

        let mut query = vec![("prettyPrint", "false")];
        if let Some(key) = &self.api_key {
            query.push(("key", key.as_str()));
        }

        self.http.post_json(&url, &query, &Value::Object(body)).await
    }

    async fn call(&self, endpoint: &str, params: Map<String, Value>) -> Result<Value, UpstreamError> {
        self.post(&self.base_url, endpoint, music_context(None, None), params)
            .await
    }

    async fn browse(&self, browse_id: &str, context: Value) -> Result<Value, UpstreamError> {
        let mut params = Map::new();
        params.insert("browseId".to_string(), json!(browse_id));
        self.post(&self.base_url, "browse", context, params).await
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Page<CatalogItem>, UpstreamError> {
        let mut params = Map::new();
        match &request.continuation {
            Some(token) => {
                params.insert("continuation".to_string(), json!(token));
            }
            None => {
                let query: String = request.query.nfc().collect();
                params.insert("query".to_string(), json!(query));
                if let Some(filter) = request.filter {
                    params.insert("params".to_string(), json!(filter.params()));
                }
            }
        }

        let context = music_context(request.region.as_deref(), request.language.as_deref());
        let data = self.post(&self.base_url, "search", context, params).await?;
        Ok(catalog::parse_search_results(&data))
    }

    pub async fn search_suggestions(&self, query: &str) -> Result<Vec<String>, UpstreamError> {
        let mut params = Map::new();
        params.insert("input".to_string(), json!(query.nfc().collect::<String>()));
        let data = self.call("music/get_search_suggestions", params).await?;
        Ok(catalog::parse_suggestions(&data))
    }

    /// `None` when the player response carries no video details
    pub async fn song(&self, video_id: &str) -> Result<Option<Track>, UpstreamError> {
        let mut params = Map::new();
        params.insert("videoId".to_string(), json!(video_id));
        let data = self.call("player", params).await?;
        Ok(catalog::parse_song(&data))
    }

    pub async fn album(&self, browse_id: &str) -> Result<CollectionPage, UpstreamError> {
        let data = self.browse(browse_id, music_context(None, None)).await?;
        Ok(catalog::parse_collection_page(&data))
    }

    /// Accepts ids with or without the `VL` browse prefix
    pub async fn playlist(&self, playlist_id: &str) -> Result<CollectionPage, UpstreamError> {
        let browse_id = format!("VL{}", playlist_id.strip_prefix("VL").unwrap_or(playlist_id));
        let data = self.browse(&browse_id, music_context(None, None)).await?;
        Ok(catalog::parse_collection_page(&data))
    }

    pub async fn artist(&self, browse_id: &str) -> Result<ArtistPage, UpstreamError> {
        let data = self.browse(browse_id, music_context(None, None)).await?;
        Ok(catalog::parse_artist_page(&data))
    }

    pub async fn artist_summary(&self, artist_id: &str, country: &str) -> Result<ArtistOverview, UpstreamError> {
        let data = self.browse(artist_id, music_context(Some(country), None)).await?;
        Ok(catalog::parse_artist_overview(&data))
    }

    pub async fn charts(&self, country: &str) -> Result<Vec<ShelfSection>, UpstreamError> {
        let mut params = Map::new();
        params.insert("browseId".to_string(), json!(CHARTS_BROWSE_ID));
        params.insert("formData".to_string(), json!({"selectedValues": [country]}));
        let data = self.call("browse", params).await?;
        Ok(catalog::parse_shelf_sections(&data))
    }

    pub async fn mood_categories(&self) -> Result<Vec<MoodSection>, UpstreamError> {
        let data = self.browse(MOODS_BROWSE_ID, music_context(None, None)).await?;
        Ok(catalog::parse_mood_sections(&data))
    }

    pub async fn mood_playlists(&self, category_id: &str) -> Result<Vec<CatalogItem>, UpstreamError> {
        let data = self.browse(category_id, music_context(None, None)).await?;
        Ok(catalog::parse_mood_playlists(&data))
    }

    pub async fn watch_playlist(&self, request: &WatchRequest) -> Result<Vec<Track>, UpstreamError> {
        let data = self.call("next", request.body()).await?;
        Ok(catalog::parse_watch_playlist(&data, request.limit))
    }

    /// Related videos from the video platform's watch-next sidebar
    pub async fn related(&self, video_id: &str) -> Result<Vec<VideoSummary>, UpstreamError> {
        let mut params = Map::new();
        params.insert("videoId".to_string(), json!(video_id));
        let context = json!({"client": {
            "clientName": WEB_CLIENT_NAME,
            "clientVersion": WEB_CLIENT_VERSION,
            "hl": DEFAULT_LANGUAGE,
            "gl": DEFAULT_REGION,
        }});
        let data = self.post(&self.video_api_base, "next", context, params).await?;
        Ok(video::parse_related(&data))
    }
}

#[async_trait]
impl TrackSearch for MusicCatalog {
    async fn search_tracks(&self, phrase: &str) -> Result<Vec<Track>, UpstreamError> {
        let page = self
            .search(&SearchRequest {
                query: phrase.to_string(),
                filter: Some(SearchFilter::Songs),
                ..SearchRequest::default()
            })
            .await?;

        Ok(page
            .results
            .into_iter()
            .filter_map(CatalogItem::into_track)
            .collect())
    }
}
