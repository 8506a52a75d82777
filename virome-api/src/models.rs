//! Flat output entities
//!
//! Every upstream response shape is mapped into one of these. Optional
//! fields stay `None` when the upstream did not carry them and are omitted
//! from JSON, so clients can tell "unknown" apart from "empty".

use serde::{Deserialize, Serialize};

/// A playable track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Opaque media identifier (video id)
    pub id: String,
    pub title: String,
    pub artist_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// An artist page reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// An album or playlist reference from the music catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    pub id: String,
    pub title: String,
    pub artist_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// A channel from the video platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber_count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_count: Option<String>,
    pub url: String,
}

/// A playlist from the video platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_count: Option<String>,
    pub url: String,
}

/// A plain video from the video platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_time: Option<String>,
    pub url: String,
}

impl VideoSummary {
    /// Short-form video: known duration of one minute or less
    pub fn is_short(&self) -> bool {
        matches!(self.duration_seconds, Some(d) if d > 0 && d <= 60)
    }
}

/// A music catalog search/browse result, discriminated by `resultType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resultType", rename_all = "lowercase")]
pub enum CatalogItem {
    Song(Track),
    Video(Track),
    Artist(ArtistSummary),
    Album(AlbumSummary),
    Playlist(AlbumSummary),
}

impl CatalogItem {
    /// The playable track, for song and video results
    pub fn as_track(&self) -> Option<&Track> {
        match self {
            CatalogItem::Song(t) | CatalogItem::Video(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_track(self) -> Option<Track> {
        match self {
            CatalogItem::Song(t) | CatalogItem::Video(t) => Some(t),
            _ => None,
        }
    }

    /// Identifier of whatever this result points at
    pub fn id(&self) -> &str {
        match self {
            CatalogItem::Song(t) | CatalogItem::Video(t) => &t.id,
            CatalogItem::Artist(a) => &a.id,
            CatalogItem::Album(a) | CatalogItem::Playlist(a) => &a.id,
        }
    }
}

/// A video platform search result, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VideoSearchItem {
    Video(VideoSummary),
    Channel(ChannelSummary),
    Playlist(PlaylistSummary),
}

/// One page of results plus the token for the next page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub results: Vec<T>,
    pub continuation_token: Option<String>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            continuation_token: None,
        }
    }
}

// ============================================================================
// Catalog pages
// ============================================================================

/// Album or playlist detail page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Album artist or playlist owner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub tracks: Vec<CatalogItem>,
}

/// Artist detail page header
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Artist overview: avatar, top-songs playlist and related artists
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistOverview {
    pub artist_name: Option<String>,
    pub artist_avatar: Option<String>,
    pub playlist_id: Option<String>,
    pub recommended_artists: Option<Vec<ArtistSummary>>,
}

/// Titled shelf of catalog results (charts, home-style carousels)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfSection {
    pub title: String,
    pub items: Vec<CatalogItem>,
}

/// One mood or genre button
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodCategory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browse_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodSection {
    pub title: String,
    pub items: Vec<MoodCategory>,
}

// ============================================================================
// Channel feed
// ============================================================================

/// Channel upload in the subscription-feed shape
///
/// Numeric fields are strings: feed clients consume this shape verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    pub author_id: String,
    pub duration: String,
    pub author: String,
    pub views: String,
    /// Approximate upload time, epoch milliseconds
    pub uploaded: String,
    pub title: String,
    pub is_short: bool,
    pub thumbnail: String,
}

impl FeedItem {
    pub fn uploaded_ms(&self) -> i64 {
        self.uploaded.parse().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_track_omits_unknown_fields() {
        let track = Track {
            id: "abc".to_string(),
            title: "Yellow".to_string(),
            artist_names: vec!["Coldplay".to_string()],
            duration_seconds: None,
            thumbnail_url: None,
        };

        let value = serde_json::to_value(&track).unwrap();
        assert_eq!(
            value,
            json!({"id": "abc", "title": "Yellow", "artistNames": ["Coldplay"]})
        );
    }

    #[test]
    fn test_catalog_item_discriminator() {
        let item = CatalogItem::Artist(ArtistSummary {
            id: "UC123".to_string(),
            name: "Coldplay".to_string(),
            thumbnail_url: Some("https://img/1.jpg".to_string()),
        });

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["resultType"], "artist");
        assert_eq!(value["id"], "UC123");
        assert_eq!(value["thumbnailUrl"], "https://img/1.jpg");
        assert_eq!(item.id(), "UC123");
        assert!(item.as_track().is_none());
    }

    #[test]
    fn test_short_detection() {
        let mut video = VideoSummary {
            id: "v".to_string(),
            title: None,
            channel_id: None,
            channel_name: None,
            duration_text: None,
            duration_seconds: Some(45),
            thumbnail_url: None,
            view_count_text: None,
            published_time: None,
            url: "https://www.youtube.com/watch?v=v".to_string(),
        };
        assert!(video.is_short());

        video.duration_seconds = Some(61);
        assert!(!video.is_short());

        video.duration_seconds = None;
        assert!(!video.is_short());
    }
}
