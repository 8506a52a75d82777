//! Scrobble service (Last.fm) client
//!
//! Plain GETs against the 2.0 REST endpoint with `method`, `api_key` and
//! `format=json`. The service reports failures as `{"error": n, "message"}`
//! bodies, often with a 4xx status.

use crate::extract::{array_at, string_at};
use crate::services::http::{UpstreamError, UpstreamHttp};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use virome_common::config::UpstreamConfig;
use virome_common::text::strip_html_tags;

#[derive(Debug, Error)]
pub enum LastFmError {
    #[error("Last.fm API key is not configured")]
    MissingApiKey,

    #[error("Last.fm error: {0}")]
    Service(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarTrack {
    pub title: String,
    pub artist: String,
}

/// Global chart artist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartArtist {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playcount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listeners: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Global chart track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTrack {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playcount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listeners: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistStats {
    pub listeners: Option<String>,
    pub playcount: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistInfo {
    pub name: Option<String>,
    /// Summary with HTML removed
    pub bio: Option<String>,
    pub tags: Vec<String>,
    pub similar: Vec<String>,
    pub stats: ArtistStats,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackInfo {
    pub name: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Milliseconds, as reported
    pub duration: Option<String>,
    pub listeners: Option<String>,
    pub playcount: Option<String>,
    pub tags: Vec<String>,
    pub wiki: Option<String>,
}

/// Text of an image list entry with `size == "large"`
fn large_image(images: &[Value]) -> Option<String> {
    images
        .iter()
        .find(|i| i.get("size").and_then(Value::as_str) == Some("large"))
        .and_then(|i| string_at(i, "/#text"))
}

fn names(entries: &[Value]) -> Vec<String> {
    entries.iter().filter_map(|e| string_at(e, "/name")).collect()
}

/// Last.fm encodes counts as strings, but not always
fn count_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn parse_similar_tracks(data: &Value) -> Vec<SimilarTrack> {
    array_at(data, "/similartracks/track")
        .iter()
        .filter_map(|t| {
            Some(SimilarTrack {
                title: string_at(t, "/name")?,
                artist: string_at(t, "/artist/name")?,
            })
        })
        .collect()
}

pub fn parse_top_artists(data: &Value) -> Vec<ChartArtist> {
    array_at(data, "/artists/artist")
        .iter()
        .filter_map(|a| {
            Some(ChartArtist {
                name: string_at(a, "/name")?,
                playcount: count_at(a, "/playcount"),
                listeners: count_at(a, "/listeners"),
                url: string_at(a, "/url"),
                image: large_image(array_at(a, "/image")),
            })
        })
        .collect()
}

pub fn parse_top_tracks(data: &Value) -> Vec<ChartTrack> {
    array_at(data, "/tracks/track")
        .iter()
        .filter_map(|t| {
            Some(ChartTrack {
                name: string_at(t, "/name")?,
                artist: string_at(t, "/artist/name"),
                playcount: count_at(t, "/playcount"),
                listeners: count_at(t, "/listeners"),
                url: string_at(t, "/url"),
            })
        })
        .collect()
}

pub fn parse_artist_info(data: &Value) -> ArtistInfo {
    let artist = &data["artist"];
    ArtistInfo {
        name: string_at(artist, "/name"),
        bio: string_at(artist, "/bio/summary").map(|s| strip_html_tags(&s)),
        tags: names(array_at(artist, "/tags/tag")),
        similar: names(array_at(artist, "/similar/artist")),
        stats: ArtistStats {
            listeners: count_at(artist, "/stats/listeners"),
            playcount: count_at(artist, "/stats/playcount"),
        },
        image: large_image(array_at(artist, "/image")),
    }
}

pub fn parse_track_info(data: &Value) -> TrackInfo {
    let track = &data["track"];
    TrackInfo {
        name: string_at(track, "/name"),
        artist: string_at(track, "/artist/name"),
        album: string_at(track, "/album/title"),
        duration: count_at(track, "/duration"),
        listeners: count_at(track, "/listeners"),
        playcount: count_at(track, "/playcount"),
        tags: names(array_at(track, "/toptags/tag")),
        wiki: string_at(track, "/wiki/summary").map(|s| strip_html_tags(&s)),
    }
}

pub struct LastFm {
    http: UpstreamHttp,
    base_url: String,
    api_key: Option<String>,
}

impl LastFm {
    pub fn new(http: UpstreamHttp, config: &UpstreamConfig) -> Self {
        Self {
            http,
            base_url: config.lastfm_api_base.clone(),
            api_key: config.lastfm_api_key.clone(),
        }
    }

    async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<Value, LastFmError> {
        let api_key = self.api_key.as_deref().ok_or(LastFmError::MissingApiKey)?;

        let mut query = vec![("method", method), ("api_key", api_key), ("format", "json")];
        query.extend_from_slice(params);

        tracing::debug!(method = %method, "Querying Last.fm");
        let (status, data) = self.http.get_json_any_status(&self.base_url, &query).await?;

        if data.get("error").is_some() {
            let message = string_at(&data, "/message").unwrap_or_else(|| "Last.fm error".to_string());
            return Err(LastFmError::Service(message));
        }
        if !(200..300).contains(&status) {
            return Err(UpstreamError::Status(status, "Last.fm request failed".to_string()).into());
        }
        if data.is_null() {
            return Err(UpstreamError::Parse("Last.fm returned a non-JSON body".to_string()).into());
        }

        Ok(data)
    }

    pub async fn similar_tracks(&self, title: &str, artist: &str, limit: usize) -> Result<Vec<SimilarTrack>, LastFmError> {
        let limit = limit.to_string();
        let data = self
            .call(
                "track.getsimilar",
                &[("artist", artist), ("track", title), ("limit", limit.as_str())],
            )
            .await?;
        Ok(parse_similar_tracks(&data))
    }

    pub async fn top_artists(&self, limit: usize) -> Result<Vec<ChartArtist>, LastFmError> {
        let limit = limit.to_string();
        let data = self.call("chart.gettopartists", &[("limit", limit.as_str())]).await?;
        Ok(parse_top_artists(&data))
    }

    pub async fn top_tracks(&self, limit: usize) -> Result<Vec<ChartTrack>, LastFmError> {
        let limit = limit.to_string();
        let data = self.call("chart.gettoptracks", &[("limit", limit.as_str())]).await?;
        Ok(parse_top_tracks(&data))
    }

    pub async fn artist_info(&self, artist: &str) -> Result<ArtistInfo, LastFmError> {
        let data = self.call("artist.getinfo", &[("artist", artist)]).await?;
        Ok(parse_artist_info(&data))
    }

    pub async fn track_info(&self, title: &str, artist: &str) -> Result<TrackInfo, LastFmError> {
        let data = self
            .call("track.getInfo", &[("artist", artist), ("track", title)])
            .await?;
        Ok(parse_track_info(&data))
    }
}
