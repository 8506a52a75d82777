//! Lyrics client (LRCLib)
//!
//! Exact lookup by track and artist first; if that finds nothing, a text
//! search takes its first hit.

use crate::services::http::{UpstreamError, UpstreamHttp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use virome_common::config::UpstreamConfig;

/// Lyrics record in LRCLib's own field names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsRecord {
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    /// Seconds
    pub duration: Option<f64>,
    pub plain_lyrics: Option<String>,
    /// LRC-format lines with timestamps
    pub synced_lyrics: Option<String>,
}

/// A lookup body that describes a miss rather than a record
fn is_miss(status: u16, body: &Value) -> bool {
    !(200..300).contains(&status)
        || !body.is_object()
        || body.get("statusCode").is_some()
}

fn to_record(body: Value) -> Option<LyricsRecord> {
    serde_json::from_value(body).ok()
}

pub struct LyricsClient {
    http: UpstreamHttp,
    base_url: String,
}

impl LyricsClient {
    pub fn new(http: UpstreamHttp, config: &UpstreamConfig) -> Self {
        Self {
            http,
            base_url: config.lyrics_api_base.trim_end_matches('/').to_string(),
        }
    }

    /// `Ok(None)` when neither lookup nor search found anything
    pub async fn lyrics(
        &self,
        title: &str,
        artist: &str,
        duration: Option<u64>,
    ) -> Result<Option<LyricsRecord>, UpstreamError> {
        let duration = duration.map(|d| d.to_string());
        let mut query = vec![("track_name", title), ("artist_name", artist)];
        if let Some(d) = &duration {
            query.push(("duration", d.as_str()));
        }

        let url = format!("{}/get", self.base_url);
        let (status, body) = self.http.get_json_any_status(&url, &query).await?;
        if !is_miss(status, &body) {
            return Ok(to_record(body));
        }

        tracing::debug!(title = %title, artist = %artist, "Exact lyrics lookup missed, searching");
        let phrase = format!("{} {}", title, artist);
        let url = format!("{}/search", self.base_url);
        let results = self.http.get_json(&url, &[("q", phrase.as_str())]).await?;

        Ok(results
            .as_array()
            .and_then(|hits| hits.first().cloned())
            .filter(|hit| hit.is_object() && hit.get("statusCode").is_none())
            .and_then(to_record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_miss_detection() {
        assert!(is_miss(404, &json!({"code": 404, "name": "TrackNotFound"})));
        assert!(is_miss(200, &Value::Null));
        assert!(is_miss(200, &json!({"statusCode": 404})));
        assert!(!is_miss(200, &json!({"trackName": "Yellow"})));
    }

    #[test]
    fn test_record_from_lrclib_body() {
        let record = to_record(json!({
            "id": 1,
            "trackName": "Yellow",
            "artistName": "Coldplay",
            "albumName": "Parachutes",
            "duration": 266.0,
            "instrumental": false,
            "plainLyrics": "Look at the stars",
            "syncedLyrics": "[00:33.10] Look at the stars"
        }))
        .unwrap();

        assert_eq!(record.album_name.as_deref(), Some("Parachutes"));
        assert_eq!(record.duration, Some(266.0));
        assert!(record.synced_lyrics.unwrap().starts_with("[00:33.10]"));
    }
}
