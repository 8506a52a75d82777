//! Streaming endpoints
//!
//! GET /api/music/find?name=&artist=  - free text to a catalog track
//! GET /api/stream?id=                - media id to playable streams

use axum::{
    extract::{Query, State},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::present;
use crate::error::{ApiError, ApiResult};
use crate::services::{MatchOutcome, MatchQuery};
use crate::AppState;

static MEDIA_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap());

/// Reject anything that is not a plausible media id before it reaches a URL
pub fn validate_media_id(id: &str) -> ApiResult<()> {
    if MEDIA_ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Invalid media id: {}", id)))
    }
}

#[derive(Debug, Deserialize)]
pub struct FindParams {
    pub name: Option<String>,
    pub artist: Option<String>,
}

/// GET /api/music/find
pub async fn find_music(
    State(state): State<AppState>,
    Query(params): Query<FindParams>,
) -> ApiResult<Json<Value>> {
    let (name, artist) = match (present(&params.name), present(&params.artist)) {
        (Some(name), Some(artist)) => (name, artist),
        _ => {
            return Err(ApiError::BadRequest(
                "Missing required parameters: name and artist are required".to_string(),
            ))
        }
    };

    let query = MatchQuery::new(name, artist);
    match state.matcher.match_track(&query).await? {
        MatchOutcome::Found(track) => {
            info!(name = %name, artist = %artist, video_id = %track.id, "Track matched");
            Ok(Json(json!({"success": true, "data": track})))
        }
        MatchOutcome::NoResults => Err(ApiError::NotFound("Song not found".to_string())),
        MatchOutcome::NoAcceptedCandidate => Err(ApiError::NotFound(
            "Song not found after filtering".to_string(),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub id: Option<String>,
}

/// GET /api/stream
pub async fn get_stream(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> ApiResult<Json<Value>> {
    let id = present(&params.id).ok_or_else(|| ApiError::missing("id"))?;
    validate_media_id(id)?;

    match state.resolver.resolve(id).await {
        Ok(resolved) => {
            info!(
                media_id = %id,
                provider = %resolved.provider,
                instance = %resolved.instance,
                streams = resolved.candidates.len(),
                "Stream resolved"
            );
            Ok(Json(json!({
                "success": true,
                "service": resolved.provider.as_str(),
                "instance": resolved.instance,
                "streamingUrls": resolved.candidates,
                "metadata": resolved.metadata,
                "requestedId": id,
                "timestamp": virome_common::time::now()
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            })))
        }
        Err(e) => {
            warn!(media_id = %id, "No mirror instance could resolve the stream");
            Err(e.into())
        }
    }
}
