//! Channel upload feed
//!
//! Two spellings of the same request:
//! - GET /api/feed/unauthenticated?channels=a,b
//! - GET /api/feed/channels=a,b

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::models::FeedItem;
use crate::services::channel_feed::parse_channel_list;
use crate::AppState;

const PATH_PREFIX: &str = "channels=";

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub channels: Option<String>,
    pub preview: Option<String>,
}

impl FeedParams {
    fn preview(&self) -> bool {
        self.preview.as_deref() == Some("1")
    }
}

async fn build_feed(state: &AppState, raw_channels: &str, preview: bool) -> ApiResult<Json<Vec<FeedItem>>> {
    let channel_ids = parse_channel_list(raw_channels);
    if channel_ids.is_empty() {
        return Err(ApiError::BadRequest("No valid channel IDs provided".to_string()));
    }

    Ok(Json(state.channel_feed.feed(&channel_ids, preview).await))
}

/// GET /api/feed/unauthenticated?channels=&preview=1
pub async fn feed_unauthenticated(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> ApiResult<Json<Vec<FeedItem>>> {
    let channels = params.channels.clone().unwrap_or_default();
    build_feed(&state, &channels, params.preview()).await
}

/// GET /api/feed/channels=a,b
pub async fn feed_by_path(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(params): Query<FeedParams>,
) -> ApiResult<Json<Vec<FeedItem>>> {
    let channels = segment.strip_prefix(PATH_PREFIX).ok_or_else(|| {
        ApiError::NotFound(format!("Route not found: /api/feed/{}", segment))
    })?;
    build_feed(&state, channels, params.preview()).await
}
