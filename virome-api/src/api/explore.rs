//! Explore endpoints: charts, moods, watch playlists

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::entities::CountryParams;
use super::present;
use crate::error::{ApiError, ApiResult};
use crate::models::{CatalogItem, MoodSection, ShelfSection};
use crate::services::music_catalog::{WatchRequest, WATCH_PLAYLIST_LIMIT};
use crate::AppState;

/// GET /api/charts?country=
pub async fn get_charts(
    State(state): State<AppState>,
    Query(params): Query<CountryParams>,
) -> ApiResult<Json<Vec<ShelfSection>>> {
    let country = present(&params.country).unwrap_or("US");
    Ok(Json(state.catalog.charts(country).await?))
}

/// GET /api/moods
pub async fn get_moods(State(state): State<AppState>) -> ApiResult<Json<Vec<MoodSection>>> {
    Ok(Json(state.catalog.mood_categories().await?))
}

/// GET /api/moods/:categoryId
pub async fn get_mood_playlists(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> ApiResult<Json<Vec<CatalogItem>>> {
    Ok(Json(state.catalog.mood_playlists(&category_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchPlaylistParams {
    pub video_id: Option<String>,
    pub playlist_id: Option<String>,
    pub radio: Option<String>,
    pub shuffle: Option<String>,
    pub limit: Option<usize>,
}

impl WatchPlaylistParams {
    fn into_request(self) -> ApiResult<WatchRequest> {
        let video_id = present(&self.video_id).map(str::to_string);
        let playlist_id = present(&self.playlist_id).map(str::to_string);
        if video_id.is_none() && playlist_id.is_none() {
            return Err(ApiError::BadRequest(
                "Provide either videoId or playlistId".to_string(),
            ));
        }

        Ok(WatchRequest {
            video_id,
            playlist_id,
            radio: self.radio.as_deref() == Some("true"),
            shuffle: self.shuffle.as_deref() == Some("true"),
            limit: self.limit.unwrap_or(WATCH_PLAYLIST_LIMIT),
        })
    }
}

/// GET /api/watch_playlist
pub async fn get_watch_playlist(
    State(state): State<AppState>,
    Query(params): Query<WatchPlaylistParams>,
) -> ApiResult<Json<Value>> {
    let request = params.into_request()?;
    let tracks = state.catalog.watch_playlist(&request).await?;
    Ok(Json(json!({"tracks": tracks})))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(video_id: Option<&str>, playlist_id: Option<&str>) -> WatchPlaylistParams {
        WatchPlaylistParams {
            video_id: video_id.map(str::to_string),
            playlist_id: playlist_id.map(str::to_string),
            radio: Some("true".to_string()),
            shuffle: Some("yes".to_string()),
            limit: None,
        }
    }

    #[test]
    fn test_watch_request_flags_and_default_limit() {
        let request = params(Some("dQw4w9WgXcQ"), None).into_request().unwrap();
        assert!(request.radio);
        assert!(!request.shuffle);
        assert_eq!(request.limit, WATCH_PLAYLIST_LIMIT);
    }

    #[test]
    fn test_watch_request_needs_an_id() {
        assert!(matches!(
            params(None, Some("  ")).into_request(),
            Err(ApiError::BadRequest(_))
        ));
    }
}
