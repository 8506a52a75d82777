//! Catalog entity endpoints: songs, albums, artists, playlists, related

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::present;
use super::streaming::validate_media_id;
use crate::error::{ApiError, ApiResult};
use crate::models::{ArtistOverview, ArtistPage, CollectionPage, Track};
use crate::AppState;

const DEFAULT_COUNTRY: &str = "US";

/// GET /api/songs/:videoId
pub async fn get_song(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<Track>> {
    validate_media_id(&video_id)?;
    state
        .catalog
        .song(&video_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Song not found: {}", video_id)))
}

/// GET /api/albums/:browseId, /api/album/:browseId
pub async fn get_album(
    State(state): State<AppState>,
    Path(browse_id): Path<String>,
) -> ApiResult<Json<CollectionPage>> {
    Ok(Json(state.catalog.album(&browse_id).await?))
}

/// GET /api/artists/:browseId
pub async fn get_artist(
    State(state): State<AppState>,
    Path(browse_id): Path<String>,
) -> ApiResult<Json<ArtistPage>> {
    Ok(Json(state.catalog.artist(&browse_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CountryParams {
    pub country: Option<String>,
}

/// GET /api/artist/:artistId?country=
pub async fn get_artist_summary(
    State(state): State<AppState>,
    Path(artist_id): Path<String>,
    Query(params): Query<CountryParams>,
) -> ApiResult<Json<ArtistOverview>> {
    let country = present(&params.country).unwrap_or(DEFAULT_COUNTRY);
    Ok(Json(state.catalog.artist_summary(&artist_id, country).await?))
}

/// GET /api/playlists/:playlistId, /api/playlist/:playlistId
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> ApiResult<Json<CollectionPage>> {
    Ok(Json(state.catalog.playlist(&playlist_id).await?))
}

/// GET /api/related/:videoId
pub async fn get_related(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<Value>> {
    validate_media_id(&video_id)?;
    let related = state.catalog.related(&video_id).await?;
    Ok(Json(json!({"success": true, "data": related})))
}
