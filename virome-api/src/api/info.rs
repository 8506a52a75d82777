//! Lyrics and scrobble-service info endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::{present, success, Success};
use crate::error::{ApiError, ApiResult};
use crate::services::lastfm::{ArtistInfo, TrackInfo};
use crate::services::lyrics::LyricsRecord;
use crate::AppState;

fn title_and_artist<'a>(title: &'a Option<String>, artist: &'a Option<String>) -> ApiResult<(&'a str, &'a str)> {
    match (present(title), present(artist)) {
        (Some(title), Some(artist)) => Ok((title, artist)),
        _ => Err(ApiError::BadRequest(
            "Missing required parameters: title and artist".to_string(),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct LyricsParams {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Seconds
    pub duration: Option<u64>,
}

/// GET /api/lyrics?title=&artist=&duration=
pub async fn get_lyrics(
    State(state): State<AppState>,
    Query(params): Query<LyricsParams>,
) -> ApiResult<Json<Success<LyricsRecord>>> {
    let (title, artist) = title_and_artist(&params.title, &params.artist)?;

    state
        .lyrics
        .lyrics(title, artist, params.duration)
        .await?
        .map(success)
        .ok_or_else(|| ApiError::NotFound("Lyrics not found".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct ArtistInfoParams {
    pub artist: Option<String>,
}

/// GET /api/artist/info?artist=
pub async fn artist_info(
    State(state): State<AppState>,
    Query(params): Query<ArtistInfoParams>,
) -> ApiResult<Json<Success<ArtistInfo>>> {
    let artist = present(&params.artist).ok_or_else(|| ApiError::missing("artist"))?;
    Ok(success(state.lastfm.artist_info(artist).await?))
}

#[derive(Debug, Deserialize)]
pub struct TrackInfoParams {
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// GET /api/track/info?title=&artist=
pub async fn track_info(
    State(state): State<AppState>,
    Query(params): Query<TrackInfoParams>,
) -> ApiResult<Json<Success<TrackInfo>>> {
    let (title, artist) = title_and_artist(&params.title, &params.artist)?;
    Ok(success(state.lastfm.track_info(title, artist).await?))
}
