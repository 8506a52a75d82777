//! Discovery endpoints: trending, radio, top lists, similar tracks

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::streaming::validate_media_id;
use super::{present, success, Success};
use crate::error::{ApiError, ApiResult};
use crate::models::{Track, VideoSearchItem};
use crate::services::discovery::{DiscoveryTrack, TopArtists, TopTracks};
use crate::AppState;

const DEFAULT_TRENDING_COUNTRY: &str = "United States";
const DEFAULT_TOP_LIMIT: usize = 20;
const DEFAULT_SIMILAR_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrendingBody {
    pub country: String,
    pub tracks: Vec<DiscoveryTrack>,
}

/// GET /api/trending?country=
pub async fn get_trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingParams>,
) -> ApiResult<Json<Success<TrendingBody>>> {
    let country = present(&params.country).unwrap_or(DEFAULT_TRENDING_COUNTRY);
    let tracks = state.discovery.trending(country).await;
    if tracks.is_empty() {
        return Err(ApiError::NotFound("Could not fetch trending".to_string()));
    }

    Ok(success(TrendingBody {
        country: country.to_string(),
        tracks,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioParams {
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioBody {
    pub seed_video_id: String,
    pub tracks: Vec<Track>,
}

/// GET /api/radio?videoId=
pub async fn get_radio(
    State(state): State<AppState>,
    Query(params): Query<RadioParams>,
) -> ApiResult<Json<Success<RadioBody>>> {
    let video_id = present(&params.video_id).ok_or_else(|| ApiError::missing("videoId"))?;
    validate_media_id(video_id)?;

    let tracks = state.discovery.radio(video_id).await?;
    if tracks.is_empty() {
        return Err(ApiError::NotFound("Could not generate radio".to_string()));
    }

    Ok(success(RadioBody {
        seed_video_id: video_id.to_string(),
        tracks,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TopParams {
    pub country: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TopArtistsBody {
    pub country: String,
    pub artists: TopArtists,
}

#[derive(Debug, Serialize)]
pub struct TopTracksBody {
    pub country: String,
    pub tracks: TopTracks,
}

/// GET /api/top/artists?country=&limit=
pub async fn get_top_artists(
    State(state): State<AppState>,
    Query(params): Query<TopParams>,
) -> ApiResult<Json<Success<TopArtistsBody>>> {
    let limit = params.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    let list = state
        .discovery
        .top_artists(present(&params.country), limit)
        .await?;

    Ok(success(TopArtistsBody {
        country: list.country,
        artists: list.items,
    }))
}

/// GET /api/top/tracks?country=&limit=
pub async fn get_top_tracks(
    State(state): State<AppState>,
    Query(params): Query<TopParams>,
) -> ApiResult<Json<Success<TopTracksBody>>> {
    let limit = params.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    let list = state
        .discovery
        .top_tracks(present(&params.country), limit)
        .await?;

    Ok(success(TopTracksBody {
        country: list.country,
        tracks: list.items,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SimilarParams {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/similar?title=&artist=&limit=
pub async fn get_similar(
    State(state): State<AppState>,
    Query(params): Query<SimilarParams>,
) -> ApiResult<Json<Vec<VideoSearchItem>>> {
    let (title, artist) = match (present(&params.title), present(&params.artist)) {
        (Some(title), Some(artist)) => (title, artist),
        _ => return Err(ApiError::BadRequest("Missing title or artist parameter".to_string())),
    };

    let limit = params.limit.unwrap_or(DEFAULT_SIMILAR_LIMIT);
    Ok(Json(state.discovery.similar(title, artist, limit).await?))
}
