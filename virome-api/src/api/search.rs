//! Search endpoints
//!
//! GET /api/search              - music catalog search
//! GET /api/search/suggestions  - autocomplete (catalog or video platform)
//! GET /api/yt_search           - video platform search

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::present;
use crate::error::{ApiError, ApiResult};
use crate::extract::video::SearchKind;
use crate::models::Page;
use crate::services::music_catalog::{SearchFilter, SearchRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub filter: Option<String>,
    pub continuation_token: Option<String>,
    pub region: Option<String>,
    pub gl: Option<String>,
    pub language: Option<String>,
    pub hl: Option<String>,
}

/// GET /api/search
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Value>> {
    let query = present(&params.q).map(str::to_string);
    let continuation = present(&params.continuation_token).map(str::to_string);
    if query.is_none() && continuation.is_none() {
        return Err(ApiError::BadRequest(
            "Missing required query parameter 'q' or 'continuationToken'".to_string(),
        ));
    }

    let filter = present(&params.filter).map(str::to_string);
    let region = present(&params.region)
        .or_else(|| present(&params.gl))
        .map(str::to_string);
    let language = present(&params.language)
        .or_else(|| present(&params.hl))
        .map(str::to_string);

    let request = SearchRequest {
        query: query.clone().unwrap_or_default(),
        filter: filter.as_deref().and_then(SearchFilter::parse),
        continuation,
        region: region.clone(),
        language: language.clone(),
    };
    let page = state.catalog.search(&request).await?;

    Ok(Json(json!({
        "query": query,
        "filter": filter,
        "region": region,
        "language": language,
        "results": page.results,
        "continuationToken": page.continuation_token,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SuggestionParams {
    pub q: Option<String>,
    pub music: Option<String>,
}

/// GET /api/search/suggestions
pub async fn search_suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestionParams>,
) -> ApiResult<Json<Value>> {
    let query = present(&params.q).ok_or_else(|| ApiError::missing("q"))?;

    if params.music.as_deref() == Some("1") {
        let suggestions = state.catalog.search_suggestions(query).await?;
        Ok(Json(json!({"suggestions": suggestions, "source": "youtube_music"})))
    } else {
        let suggestions = state.video_search.suggestions(query).await;
        Ok(Json(json!({"suggestions": suggestions, "source": "youtube"})))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSearchParams {
    pub q: Option<String>,
    pub filter: Option<String>,
    pub continuation_token: Option<String>,
}

/// GET /api/yt_search
///
/// `filter=all` (the default) searches every kind but cannot page;
/// unknown filters yield no results.
pub async fn yt_search(
    State(state): State<AppState>,
    Query(params): Query<VideoSearchParams>,
) -> ApiResult<Json<Value>> {
    let query = present(&params.q);
    let continuation = present(&params.continuation_token);
    let filter = present(&params.filter).unwrap_or("all");

    let page = match (continuation, query) {
        (Some(token), _) => match SearchKind::from_filter(filter) {
            Some(kind) => state.video_search.continuation(kind, token).await?,
            None => Page::default(),
        },
        (None, Some(query)) if filter == "all" => state.video_search.search_all(query).await?,
        (None, Some(query)) => match SearchKind::from_filter(filter) {
            Some(kind) => state.video_search.search(kind, query).await?,
            None => Page::default(),
        },
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Missing required query parameter 'q' or 'continuationToken'".to_string(),
            ))
        }
    };

    Ok(Json(json!({
        "filter": filter,
        "query": query,
        "results": page.results,
        "continuationToken": page.continuation_token,
    })))
}
