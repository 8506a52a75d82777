//! Error types for virome-api
//!
//! Every handler returns [`ApiResult`]; the error side renders as
//! `{"success": false, "error": <message>, "code": <CODE>}`.

use crate::services::{LastFmError, ResolveError, UpstreamError, VideoSearchError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Nothing found (404)
    #[error("{0}")]
    NotFound(String),

    /// Upstream service failed (502)
    #[error("{0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Upstream(_) => "UPSTREAM_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Shorthand for a missing query parameter
    pub fn missing(param: &str) -> Self {
        ApiError::BadRequest(format!("Missing required parameter: {}", param))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<VideoSearchError> for ApiError {
    fn from(err: VideoSearchError) -> Self {
        match err {
            VideoSearchError::MissingApiKey => ApiError::BadRequest(err.to_string()),
            VideoSearchError::Upstream(e) => e.into(),
        }
    }
}

impl From<LastFmError> for ApiError {
    fn from(err: LastFmError) -> Self {
        match err {
            LastFmError::MissingApiKey => ApiError::Internal(err.to_string()),
            LastFmError::Service(message) => ApiError::Upstream(message),
            LastFmError::Upstream(e) => e.into(),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        ApiError::NotFound(err.to_string())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::missing("q").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(UpstreamError::Status(503, "down".to_string())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(ResolveError::NoWorkingUpstream).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(VideoSearchError::MissingApiKey).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LastFmError::MissingApiKey).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_lastfm_message_is_passed_through() {
        let err = ApiError::from(LastFmError::Service("Track not found".to_string()));
        assert_eq!(err.to_string(), "Track not found");
        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn test_resolve_failure_message() {
        let err = ApiError::from(ResolveError::NoWorkingUpstream);
        assert_eq!(err.to_string(), "no working upstream found");
    }
}
