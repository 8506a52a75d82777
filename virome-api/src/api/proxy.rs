//! Media proxy
//!
//! GET /api/proxy?url= streams an http(s) resource back to the caller so
//! browsers can play mirror URLs that lack CORS headers.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use super::present;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const DEFAULT_CONTENT_TYPE: &str = "audio/mp4";
const CACHE_CONTROL: &str = "public, max-age=3600";

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
}

/// Only absolute http(s) URLs are proxied
pub fn parse_proxy_target(raw: &str) -> ApiResult<Url> {
    let url = Url::parse(raw).map_err(|e| ApiError::BadRequest(format!("Invalid url parameter: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ApiError::BadRequest(format!(
            "Unsupported url scheme: {}",
            other
        ))),
    }
}

/// GET /api/proxy?url=
pub async fn proxy_media(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
) -> ApiResult<Response> {
    let raw = present(&params.url).ok_or_else(|| ApiError::missing("url"))?;
    let target = parse_proxy_target(raw)?;

    let upstream = state.proxy_http.get_raw(target.as_str()).await.map_err(|e| {
        warn!(error = %e, "Proxy request failed");
        ApiError::Upstream("Failed to fetch audio".to_string())
    })?;

    if !upstream.status().is_success() {
        warn!(status = upstream.status().as_u16(), "Proxy upstream returned an error status");
        return Err(ApiError::Upstream("Failed to fetch audio".to_string()));
    }

    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| HeaderValue::from_str(v).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let content_length = upstream.content_length();
    debug!(content_length = ?content_length, "Proxying media");

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
    if let Some(length) = content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_target_must_be_http() {
        assert!(parse_proxy_target("https://pipedproxy.example/videoplayback?id=1").is_ok());
        assert!(parse_proxy_target("http://127.0.0.1:8080/a.m4a").is_ok());

        assert!(matches!(
            parse_proxy_target("file:///etc/passwd"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            parse_proxy_target("not a url"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
