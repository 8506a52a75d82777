//! Static routes: endpoint index page, favicon and the 404 fallback

use axum::{
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;

const INDEX_HTML: &str = include_str!("../ui/index.html");

/// GET /
pub async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /favicon.ico
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Any route not registered
pub async fn route_not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "path": uri.path(),
        })),
    )
        .into_response()
}
