//! Video platform search client
//!
//! Initial searches scrape the HTML results page. The page also carries
//! the innertube API key and client version, which are remembered and used
//! for continuation requests; a continuation before any initial search has
//! no key to use.

use crate::extract::video::{self, ApiConfig, SearchKind};
use crate::models::{Page, VideoSearchItem};
use crate::services::http::{UpstreamError, UpstreamHttp};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;
use virome_common::config::UpstreamConfig;

/// Client version used for continuations when none was scraped
const FALLBACK_CLIENT_VERSION: &str = "2.20231219.01.00";
const SUGGESTION_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum VideoSearchError {
    #[error("API key not initialized: run an initial search before requesting a continuation")]
    MissingApiKey,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// `sp` filter value for a result kind
pub fn search_params(kind: SearchKind) -> &'static str {
    match kind {
        SearchKind::Videos => "EgIQAQ%3D%3D",
        SearchKind::Channels => "EgIQAg%3D%3D",
        SearchKind::Playlists => "EgIQAw%3D%3D",
    }
}

/// Static suggestions served when the suggestion service fails
pub fn static_suggestions(query: &str) -> Vec<String> {
    vec![
        query.to_string(),
        format!("{} video", query),
        format!("{} 2024", query),
        format!("{} tutorial", query),
        format!("{} song", query),
    ]
}

/// Suggestion JSONP (`cb([query, [[s, ..], ..], ..])`) → strings
pub fn parse_suggestions_jsonp(text: &str) -> Option<Vec<String>> {
    let start = text.find('(')?;
    let end = text.rfind(')')?;
    if end <= start {
        return None;
    }

    let payload: Value = serde_json::from_str(&text[start + 1..end]).ok()?;
    let entries = payload.get(1)?.as_array()?;

    Some(
        entries
            .iter()
            .filter_map(|entry| match entry {
                Value::Array(parts) => parts.first().and_then(Value::as_str),
                other => other.as_str(),
            })
            .map(str::to_string)
            .take(SUGGESTION_LIMIT)
            .collect(),
    )
}

pub struct VideoSearch {
    http: UpstreamHttp,
    web_base: String,
    api_base: String,
    suggest_url: String,
    api_config: RwLock<ApiConfig>,
}

impl VideoSearch {
    pub fn new(http: UpstreamHttp, config: &UpstreamConfig) -> Self {
        Self {
            http,
            web_base: config.video_web_base.trim_end_matches('/').to_string(),
            api_base: config.video_api_base.trim_end_matches('/').to_string(),
            suggest_url: config.suggest_url.clone(),
            api_config: RwLock::new(ApiConfig::default()),
        }
    }

    async fn remember_api_config(&self, scraped: ApiConfig) {
        if scraped.api_key.is_none() && scraped.client_version.is_none() {
            return;
        }
        let mut current = self.api_config.write().await;
        if scraped.api_key.is_some() {
            current.api_key = scraped.api_key;
        }
        if scraped.client_version.is_some() {
            current.client_version = scraped.client_version;
        }
    }

    /// Initial search for one result kind
    pub async fn search(&self, kind: SearchKind, query: &str) -> Result<Page<VideoSearchItem>, UpstreamError> {
        let query: String = query.nfc().collect();
        let url = format!("{}/results", self.web_base);
        let html = self
            .http
            .get_text(&url, &[("search_query", query.as_str()), ("sp", search_params(kind))])
            .await?;

        self.remember_api_config(video::extract_api_config(&html)).await;

        match video::extract_initial_data(&html) {
            Some(data) => Ok(video::parse_search_page(&data, kind)),
            None => {
                debug!(query = %query, "Search page carried no initial data");
                Ok(Page::default())
            }
        }
    }

    /// Videos, channels and playlists concatenated; the first continuation
    /// token found wins
    pub async fn search_all(&self, query: &str) -> Result<Page<VideoSearchItem>, UpstreamError> {
        let mut combined = Page::default();
        for kind in [SearchKind::Videos, SearchKind::Channels, SearchKind::Playlists] {
            let page = self.search(kind, query).await?;
            combined.results.extend(page.results);
            if combined.continuation_token.is_none() {
                combined.continuation_token = page.continuation_token;
            }
        }
        Ok(combined)
    }

    pub async fn continuation(&self, kind: SearchKind, token: &str) -> Result<Page<VideoSearchItem>, VideoSearchError> {
        let config = self.api_config.read().await.clone();
        let api_key = config.api_key.ok_or(VideoSearchError::MissingApiKey)?;
        let client_version = config
            .client_version
            .unwrap_or_else(|| FALLBACK_CLIENT_VERSION.to_string());

        let body = json!({
            "continuation": token,
            "context": {"client": {"clientName": "WEB", "clientVersion": client_version}},
        });
        let url = format!("{}/search", self.api_base);
        let data = self
            .http
            .post_json(&url, &[("key", api_key.as_str())], &body)
            .await?;

        Ok(video::parse_continuation_page(&data, kind))
    }

    /// Never fails: any problem yields the static suggestions
    pub async fn suggestions(&self, query: &str) -> Vec<String> {
        let normalized: String = query.nfc().collect();
        let params = [("ds", "yt"), ("client", "youtube"), ("q", normalized.as_str())];

        match self.http.get_text(&self.suggest_url, &params).await {
            Ok(text) => parse_suggestions_jsonp(&text).unwrap_or_else(|| {
                warn!("Suggestion response was not JSONP, using static suggestions");
                static_suggestions(query)
            }),
            Err(e) => {
                warn!(error = %e, "Suggestion service failed, using static suggestions");
                static_suggestions(query)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suggestions_jsonp() {
        let text = r#"window.google.ac.h(["cold",[["coldplay",0,[512]],["cold heart",0]],{"k":1}])"#;
        assert_eq!(
            parse_suggestions_jsonp(text),
            Some(vec!["coldplay".to_string(), "cold heart".to_string()])
        );
    }

    #[test]
    fn test_parse_suggestions_caps_at_ten() {
        let entries: Vec<String> = (0..15).map(|i| format!("[\"s{}\",0]", i)).collect();
        let text = format!("cb([\"q\",[{}]])", entries.join(","));
        assert_eq!(parse_suggestions_jsonp(&text).unwrap().len(), 10);
    }

    #[test]
    fn test_parse_suggestions_rejects_garbage() {
        assert_eq!(parse_suggestions_jsonp("<html>"), None);
        assert_eq!(parse_suggestions_jsonp("cb(not json)"), None);
    }

    #[test]
    fn test_static_suggestions() {
        assert_eq!(
            static_suggestions("lofi"),
            vec!["lofi", "lofi video", "lofi 2024", "lofi tutorial", "lofi song"]
        );
    }

    #[tokio::test]
    async fn test_continuation_without_key_is_rejected() {
        let config = UpstreamConfig::default();
        let search = VideoSearch::new(UpstreamHttp::new(&config).unwrap(), &config);

        let result = search.continuation(SearchKind::Videos, "token").await;
        assert!(matches!(result, Err(VideoSearchError::MissingApiKey)));
    }
}
