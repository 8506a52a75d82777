//! Shared upstream HTTP client
//!
//! Every third-party call goes through [`UpstreamHttp`] so timeouts, the
//! User-Agent and status/parse error mapping are uniform.

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;
use virome_common::config::UpstreamConfig;

/// Longest upstream error body kept in an error message
const ERROR_BODY_LIMIT: usize = 200;

/// Failure of a single upstream call
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream returned HTTP {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Empty response: {0}")]
    Empty(String),
}

impl UpstreamError {
    fn network(e: reqwest::Error) -> Self {
        UpstreamError::Network(e.to_string())
    }
}

/// Thin wrapper over a configured `reqwest::Client`
#[derive(Debug, Clone)]
pub struct UpstreamHttp {
    client: reqwest::Client,
}

impl UpstreamHttp {
    /// Client for JSON/HTML calls: whole-request timeout
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(UpstreamError::network)?;
        Ok(Self { client })
    }

    /// Client for long-lived media streams: only the connect phase is
    /// bounded
    pub fn streaming(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.timeout())
            .build()
            .map_err(UpstreamError::network)?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// GET, require 2xx, parse JSON
    pub async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, UpstreamError> {
        tracing::debug!(url = %url, "GET upstream JSON");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(UpstreamError::network)?;
        let response = require_success(response).await?;
        parse_json(response).await
    }

    /// GET and parse JSON whatever the status
    ///
    /// For services that report failures in the body. A body that is not
    /// JSON becomes `Value::Null`.
    pub async fn get_json_any_status(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<(u16, Value), UpstreamError> {
        tracing::debug!(url = %url, "GET upstream JSON (any status)");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(UpstreamError::network)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(UpstreamError::network)?;
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok((status, value))
    }

    /// POST a JSON body, require 2xx, parse JSON
    pub async fn post_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &Value,
    ) -> Result<Value, UpstreamError> {
        tracing::debug!(url = %url, "POST upstream JSON");
        let response = self
            .client
            .post(url)
            .query(query)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(UpstreamError::network)?;
        let response = require_success(response).await?;
        parse_json(response).await
    }

    /// GET, require 2xx, return the body as text
    pub async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, UpstreamError> {
        tracing::debug!(url = %url, "GET upstream text");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(UpstreamError::network)?;
        let response = require_success(response).await?;
        response.text().await.map_err(UpstreamError::network)
    }

    /// Plain GET, status left to the caller (media proxy)
    pub async fn get_raw(&self, url: &str) -> Result<reqwest::Response, UpstreamError> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(UpstreamError::network)
    }
}

async fn require_success(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > ERROR_BODY_LIMIT {
        let cut = (0..=ERROR_BODY_LIMIT)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    Err(UpstreamError::Status(status.as_u16(), body))
}

async fn parse_json(response: reqwest::Response) -> Result<Value, UpstreamError> {
    let bytes = response.bytes().await.map_err(UpstreamError::network)?;
    if bytes.is_empty() {
        return Err(UpstreamError::Empty("response body is empty".to_string()));
    }
    serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = UpstreamError::Status(503, "busy".to_string());
        assert_eq!(err.to_string(), "Upstream returned HTTP 503: busy");

        let err = UpstreamError::Parse("expected value".to_string());
        assert!(err.to_string().starts_with("Parse error"));
    }

    #[test]
    fn test_clients_build_from_default_config() {
        let config = UpstreamConfig::default();
        assert!(UpstreamHttp::new(&config).is_ok());
        assert!(UpstreamHttp::streaming(&config).is_ok());
    }
}
