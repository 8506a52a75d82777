//! Configuration loading
//!
//! Resolution order, highest priority first:
//! 1. Command-line flag (parsed by the binary, clap also reads ENV)
//! 2. Environment variable overrides applied by [`TomlConfig::apply_env_overrides`]
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing TOML file is not an error: the service logs a warning and
//! starts on defaults. A file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding `upstream.lastfm_api_key`
pub const ENV_LASTFM_API_KEY: &str = "VIROME_LASTFM_API_KEY";

/// Environment variable overriding `logging.level`
pub const ENV_LOG_LEVEL: &str = "VIROME_LOG_LEVEL";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Root of the TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub upstream: UpstreamConfig,
    pub mirrors: MirrorConfig,
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[upstream]` section: base URLs and client settings for every
/// third-party service the aggregator talks to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Per-request network timeout
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Music catalog internal API (innertube, WEB_REMIX client)
    pub music_api_base: String,
    /// Optional innertube key appended as `key=` to catalog requests
    pub music_api_key: Option<String>,
    /// Video platform web origin (HTML search pages)
    pub video_web_base: String,
    /// Video platform internal API (continuations, browse, next)
    pub video_api_base: String,
    /// Search suggestion (JSONP) endpoint
    pub suggest_url: String,
    pub lastfm_api_base: String,
    pub lastfm_api_key: Option<String>,
    pub lyrics_api_base: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            music_api_base: "https://music.youtube.com/youtubei/v1".to_string(),
            music_api_key: None,
            video_web_base: "https://www.youtube.com".to_string(),
            video_api_base: "https://www.youtube.com/youtubei/v1".to_string(),
            suggest_url: "https://suggestqueries-clients6.youtube.com/complete/search".to_string(),
            lastfm_api_base: "https://ws.audioscrobbler.com/2.0/".to_string(),
            lastfm_api_key: None,
            lyrics_api_base: "https://lrclib.net/api".to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[mirrors]` section: community stream-mirror manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Remote JSON document listing mirror instances per provider
    pub manifest_url: String,
    /// How long a fetched manifest is reused before refreshing
    pub cache_ttl_secs: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            manifest_url: "https://raw.githubusercontent.com/n-ce/Uma/main/dynamic_instances.json"
                .to_string(),
            cache_ttl_secs: 300,
        }
    }
}

impl MirrorConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl TomlConfig {
    /// Apply environment variable overrides on top of file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(ENV_LASTFM_API_KEY) {
            if !key.trim().is_empty() {
                info!("Last.fm API key loaded from environment variable");
                self.upstream.lastfm_api_key = Some(key.trim().to_string());
            }
        }

        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            if !level.trim().is_empty() {
                self.logging.level = level.trim().to_lowercase();
            }
        }
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.upstream.timeout_secs == 0 {
            return Err(Error::Config(
                "upstream.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.mirrors.cache_ttl_secs == 0 {
            return Err(Error::Config(
                "mirrors.cache_ttl_secs must be greater than zero".to_string(),
            ));
        }

        let urls = [
            ("upstream.music_api_base", &self.upstream.music_api_base),
            ("upstream.video_web_base", &self.upstream.video_web_base),
            ("upstream.video_api_base", &self.upstream.video_api_base),
            ("upstream.suggest_url", &self.upstream.suggest_url),
            ("upstream.lastfm_api_base", &self.upstream.lastfm_api_base),
            ("upstream.lyrics_api_base", &self.upstream.lyrics_api_base),
            ("mirrors.manifest_url", &self.mirrors.manifest_url),
        ];
        for (name, value) in urls {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Default config file location: `<config_dir>/virome/virome.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("virome").join("virome.toml"))
}

/// Pick the config file path: explicit path (CLI or ENV) wins over the
/// platform default
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(default_config_path)
}

/// Load a TOML config file
///
/// Missing file → warning + defaults. Unreadable or malformed file → error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Full resolution: file (or defaults) → ENV overrides → validation
pub fn load_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(explicit_path) {
        Some(path) => load_toml_config(&path)?,
        None => {
            warn!("Could not determine config directory, using compiled defaults");
            TomlConfig::default()
        }
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TomlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.mirrors.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [server]
            port = 9100

            [mirrors]
            cache_ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.mirrors.cache_ttl_secs, 60);
        assert_eq!(config.upstream, UpstreamConfig::default());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = TomlConfig::default();
        config.upstream.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_non_http_url_rejected() {
        let mut config = TomlConfig::default();
        config.upstream.lyrics_api_base = "ftp://lyrics.example".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("upstream.lyrics_api_base"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = PathBuf::from("/tmp/virome-explicit.toml");
        assert_eq!(resolve_config_path(Some(&explicit)), Some(explicit));
    }
}
