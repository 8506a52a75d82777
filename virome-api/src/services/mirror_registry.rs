//! Mirror Registry
//!
//! Time-boxed memo of the community mirror manifest. One registry exists
//! per process and is handed to the stream resolver at construction.
//!
//! Refresh policy:
//! - Cache fresher than the TTL is returned as is.
//! - Otherwise the manifest is fetched once. Success replaces the whole
//!   cache and its timestamp.
//! - Failure keeps the stale cache untouched (timestamp included, so the
//!   next call tries again), or yields the built-in fallback when nothing
//!   was ever cached.
//!
//! Concurrent refreshes are not coalesced; the last writer wins.

use crate::services::http::{UpstreamError, UpstreamHttp};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use virome_common::time::Clock;

const PIPED_FALLBACK: &[&str] = &["https://api.piped.private.coffee"];
const INVIDIOUS_FALLBACK: &[&str] = &["https://invidious.nikkosphere.com", "https://yt.omada.cafe"];

/// Stream provider families, in resolution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Piped,
    Invidious,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Piped, ProviderKind::Invidious];

    /// Key in the manifest document and name in API responses
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Piped => "piped",
            ProviderKind::Invidious => "invidious",
        }
    }

    fn fallback_urls(self) -> &'static [&'static str] {
        match self {
            ProviderKind::Piped => PIPED_FALLBACK,
            ProviderKind::Invidious => INVIDIOUS_FALLBACK,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One deployment of a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorInstance {
    /// Base URL without trailing slash
    pub base_url: String,
    pub kind: ProviderKind,
}

impl MirrorInstance {
    pub fn new(base_url: &str, kind: ProviderKind) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            kind,
        }
    }
}

/// Ordered instance lists for every provider kind
///
/// Never empty for any kind: construction substitutes the fallback list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSet {
    piped: Vec<MirrorInstance>,
    invidious: Vec<MirrorInstance>,
}

impl MirrorSet {
    /// Built-in lists used when no manifest was ever fetched
    pub fn fallback() -> Self {
        Self {
            piped: fallback_instances(ProviderKind::Piped),
            invidious: fallback_instances(ProviderKind::Invidious),
        }
    }

    /// Build from a manifest document `{"piped": [..], "invidious": [..]}`
    ///
    /// Returns `None` if the document is not a JSON object. A kind that is
    /// missing, empty or malformed gets its fallback list.
    pub fn from_manifest(manifest: &Value) -> Option<Self> {
        let object = manifest.as_object()?;

        let list_for = |kind: ProviderKind| {
            let listed: Vec<MirrorInstance> = object
                .get(kind.as_str())
                .and_then(Value::as_array)
                .map(|urls| {
                    urls.iter()
                        .filter_map(Value::as_str)
                        .filter(|url| !url.trim().is_empty())
                        .map(|url| MirrorInstance::new(url, kind))
                        .collect()
                })
                .unwrap_or_default();

            if listed.is_empty() {
                debug!(provider = %kind, "Manifest lists no instances, using fallback");
                fallback_instances(kind)
            } else {
                listed
            }
        };

        Some(Self {
            piped: list_for(ProviderKind::Piped),
            invidious: list_for(ProviderKind::Invidious),
        })
    }

    pub fn instances(&self, kind: ProviderKind) -> &[MirrorInstance] {
        match kind {
            ProviderKind::Piped => &self.piped,
            ProviderKind::Invidious => &self.invidious,
        }
    }

    /// Total instance count across kinds
    pub fn len(&self) -> usize {
        self.piped.len() + self.invidious.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn fallback_instances(kind: ProviderKind) -> Vec<MirrorInstance> {
    kind.fallback_urls()
        .iter()
        .map(|url| MirrorInstance::new(url, kind))
        .collect()
}

/// Where the manifest comes from
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn fetch_manifest(&self) -> Result<Value, UpstreamError>;
}

/// Manifest fetched over HTTP from a fixed URL
pub struct HttpManifestSource {
    http: UpstreamHttp,
    url: String,
}

impl HttpManifestSource {
    pub fn new(http: UpstreamHttp, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ManifestSource for HttpManifestSource {
    async fn fetch_manifest(&self) -> Result<Value, UpstreamError> {
        self.http.get_json(&self.url, &[]).await
    }
}

struct CachedMirrors {
    mirrors: MirrorSet,
    fetched_at: Instant,
}

/// Process-wide mirror memo
pub struct MirrorRegistry {
    source: Arc<dyn ManifestSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    cache: RwLock<Option<CachedMirrors>>,
}

impl MirrorRegistry {
    pub fn new(source: Arc<dyn ManifestSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// Current mirrors; never fails and never returns an empty kind
    pub async fn get_mirrors(&self) -> MirrorSet {
        let now = self.clock.now();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if now.duration_since(cached.fetched_at) < self.ttl {
                    return cached.mirrors.clone();
                }
            }
        }

        let fetched = match self.source.fetch_manifest().await {
            Ok(manifest) => MirrorSet::from_manifest(&manifest)
                .ok_or_else(|| "manifest is not a JSON object".to_string()),
            Err(e) => Err(e.to_string()),
        };

        match fetched {
            Ok(mirrors) => {
                info!(
                    piped = mirrors.instances(ProviderKind::Piped).len(),
                    invidious = mirrors.instances(ProviderKind::Invidious).len(),
                    "Mirror manifest refreshed"
                );
                let mut cache = self.cache.write().await;
                *cache = Some(CachedMirrors {
                    mirrors: mirrors.clone(),
                    fetched_at: now,
                });
                mirrors
            }
            Err(reason) => {
                let cache = self.cache.read().await;
                match cache.as_ref() {
                    Some(stale) => {
                        warn!(error = %reason, "Mirror manifest refresh failed, keeping stale list");
                        stale.mirrors.clone()
                    }
                    None => {
                        warn!(error = %reason, "Mirror manifest unavailable, using built-in fallback");
                        MirrorSet::fallback()
                    }
                }
            }
        }
    }
}
