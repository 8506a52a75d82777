//! Stream Resolver
//!
//! Resolves a media id to playable audio streams through an ordered list
//! of provider strategies. Each provider's mirror instances are tried one
//! at a time in manifest order; the first instance yielding at least one
//! usable candidate wins. Instance failures are absorbed and logged at
//! debug. Nothing is retried and nothing runs concurrently.

use crate::extract::{array_at, as_u64_lenient, str_at, string_at, u64_at};
use crate::services::http::{UpstreamError, UpstreamHttp};
use crate::services::mirror_registry::{MirrorInstance, MirrorRegistry, ProviderKind};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// One playable stream offered by an instance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamCandidate {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_label: Option<String>,
}

/// Descriptive data returned alongside the streams
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMetadata {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
}

/// What a single instance answered
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderStream {
    pub candidates: Vec<StreamCandidate>,
    pub metadata: StreamMetadata,
}

/// Successful resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStream {
    pub provider: ProviderKind,
    pub instance: String,
    pub candidates: Vec<StreamCandidate>,
    pub metadata: StreamMetadata,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no working upstream found")]
    NoWorkingUpstream,
}

/// One provider family's lookup strategy
#[async_trait]
pub trait StreamProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Look `media_id` up on one instance
    ///
    /// `Ok(None)` means the instance answered without usable streams.
    async fn try_resolve(
        &self,
        instance: &MirrorInstance,
        media_id: &str,
    ) -> Result<Option<ProviderStream>, UpstreamError>;
}

/// Ordered fallback chain over providers and their instances
pub struct StreamResolver {
    registry: Arc<MirrorRegistry>,
    providers: Vec<Arc<dyn StreamProvider>>,
}

impl StreamResolver {
    /// `providers` are tried in the given order
    pub fn new(registry: Arc<MirrorRegistry>, providers: Vec<Arc<dyn StreamProvider>>) -> Self {
        Self {
            registry,
            providers,
        }
    }

    /// Piped first, then Invidious
    pub fn with_default_providers(registry: Arc<MirrorRegistry>, http: UpstreamHttp) -> Self {
        Self::new(
            registry,
            vec![
                Arc::new(PipedProvider::new(http.clone())) as Arc<dyn StreamProvider>,
                Arc::new(InvidiousProvider::new(http)),
            ],
        )
    }

    pub async fn resolve(&self, media_id: &str) -> Result<ResolvedStream, ResolveError> {
        let mirrors = self.registry.get_mirrors().await;

        for provider in &self.providers {
            let kind = provider.kind();
            for instance in mirrors.instances(kind) {
                match provider.try_resolve(instance, media_id).await {
                    Ok(Some(found)) if !found.candidates.is_empty() => {
                        return Ok(ResolvedStream {
                            provider: kind,
                            instance: instance.base_url.clone(),
                            candidates: found.candidates,
                            metadata: found.metadata,
                        });
                    }
                    Ok(_) => {
                        debug!(provider = %kind, instance = %instance.base_url, media_id = %media_id, "No usable streams");
                    }
                    Err(e) => {
                        debug!(provider = %kind, instance = %instance.base_url, media_id = %media_id, error = %e, "Instance failed");
                    }
                }
            }
        }

        Err(ResolveError::NoWorkingUpstream)
    }
}

fn usable(candidates: Vec<StreamCandidate>) -> Vec<StreamCandidate> {
    candidates
        .into_iter()
        .filter(|c| !c.url.is_empty())
        .collect()
}

// ============================================================================
// Piped
// ============================================================================

/// `GET {instance}/streams/{id}`
pub struct PipedProvider {
    http: UpstreamHttp,
}

impl PipedProvider {
    pub fn new(http: UpstreamHttp) -> Self {
        Self { http }
    }
}

/// Piped stream document → candidates and metadata
pub fn parse_piped_streams(data: &Value, media_id: &str) -> ProviderStream {
    let candidates = array_at(data, "/audioStreams")
        .iter()
        .filter_map(|s| {
            Some(StreamCandidate {
                url: string_at(s, "/url")?,
                mime_type: string_at(s, "/mimeType"),
                bitrate: u64_at(s, "/bitrate"),
                quality_label: string_at(s, "/quality"),
            })
        })
        .collect();

    ProviderStream {
        candidates: usable(candidates),
        metadata: StreamMetadata {
            id: media_id.to_string(),
            title: string_at(data, "/title"),
            author: string_at(data, "/uploader"),
            thumbnail_url: string_at(data, "/thumbnailUrl"),
            duration_seconds: u64_at(data, "/duration"),
            view_count: u64_at(data, "/views"),
        },
    }
}

#[async_trait]
impl StreamProvider for PipedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Piped
    }

    async fn try_resolve(
        &self,
        instance: &MirrorInstance,
        media_id: &str,
    ) -> Result<Option<ProviderStream>, UpstreamError> {
        let url = format!("{}/streams/{}", instance.base_url, media_id);
        let data = self.http.get_json(&url, &[]).await?;
        let stream = parse_piped_streams(&data, media_id);
        Ok(Some(stream).filter(|s| !s.candidates.is_empty()))
    }
}

// ============================================================================
// Invidious
// ============================================================================

/// `GET {instance}/api/v1/videos/{id}`
pub struct InvidiousProvider {
    http: UpstreamHttp,
}

impl InvidiousProvider {
    pub fn new(http: UpstreamHttp) -> Self {
        Self { http }
    }
}

fn is_audio_format(format: &Value) -> bool {
    ["/type", "/mimeType"]
        .iter()
        .filter_map(|p| str_at(format, p))
        .any(|t| t.contains("audio"))
}

/// Invidious video document → audio candidates and metadata
pub fn parse_invidious_video(data: &Value, media_id: &str) -> ProviderStream {
    let candidates = array_at(data, "/adaptiveFormats")
        .iter()
        .filter(|f| is_audio_format(f))
        .filter_map(|f| {
            Some(StreamCandidate {
                url: string_at(f, "/url")?,
                mime_type: string_at(f, "/type").or_else(|| string_at(f, "/mimeType")),
                bitrate: f.get("bitrate").and_then(as_u64_lenient),
                quality_label: string_at(f, "/audioQuality"),
            })
        })
        .collect();

    ProviderStream {
        candidates: usable(candidates),
        metadata: StreamMetadata {
            id: media_id.to_string(),
            title: string_at(data, "/title"),
            author: string_at(data, "/author"),
            thumbnail_url: string_at(data, "/videoThumbnails/0/url"),
            duration_seconds: u64_at(data, "/lengthSeconds"),
            view_count: u64_at(data, "/viewCount"),
        },
    }
}

#[async_trait]
impl StreamProvider for InvidiousProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Invidious
    }

    async fn try_resolve(
        &self,
        instance: &MirrorInstance,
        media_id: &str,
    ) -> Result<Option<ProviderStream>, UpstreamError> {
        let url = format!("{}/api/v1/videos/{}", instance.base_url, media_id);
        let data = self.http.get_json(&url, &[]).await?;
        let stream = parse_invidious_video(&data, media_id);
        Ok(Some(stream).filter(|s| !s.candidates.is_empty()))
    }
}
