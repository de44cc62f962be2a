//! Provider adapters and the registry that dispatches to them.
//!
//! The registry is the resolver's sole extension point. A new delivery
//! mechanism (signed URLs, DRM manifests) is a new adapter registered at
//! startup; the resolver itself never changes. Dispatch goes through the
//! closed [`ProviderKind`] enum and fails fast on anything the registry does
//! not know.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

/// Closed set of provider tags a stream row may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    ExternalHls,
    ExternalMp4,
}

impl ProviderKind {
    /// Parse the stored provider tag; unknown tags are a configuration error,
    /// never a silent fallback.
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "EXTERNAL_HLS" => Ok(Self::ExternalHls),
            "EXTERNAL_MP4" => Ok(Self::ExternalMp4),
            other => Err(anyhow!("Unsupported provider type: {other}")),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExternalHls => "EXTERNAL_HLS",
            Self::ExternalMp4 => "EXTERNAL_MP4",
        }
    }
}

/// Delivery mechanism the player should use for a resolved stream.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackKind {
    Native,
    Hls,
    Dash,
    Embed,
}

impl PlaybackKind {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "native" => Ok(Self::Native),
            "hls" => Ok(Self::Hls),
            "dash" => Ok(Self::Dash),
            "embed" => Ok(Self::Embed),
            other => Err(anyhow!("Unsupported playback type: {other}")),
        }
    }
}

/// Playback descriptor handed to the player.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlaybackInfo {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: PlaybackKind,
    /// Extra request headers some delivery mechanisms need; omitted from the
    /// wire when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

/// Capability contract every provider adapter exposes.
pub trait ProviderAdapter: Send + Sync {
    /// Translate a stream's opaque configuration blob into a playback
    /// descriptor.
    fn playback_info(&self, config: &Value) -> Result<PlaybackInfo>;

    /// Check a configuration blob at provider-registration time. The resolve
    /// hot path never calls this.
    fn validate_config(&self, config: &Value) -> bool;
}

/// Serves externally hosted streams whose configuration carries a direct URL.
///
/// Covers both HLS manifests and progressive MP4 files; URL signing would
/// slot in here.
pub struct ExternalStreamAdapter;

impl ProviderAdapter for ExternalStreamAdapter {
    fn playback_info(&self, config: &Value) -> Result<PlaybackInfo> {
        let url = config
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("Missing URL in stream config"))?;

        let kind = match config.get("type").and_then(Value::as_str) {
            Some(value) => PlaybackKind::parse(value)?,
            None => PlaybackKind::Hls,
        };

        Ok(PlaybackInfo {
            url: url.to_string(),
            kind,
            headers: None,
        })
    }

    fn validate_config(&self, config: &Value) -> bool {
        config.get("url").is_some_and(Value::is_string)
    }
}

/// Startup-populated dispatch table from provider kind to adapter.
pub struct AdapterRegistry {
    adapters: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter for a provider kind, replacing any previous one.
    #[must_use]
    pub fn register(mut self, kind: ProviderKind, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(kind, adapter);
        self
    }

    /// Registry preloaded with the shipped adapters.
    #[must_use]
    pub fn builtin() -> Self {
        let external: Arc<dyn ProviderAdapter> = Arc::new(ExternalStreamAdapter);
        Self::new()
            .register(ProviderKind::ExternalHls, Arc::clone(&external))
            .register(ProviderKind::ExternalMp4, external)
    }

    #[must_use]
    pub fn get(&self, kind: ProviderKind) -> Option<&dyn ProviderAdapter> {
        self.adapters.get(&kind).map(|adapter| adapter.as_ref())
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
