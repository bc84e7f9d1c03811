//! Provider and model targets loaded from a registry snapshot.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::features::AdvertisedFeatures;

/// Opaque reference to authentication material, e.g. `env:OPENAI_API_KEY`.
///
/// The reference itself is safe to log; only the resolved secret is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialRef(String);

impl CredentialRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A reference is usable when it is non-blank.
    pub fn is_usable(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a resolved secret is attached to outgoing requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthStyle {
    /// `Authorization: Bearer <secret>`.
    #[default]
    Bearer,
    /// `<name>: <secret>`, e.g. `x-api-key`.
    Header { name: String },
}

/// A model-serving provider as listed by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTarget {
    pub id: String,
    /// OpenAI-compatible API root, e.g. `https://api.example.com/v1`.
    pub base_url: String,
    #[serde(default)]
    pub credential: Option<CredentialRef>,
    #[serde(default)]
    pub auth_style: AuthStyle,
}

/// Static metadata the registry knows about a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub parameter_count: Option<u64>,
    /// USD per one million tokens.
    #[serde(default)]
    pub price_per_million_tokens: Option<f64>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub training_cutoff: Option<NaiveDate>,
    #[serde(default)]
    pub features: AdvertisedFeatures,
}

/// A model offered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTarget {
    pub provider_id: String,
    pub model_id: String,
    #[serde(default)]
    pub metadata: ModelMetadata,
}

/// Identity of one (provider, model) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetKey {
    pub provider_id: String,
    pub model_id: String,
}

impl TargetKey {
    pub fn new(provider_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider_id, self.model_id)
    }
}

/// A (provider, model) pair resolved against its provider and ready to probe.
///
/// Only targets with a usable credential reference are ever constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub key: TargetKey,
    pub base_url: String,
    pub credential: CredentialRef,
    pub auth_style: AuthStyle,
    pub metadata: ModelMetadata,
}

impl Target {
    pub fn provider_id(&self) -> &str {
        &self.key.provider_id
    }

    pub fn model_id(&self) -> &str {
        &self.key.model_id
    }
}

/// Read-only view of the registry at the start of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub providers: Vec<ProviderTarget>,
    #[serde(default)]
    pub models: Vec<ModelTarget>,
}

impl RegistrySnapshot {
    /// Parse a snapshot from its JSON file form.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// First provider with the given id.
    pub fn provider(&self, id: &str) -> Option<&ProviderTarget> {
        self.providers.iter().find(|p| p.id == id)
    }
}
