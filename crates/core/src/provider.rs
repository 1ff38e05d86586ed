//! LLM provider registry.
//!
//! Providers are declared in a TOML file, one table per provider. The wire
//! format each provider speaks is an explicit `format` flag on the table
//! (`"ndjson"` for local streaming providers, `"json"` for everything else)
//! rather than anything inferred from the URL.

use crate::error::GatewayError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// How a provider frames its chat response on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Newline-delimited JSON fragments, concatenated until `done`.
    Ndjson,
    /// A single JSON document.
    #[default]
    Json,
}

/// One provider table as written in the registry file.
#[derive(Debug, Clone, Deserialize)]
struct ProviderEntry {
    base_url: String,
    model: String,
    /// Name of the environment variable holding the API key, if any.
    #[serde(default)]
    api_key_env: Option<String>,
    #[serde(rename = "format", default)]
    kind: ProviderKind,
}

/// A fully resolved provider: endpoint, model, credential, wire format.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub kind: ProviderKind,
}

/// The set of declared providers, loaded once at startup and immutable
/// thereafter. Resolution is a pure lookup plus an environment read for the
/// API key, performed once per LLM call.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderEntry>,
}

impl ProviderRegistry {
    pub fn from_path(path: &Path) -> Result<Self, GatewayError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            GatewayError::Configuration(format!(
                "cannot read provider registry {}: {err}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, GatewayError> {
        let providers: BTreeMap<String, ProviderEntry> = toml::from_str(raw)
            .map_err(|err| GatewayError::Configuration(format!("invalid provider registry: {err}")))?;
        debug!(count = providers.len(), "loaded provider registry");
        Ok(Self { providers })
    }

    /// Names of all declared providers, in stable order.
    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Resolves a provider by name, reading its API key from the environment.
    /// An unset or empty key means no credential header will be sent.
    pub fn resolve(&self, name: &str) -> Result<ProviderConfig, GatewayError> {
        let entry = self
            .providers
            .get(name)
            .ok_or_else(|| GatewayError::UnknownProvider(name.to_string()))?;
        let api_key = entry
            .api_key_env
            .as_deref()
            .filter(|var| !var.is_empty())
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty());
        Ok(ProviderConfig {
            name: name.to_string(),
            base_url: entry.base_url.clone(),
            model: entry.model.clone(),
            api_key,
            kind: entry.kind,
        })
    }
}
