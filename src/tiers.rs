//! Model tier registry
//!
//! Maps a short tier code (`"3b"`, `"8b"`, ...) to the backend target that
//! serves it. Trials only ever see a [`ModelTierConfig`], so adding a tier is
//! a single table entry.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Endpoint every built-in tier points at unless reconfigured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// One backend target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTierConfig {
    /// Short code used on the command line.
    pub code: String,

    /// Model identifier sent to the backend.
    pub model: String,

    /// Human-readable name.
    pub display_name: String,

    /// What this tier represents.
    #[serde(default)]
    pub description: String,

    /// Base URL of the chat backend.
    pub endpoint: String,
}

impl ModelTierConfig {
    pub fn new(
        code: impl Into<String>,
        model: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            model: model.into(),
            display_name: display_name.into(),
            description: description.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Result of resolving a list of requested tier codes.
#[derive(Debug, Clone, Default)]
pub struct TierResolution {
    /// Known tiers, in request order.
    pub resolved: Vec<ModelTierConfig>,
    /// Requested codes with no registry entry, in request order.
    pub unknown: Vec<String>,
}

/// Read-only, ordered tier table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierRegistry {
    tiers: Vec<ModelTierConfig>,
}

impl TierRegistry {
    /// Build a registry from an explicit table.
    pub fn new(tiers: Vec<ModelTierConfig>) -> Self {
        Self { tiers }
    }

    /// The built-in table, all tiers on one endpoint.
    pub fn builtin(endpoint: &str) -> Self {
        Self::new(builtin_tiers(endpoint))
    }

    /// Look up a tier by code.
    pub fn get(&self, code: &str) -> Result<&ModelTierConfig> {
        self.tiers
            .iter()
            .find(|t| t.code == code)
            .ok_or_else(|| Error::UnknownTier { code: code.to_string() })
    }

    /// All tier codes in table order.
    pub fn codes(&self) -> Vec<String> {
        self.tiers.iter().map(|t| t.code.clone()).collect()
    }

    pub fn all(&self) -> &[ModelTierConfig] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Resolve requested codes against the table.
    ///
    /// Order and duplicates of `codes` are preserved in both halves of the
    /// result.
    pub fn resolve(&self, codes: &[String]) -> TierResolution {
        let mut resolution = TierResolution::default();
        for code in codes {
            match self.get(code) {
                Ok(tier) => resolution.resolved.push(tier.clone()),
                Err(_) => resolution.unknown.push(code.clone()),
            }
        }
        resolution
    }
}

/// Built-in tiers, smallest first.
pub fn builtin_tiers(endpoint: &str) -> Vec<ModelTierConfig> {
    vec![
        ModelTierConfig::new(
            "1b",
            "llama3.2:1b",
            "Llama 3.2 1B",
            "Smallest tier, on-device class",
            endpoint,
        ),
        ModelTierConfig::new(
            "3b",
            "llama3.2:3b",
            "Llama 3.2 3B",
            "Default tier for everyday tutoring",
            endpoint,
        ),
        ModelTierConfig::new(
            "8b",
            "llama3.1:8b",
            "Llama 3.1 8B",
            "Highest quality local tier",
            endpoint,
        ),
    ]
}
