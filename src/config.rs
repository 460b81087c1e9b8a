//! Configuration management
//!
//! Handles loading configuration from:
//! 1. Default values
//! 2. Configuration file (TOML)
//! 3. Environment variables (`NIGHTLY_SIM_*`)
//!
//! Every section is optional; with no file at all the harness probes the
//! built-in tiers on the local Ollama endpoint.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::{validate_endpoint, OllamaConfig};
use crate::error::{Error, Result};
use crate::tiers::{ModelTierConfig, TierRegistry, DEFAULT_ENDPOINT};
use crate::trial::DEFAULT_MAX_RESPONSE_CHARS;

/// Smallest accepted `[report] max_response_chars`
pub const MIN_STORED_RESPONSE_CHARS: usize = 100;

/// Main harness configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Chat backend settings
    pub backend: BackendSettings,

    /// Report output settings
    pub report: ReportSettings,

    /// Persona source
    pub personas: PersonaSettings,

    /// Logging configuration
    pub logging: LoggingSettings,

    /// Tier table; empty means the built-in table
    pub tiers: Vec<ModelTierConfig>,
}

/// Chat backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Endpoint for the built-in tiers
    pub default_endpoint: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

/// Report output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Directory for nightly-sim-<date>.json
    pub dir: String,

    /// Stored responses are cut to this many chars
    pub max_response_chars: usize,
}

/// Where personas come from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaSettings {
    /// Directory of persona TOML files; bundled personas when unset
    pub dir: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional)
    pub file: Option<String>,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logs
    pub json_format: bool,
}

// Default implementations

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            default_endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            dir: "reports".to_string(),
            max_response_chars: DEFAULT_MAX_RESPONSE_CHARS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_files: 7,
            json_format: false,
        }
    }
}

impl BackendSettings {
    /// HTTP settings for the Ollama client
    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            timeout_secs: self.timeout_secs,
            connect_timeout_secs: self.connect_timeout_secs,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: format!("{}: {}", path.display(), e),
                source: Some(e),
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::ConfigNotFound { path });
        }

        let search_paths = [
            PathBuf::from("nightly-sim.toml"),
            dirs::config_dir()
                .map(|p| p.join("nightly-sim").join("config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".nightly-sim.toml"))
                .unwrap_or_default(),
        ];

        for path in &search_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NIGHTLY_SIM_ENDPOINT") {
            self.backend.default_endpoint = val;
        }
        if let Ok(val) = std::env::var("NIGHTLY_SIM_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.backend.timeout_secs = n;
            }
        }
        if let Ok(val) = std::env::var("NIGHTLY_SIM_REPORT_DIR") {
            self.report.dir = val;
        }
        if let Ok(val) = std::env::var("NIGHTLY_SIM_PERSONA_DIR") {
            self.personas.dir = Some(val);
        }
        if let Ok(val) = std::env::var("NIGHTLY_SIM_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("NIGHTLY_SIM_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("NIGHTLY_SIM_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.report.dir = expand_path(&self.report.dir);
        if let Some(ref dir) = self.personas.dir {
            self.personas.dir = Some(expand_path(dir));
        }
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        let default_tier = ModelTierConfig::new("default", "-", "-", "", self.backend.default_endpoint.as_str());
        validate_endpoint(&default_tier)
            .map_err(|e| Error::config_field_invalid("backend.default_endpoint", e.to_string()))?;

        if self.backend.timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "backend.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }
        if self.backend.connect_timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "backend.connect_timeout_secs",
                "connect_timeout_secs must be greater than 0",
            ));
        }

        if self.report.dir.trim().is_empty() {
            return Err(Error::config_field_invalid("report.dir", "report dir cannot be empty"));
        }
        if self.report.max_response_chars < MIN_STORED_RESPONSE_CHARS {
            return Err(Error::config_field_invalid(
                "report.max_response_chars",
                format!("max_response_chars must be at least {}", MIN_STORED_RESPONSE_CHARS),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for tier in &self.tiers {
            if tier.code.trim().is_empty() || tier.model.trim().is_empty() {
                return Err(Error::config_field_invalid(
                    "tiers",
                    "every tier needs a non-empty code and model",
                ));
            }
            if !seen.insert(tier.code.as_str()) {
                return Err(Error::config_field_invalid(
                    "tiers",
                    format!("duplicate tier code '{}'", tier.code),
                ));
            }
            validate_endpoint(tier).map_err(|e| Error::config_field_invalid("tiers", e.to_string()))?;
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// The tier table this run uses
    pub fn tier_registry(&self) -> TierRegistry {
        if self.tiers.is_empty() {
            TierRegistry::builtin(&self.backend.default_endpoint)
        } else {
            TierRegistry::new(self.tiers.clone())
        }
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}
