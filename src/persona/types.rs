//! Core types for the persona collaborator.
//!
//! A persona ("maestro") is the unit under test: a display name plus the
//! system prompt the backend receives. The harness only reads them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────
// Persona
// ─────────────────────────────────────────────────────────────────

/// A named AI character definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Stable identifier used on the command line (`--maestri`).
    pub id: String,

    /// Human-readable name shown in reports.
    pub display_name: String,

    /// Subject taught, informational only.
    #[serde(default)]
    pub subject: Option<String>,

    /// System prompt sent as the first chat message.
    pub system_prompt: String,
}

impl Persona {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            subject: None,
            system_prompt: system_prompt.into(),
        }
    }

    /// Check required fields; `source_name` names the file or bundle in errors.
    pub fn validate(&self, source_name: &str) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::persona_invalid(source_name, "persona id is empty"));
        }
        if self.display_name.trim().is_empty() {
            return Err(Error::persona_invalid(
                source_name,
                format!("persona '{}' has an empty display_name", self.id),
            ));
        }
        if self.system_prompt.trim().is_empty() {
            return Err(Error::persona_invalid(
                source_name,
                format!("persona '{}' has an empty system_prompt", self.id),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona File (loaded from TOML)
// ─────────────────────────────────────────────────────────────────

/// On-disk layout: a list of `[[personas]]` tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaFile {
    #[serde(default)]
    pub personas: Vec<Persona>,
}

// ─────────────────────────────────────────────────────────────────
// Lookup Seam
// ─────────────────────────────────────────────────────────────────

/// Read-only access to persona definitions.
pub trait PersonaLookup: Send + Sync {
    /// Find one persona by id.
    fn get_persona_by_id(&self, id: &str) -> Option<Persona>;

    /// Every persona, in registry order.
    fn get_all_personas(&self) -> Vec<Persona>;
}
