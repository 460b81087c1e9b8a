//! Persona registry - bundled defaults or a directory of TOML files.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};

use super::types::{Persona, PersonaFile, PersonaLookup};

const BUNDLED_SOURCE: &str = "bundled personas.toml";

/// In-memory, ordered persona table.
#[derive(Debug, Clone, Default)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
}

impl PersonaRegistry {
    /// Build a registry from already-loaded personas.
    pub fn new(personas: Vec<Persona>) -> Result<Self> {
        let registry = Self { personas };
        registry.validate("in-memory personas")?;
        Ok(registry)
    }

    /// The personas shipped inside the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(include_str!("../../config/personas.toml"), BUNDLED_SOURCE)
    }

    /// Parse one `[[personas]]` document.
    pub fn from_toml_str(content: &str, source_name: &str) -> Result<Self> {
        let file: PersonaFile = toml::from_str(content).map_err(|e| Error::ConfigParse {
            message: format!("{}: {}", source_name, e),
            source: Some(e),
        })?;
        let registry = Self { personas: file.personas };
        registry.validate(source_name)?;
        Ok(registry)
    }

    /// Load every `*.toml` file in `dir`, in file-name order.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|e| Error::IoRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut files: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "toml"))
            .collect();
        files.sort();

        let mut personas = Vec::new();
        for path in &files {
            let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            let source_name = path.display().to_string();
            let file: PersonaFile = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: format!("{}: {}", source_name, e),
                source: Some(e),
            })?;
            debug!(path = %source_name, count = file.personas.len(), "Loaded persona file");
            personas.extend(file.personas);
        }

        let registry = Self { personas };
        registry.validate(&dir.display().to_string())?;
        info!(dir = %dir.display(), files = files.len(), personas = registry.len(), "Persona directory loaded");
        Ok(registry)
    }

    /// Every persona must be complete and ids must be unique.
    fn validate(&self, source_name: &str) -> Result<()> {
        let mut seen = HashSet::new();
        for persona in &self.personas {
            persona.validate(source_name)?;
            if !seen.insert(persona.id.as_str()) {
                return Err(Error::persona_invalid(
                    source_name,
                    format!("duplicate persona id '{}'", persona.id),
                ));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

impl PersonaLookup for PersonaRegistry {
    fn get_persona_by_id(&self, id: &str) -> Option<Persona> {
        self.personas.iter().find(|p| p.id == id).cloned()
    }

    fn get_all_personas(&self) -> Vec<Persona> {
        self.personas.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_registry_loads() {
        let registry = PersonaRegistry::bundled().unwrap();
        assert!(!registry.is_empty());
        assert!(registry.get_persona_by_id("euclide").is_some());
        assert!(registry.get_persona_by_id("nobody").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let personas = vec![
            Persona::new("euclide", "Euclide", "a"),
            Persona::new("euclide", "Euclide 2", "b"),
        ];
        let err = PersonaRegistry::new(personas).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_from_dir_sorted_by_file_name() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("b.toml"),
            "[[personas]]\nid = \"darwin\"\ndisplay_name = \"Darwin\"\nsystem_prompt = \"Sei Darwin.\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("a.toml"),
            "[[personas]]\nid = \"euclide\"\ndisplay_name = \"Euclide\"\nsystem_prompt = \"Sei Euclide.\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = PersonaRegistry::from_dir(dir.path()).unwrap();
        let ids: Vec<String> = registry.get_all_personas().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["euclide", "darwin"]);
    }

    #[test]
    fn test_from_dir_missing() {
        let dir = TempDir::new().unwrap();
        let err = PersonaRegistry::from_dir(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::IoRead { .. }));
    }

    #[test]
    fn test_invalid_toml_reports_source() {
        let err = PersonaRegistry::from_toml_str("[[personas]]\nid = ", "broken.toml").unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
