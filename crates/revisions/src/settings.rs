//! Revision settings persisted as JSON

use crate::{AcceptPolicy, ChangeTransformer, Result, RevisionRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// User-facing defaults for tracked changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisionSettings {
    /// Author stamped on new revisions
    pub default_author: String,
    /// Policy used by "accept changes" when none is given
    pub default_policy: AcceptPolicy,
    /// Drop sub-second precision from revision dates on output
    pub strip_fractional_seconds: bool,
}

impl Default for RevisionSettings {
    fn default() -> Self {
        Self {
            default_author: "Unknown".to_string(),
            default_policy: AcceptPolicy::default(),
            strip_fractional_seconds: true,
        }
    }
}

impl RevisionSettings {
    /// Load settings, falling back to defaults when the file is missing or invalid
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read revision settings, using defaults: {}", e);
                return Self::default();
            }
        };
        match serde_json::from_str::<RevisionSettings>(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to parse revision settings, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// A tracking registry stamped with the default author
    pub fn registry(&self) -> RevisionRegistry {
        let mut registry = RevisionRegistry::new();
        if registry.set_current_author(self.default_author.clone()).is_err() {
            tracing::warn!("Ignoring blank default author in revision settings");
        }
        registry.enable_tracking();
        registry
    }

    /// A transformer using the default policy
    pub fn transformer(&self) -> ChangeTransformer {
        ChangeTransformer::new(self.default_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = RevisionSettings::default();
        assert!(settings.strip_fractional_seconds);
        assert_eq!(settings.default_policy, AcceptPolicy::all());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("revisions.json");
        let settings = RevisionSettings {
            default_author: "Ann".to_string(),
            default_policy: AcceptPolicy::only_insertions(),
            strip_fractional_seconds: false,
        };
        settings.save_to_path(&path).unwrap();

        let loaded = RevisionSettings::load_from_path(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.registry().current_author(), "Ann");
        assert_eq!(loaded.transformer().policy(), AcceptPolicy::only_insertions());
    }

    #[test]
    fn test_missing_or_invalid_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert_eq!(RevisionSettings::load_from_path(&missing), RevisionSettings::default());

        let invalid = temp_dir.path().join("invalid.json");
        std::fs::write(&invalid, "{ not json").unwrap();
        assert_eq!(RevisionSettings::load_from_path(&invalid), RevisionSettings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.json");
        std::fs::write(&path, r#"{"default_author": "Bob"}"#).unwrap();

        let loaded = RevisionSettings::load_from_path(&path);
        assert_eq!(loaded.default_author, "Bob");
        assert!(loaded.strip_fractional_seconds);
    }

    #[test]
    fn test_blank_author_keeps_registry_default() {
        let settings = RevisionSettings {
            default_author: " ".to_string(),
            ..Default::default()
        };
        let registry = settings.registry();
        assert_eq!(registry.current_author(), "Unknown");
        assert!(registry.is_tracking());
    }
}
