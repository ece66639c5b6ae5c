// SPDX-License-Identifier: MIT OR Apache-2.0
//! Explorer settings.
//!
//! Settings live in a RON file next to the working directory by default.
//! A missing file means defaults; a file written by a newer explorer is
//! refused.

use dataflow_graph::GraphSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "explorer.ron";

/// Explorer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerSettings {
    /// Format version
    pub version: u32,
    /// Default tracing directive, applied on top of `RUST_LOG`
    pub log_filter: String,
    /// Graph behavior
    pub graph: GraphSettings,
    /// Evaluate the graph right after loading it
    pub evaluate_on_load: bool,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            log_filter: "dataflow_explorer=info".to_string(),
            graph: GraphSettings::default(),
            evaluate_on_load: true,
        }
    }
}

impl ExplorerSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: ExplorerSettings = ron::from_str(&content)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Error loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON
    #[error("Settings file is malformed: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be written as RON
    #[error("Settings could not be serialized: {0}")]
    Serialize(#[from] ron::Error),

    /// File was written by a newer explorer
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataflow_graph::CyclePolicy;

    fn scratch_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("explorer-{}.ron", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_default_settings() {
        let settings = ExplorerSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.graph.cycle_policy, CyclePolicy::Reject);
        assert!(settings.evaluate_on_load);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: ExplorerSettings =
            ron::from_str("(graph: (cycle_policy: Defer))").unwrap();
        assert_eq!(settings.graph.cycle_policy, CyclePolicy::Defer);
        assert_eq!(settings.log_filter, ExplorerSettings::default().log_filter);
    }

    #[test]
    fn test_save_and_load() {
        let path = scratch_path();
        let mut settings = ExplorerSettings::default();
        settings.evaluate_on_load = false;
        settings.save(&path).unwrap();

        let loaded = ExplorerSettings::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_newer_version_is_refused() {
        let path = scratch_path();
        std::fs::write(&path, "(version: 99)").unwrap();
        let result = ExplorerSettings::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            result,
            Err(SettingsError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let settings = ExplorerSettings::load_or_default(&scratch_path()).unwrap();
        assert_eq!(settings, ExplorerSettings::default());
    }
}
