//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};

use crate::bootstrap::{DEFAULT_LEGACY_MARKER, LEGACY_BASELINE};
use crate::error::VersionError;
use crate::version::VersionId;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scripts: ScriptsConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Where the recorded migration version is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// TOML settings file holding `migrationVersion`
    #[serde(default = "default_settings_file")]
    pub settings_file: String,
}

fn default_settings_file() -> String {
    "~/.datemig/settings.toml".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            settings_file: default_settings_file(),
        }
    }
}

/// Migration script discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Directory of executable `YYYY-MM-DD-*` migration scripts
    #[serde(default = "default_scripts_directory")]
    pub directory: String,
}

fn default_scripts_directory() -> String {
    "~/.datemig/migrations".to_string()
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            directory: default_scripts_directory(),
        }
    }
}

/// First-run baseline detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Version seeded when records predating version tracking exist
    #[serde(default = "default_legacy_version")]
    pub legacy_version: String,
    /// Directory of JSON records inspected for the legacy marker
    #[serde(default = "default_records_directory")]
    pub records_directory: String,
    /// JSON pointer that marks a record as legacy when present and non-null
    #[serde(default = "default_legacy_marker")]
    pub legacy_marker: String,
}

fn default_legacy_version() -> String {
    LEGACY_BASELINE.to_string()
}

fn default_records_directory() -> String {
    "~/.datemig/records".to_string()
}

fn default_legacy_marker() -> String {
    DEFAULT_LEGACY_MARKER.to_string()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            legacy_version: default_legacy_version(),
            records_directory: default_records_directory(),
            legacy_marker: default_legacy_marker(),
        }
    }
}

impl BootstrapConfig {
    /// Validate configured values.
    pub fn validate(&self) -> Result<(), String> {
        self.legacy_baseline()
            .map_err(|e| format!("bootstrap.legacy_version: {}", e))?;
        // "" would point at the whole record and mark every record as legacy
        if !self.legacy_marker.starts_with('/') {
            return Err(format!(
                "bootstrap.legacy_marker must be a JSON pointer starting with '/': {:?}",
                self.legacy_marker
            ));
        }
        Ok(())
    }

    /// The configured legacy version, which must be a real version.
    pub fn legacy_baseline(&self) -> Result<VersionId, VersionError> {
        let version = VersionId::parse(&self.legacy_version)?;
        if version.is_none() {
            return Err(VersionError::Malformed(self.legacy_version.clone()));
        }
        Ok(version)
    }
}
