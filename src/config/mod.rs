//! Configuration management for datemig

mod io;
mod types;

pub use types::*;

use anyhow::Result;
use std::path::{Path, PathBuf};

impl Config {
    /// Get the config file path (~/.config/datemig/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        io::config_path()
    }

    /// Get the config directory path (~/.config/datemig)
    pub fn config_dir() -> Result<PathBuf> {
        io::config_dir()
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> Result<Self> {
        io::load()
    }

    /// Load configuration from an explicit path, or return defaults if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        io::load_from(path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        io::save_to(self, path)
    }

    /// Settings file holding the recorded migration version, with ~ expanded
    pub fn settings_file(&self) -> PathBuf {
        expand_home(&self.store.settings_file)
    }

    /// Migration scripts directory, with ~ expanded
    pub fn scripts_directory(&self) -> PathBuf {
        expand_home(&self.scripts.directory)
    }

    /// Legacy records directory, with ~ expanded
    pub fn records_directory(&self) -> PathBuf {
        expand_home(&self.bootstrap.records_directory)
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
