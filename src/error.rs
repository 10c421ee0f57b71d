//! Error types for the migration runner.

use std::path::PathBuf;

/// A value that does not follow the fixed-width `YYYY-MM-DD` version format.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("Malformed migration version {0:?} (expected YYYY-MM-DD)")]
    Malformed(String),
}

/// Errors raised while building a migration registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Migration unit registered twice: {id}")]
    DuplicateId { id: String },

    #[error("Failed to read migration directory {path}: {source}")]
    Discover {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by a [`VersionStore`](crate::store::VersionStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("Setting {key:?} is not a string")]
    NotAString { key: String },

    #[error("Setting {key:?} holds an invalid version: {source}")]
    InvalidVersion {
        key: String,
        #[source]
        source: VersionError,
    },

    #[error("Settings backend unavailable: {0}")]
    Backend(String),
}

/// Errors that escape a migration run.
///
/// Unit failures never show up here; they are reported through the
/// notification sink and the returned outcome.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Failed to determine the initial migration version: {0:#}")]
    Bootstrap(#[source] anyhow::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Migrations are already running (pid {pid}, lock {})", .path.display())]
    Locked { pid: u32, path: PathBuf },

    #[error("Failed to manage run lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
