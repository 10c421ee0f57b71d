//! Persistent version store.
//!
//! The runner keeps exactly one value here: the newest fully applied
//! migration version, under [`MIGRATION_VERSION_KEY`].

mod memory;
mod settings_file;

pub use memory::MemoryStore;
pub use settings_file::SettingsFile;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::version::VersionId;

/// Settings key holding the recorded migration version.
pub const MIGRATION_VERSION_KEY: &str = "migrationVersion";

/// Durable key-value settings slot.
#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Persist `value` under `key`. Must be durable once it returns `Ok`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Read the recorded migration version, treating absence as the empty version.
pub async fn recorded_version(store: &dyn VersionStore) -> Result<VersionId, StoreError> {
    match store.get(MIGRATION_VERSION_KEY).await? {
        Some(raw) => VersionId::parse(&raw).map_err(|source| StoreError::InvalidVersion {
            key: MIGRATION_VERSION_KEY.to_string(),
            source,
        }),
        None => Ok(VersionId::none()),
    }
}

/// Persist `version` as the recorded migration version.
pub async fn record_version(store: &dyn VersionStore, version: &VersionId) -> Result<(), StoreError> {
    store.set(MIGRATION_VERSION_KEY, version.as_str()).await
}
