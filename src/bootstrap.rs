//! First-run baseline resolution.
//!
//! When no migration version has ever been recorded, an installation is either
//! brand new (nothing to migrate, so every known migration counts as applied)
//! or predates version tracking (so every migration written after tracking
//! was introduced still has to run). Legacy installations are recognised by a
//! marker on their existing records.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::error::MigrationError;
use crate::registry::Registry;
use crate::store::{self, VersionStore};
use crate::version::VersionId;

/// Last migration version that existed before version tracking.
pub const LEGACY_BASELINE: &str = "2024-07-28";

/// Default JSON pointer checked on each record by [`RecordDirProbe`].
pub const DEFAULT_LEGACY_MARKER: &str = "/flags/legacy/id";

/// Answers whether the installation holds data created before version tracking.
#[async_trait]
pub trait LegacyProbe: Send + Sync {
    async fn has_legacy_data(&self) -> Result<bool>;
}

/// Probe for installations that never had untracked data.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLegacyData;

#[async_trait]
impl LegacyProbe for NoLegacyData {
    async fn has_legacy_data(&self) -> Result<bool> {
        Ok(false)
    }
}

/// Scans a directory of JSON records for one carrying the legacy marker.
///
/// A record is legacy when it has a non-null value at the `marker` JSON
/// pointer. A missing directory holds no records.
#[derive(Debug, Clone)]
pub struct RecordDirProbe {
    dir: PathBuf,
    marker: String,
}

impl RecordDirProbe {
    pub fn new(dir: impl Into<PathBuf>, marker: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            marker: marker.into(),
        }
    }
}

#[async_trait]
impl LegacyProbe for RecordDirProbe {
    async fn has_legacy_data(&self) -> Result<bool> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read records directory: {}", self.dir.display())
                })
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Failed to read records directory: {}", self.dir.display()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read record: {}", path.display()))?;
            let record: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse record: {}", path.display()))?;
            if record.pointer(&self.marker).is_some_and(|v| !v.is_null()) {
                tracing::debug!(record = %path.display(), "found legacy record");
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// What bootstrap decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A version was already recorded; nothing written.
    AlreadyTracked(VersionId),
    /// Legacy data found; seeded with the historical baseline.
    SeededLegacy(VersionId),
    /// Fresh install; seeded with the newest registered version.
    SeededFresh(VersionId),
}

impl BootstrapOutcome {
    pub fn version(&self) -> &VersionId {
        match self {
            Self::AlreadyTracked(v) | Self::SeededLegacy(v) | Self::SeededFresh(v) => v,
        }
    }
}

/// Seeds the recorded migration version when absent.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    legacy_baseline: VersionId,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            legacy_baseline: VersionId::parse(LEGACY_BASELINE).unwrap_or_default(),
        }
    }
}

impl Bootstrap {
    pub fn new(legacy_baseline: VersionId) -> Self {
        Self { legacy_baseline }
    }

    pub fn legacy_baseline(&self) -> &VersionId {
        &self.legacy_baseline
    }

    /// Seed the store if it holds no version yet. Idempotent.
    pub async fn resolve(
        &self,
        store: &dyn VersionStore,
        probe: &dyn LegacyProbe,
        registry: &Registry,
    ) -> Result<BootstrapOutcome, MigrationError> {
        let recorded = store::recorded_version(store).await?;
        if !recorded.is_none() {
            return Ok(BootstrapOutcome::AlreadyTracked(recorded));
        }

        let has_legacy = probe
            .has_legacy_data()
            .await
            .map_err(MigrationError::Bootstrap)?;

        let outcome = if has_legacy {
            BootstrapOutcome::SeededLegacy(self.legacy_baseline.clone())
        } else {
            BootstrapOutcome::SeededFresh(registry.latest_version())
        };

        store::record_version(store, outcome.version())
            .await
            .map_err(|e| MigrationError::Bootstrap(e.into()))?;

        tracing::info!(
            version = %outcome.version(),
            legacy = has_legacy,
            "seeded initial migration version"
        );
        Ok(outcome)
    }
}
