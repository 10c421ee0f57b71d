//! Migration executor.
//!
//! A run bootstraps the recorded version if needed, computes the pending units
//! (strictly newer than the recorded version, in registry order) and runs them
//! one at a time. After each unit succeeds its version is written to the store
//! before the next unit starts; that write is the resume checkpoint.
//!
//! Unit and checkpoint failures end the run with a single `migration.failed`
//! notification and a [`RunOutcome::Failed`]; they are never returned as
//! errors. Bootstrap and store-read failures abort the run before anything is
//! applied and are returned as [`MigrationError`].

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::bootstrap::{Bootstrap, BootstrapOutcome, LegacyProbe};
use crate::error::MigrationError;
use crate::notify::{
    ErrorParams, NotificationSink, MIGRATION_FAILED, MIGRATION_FINISHED, MIGRATION_STARTED,
};
use crate::registry::{RegisteredUnit, Registry};
use crate::store::{self, VersionStore};
use crate::version::VersionId;

/// Where a failed run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// The unit's own action failed.
    Unit,
    /// The unit succeeded but its version could not be recorded; it will run
    /// again next time.
    Checkpoint,
}

/// Result of one executor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing pending. No notifications were sent.
    UpToDate { recorded: VersionId },
    /// Every pending unit ran and was recorded.
    Completed {
        applied: Vec<String>,
        recorded: VersionId,
    },
    /// A unit (or its checkpoint) failed; later units were not run.
    Failed {
        applied: Vec<String>,
        failed_unit: String,
        stage: FailureStage,
        error: String,
        recorded: VersionId,
    },
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The recorded migration version once the run ended.
    pub fn recorded(&self) -> &VersionId {
        match self {
            Self::UpToDate { recorded }
            | Self::Completed { recorded, .. }
            | Self::Failed { recorded, .. } => recorded,
        }
    }
}

/// Read-only snapshot of migration state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus {
    pub recorded: VersionId,
    pub latest: VersionId,
    pub pending: Vec<String>,
}

pub struct Executor {
    registry: Arc<Registry>,
    store: Arc<dyn VersionStore>,
    probe: Arc<dyn LegacyProbe>,
    sink: Arc<dyn NotificationSink>,
    bootstrap: Bootstrap,
    in_flight: Mutex<()>,
}

impl Executor {
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<dyn VersionStore>,
        probe: Arc<dyn LegacyProbe>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            registry,
            store,
            probe,
            sink,
            bootstrap: Bootstrap::default(),
            in_flight: Mutex::new(()),
        }
    }

    /// Override the baseline seeded for installations with legacy data.
    pub fn with_bootstrap(mut self, bootstrap: Bootstrap) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Seed the recorded version if it was never set.
    pub async fn bootstrap(&self) -> Result<BootstrapOutcome, MigrationError> {
        self.bootstrap
            .resolve(self.store.as_ref(), self.probe.as_ref(), &self.registry)
            .await
    }

    /// Current state without bootstrapping or running anything.
    pub async fn status(&self) -> Result<RunStatus, MigrationError> {
        let recorded = store::recorded_version(self.store.as_ref()).await?;
        let pending = self
            .registry
            .pending_after(&recorded)
            .map(|u| u.id().to_string())
            .collect();
        Ok(RunStatus {
            latest: self.registry.latest_version(),
            recorded,
            pending,
        })
    }

    /// Apply every pending migration in order.
    ///
    /// Concurrent calls on the same executor are serialized; a caller that had
    /// to wait sees the previous run's checkpoints.
    pub async fn run(&self) -> Result<RunOutcome, MigrationError> {
        let _in_flight = self.in_flight.lock().await;

        self.bootstrap().await?;

        let recorded = store::recorded_version(self.store.as_ref()).await?;
        let pending: Vec<&RegisteredUnit> = self.registry.pending_after(&recorded).collect();
        if pending.is_empty() {
            tracing::debug!(recorded = %recorded, "no pending migrations");
            return Ok(RunOutcome::UpToDate { recorded });
        }

        tracing::info!(count = pending.len(), from = %recorded, "running migrations");
        self.sink.info(MIGRATION_STARTED);

        let mut applied = Vec::with_capacity(pending.len());
        let mut recorded = recorded;
        for unit in pending {
            if let Err(failure) = self.apply(unit).await {
                let (stage, error) = failure;
                tracing::error!(
                    unit = unit.id(),
                    version = %unit.version(),
                    ?stage,
                    error = %error,
                    "migration failed"
                );
                self.sink.error(
                    MIGRATION_FAILED,
                    &ErrorParams {
                        error: error.clone(),
                    },
                );
                return Ok(RunOutcome::Failed {
                    applied,
                    failed_unit: unit.id().to_string(),
                    stage,
                    error,
                    recorded,
                });
            }
            applied.push(unit.id().to_string());
            recorded = unit.version().clone();
        }

        self.sink.info(MIGRATION_FINISHED);
        tracing::info!(count = applied.len(), recorded = %recorded, "migrations finished");
        Ok(RunOutcome::Completed { applied, recorded })
    }

    /// Run one unit and record its version.
    async fn apply(&self, unit: &RegisteredUnit) -> Result<(), (FailureStage, String)> {
        tracing::info!(unit = unit.id(), version = %unit.version(), "executing migration");

        unit.run()
            .await
            .map_err(|e| (FailureStage::Unit, format!("{:#}", e)))?;

        store::record_version(self.store.as_ref(), unit.version())
            .await
            .map_err(|e| (FailureStage::Checkpoint, e.to_string()))?;

        tracing::debug!(unit = unit.id(), "migration recorded");
        Ok(())
    }
}
