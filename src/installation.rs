//! A configured installation: script registry, settings file store and legacy
//! record probe wired into an [`Executor`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bootstrap::{Bootstrap, RecordDirProbe};
use crate::config::Config;
use crate::error::MigrationError;
use crate::executor::{Executor, RunOutcome, RunStatus};
use crate::lock::RunLock;
use crate::notify::NotificationSink;
use crate::script;
use crate::store::SettingsFile;

pub struct Installation {
    settings_file: PathBuf,
    executor: Executor,
}

impl Installation {
    /// Discover scripts and wire up the store and probe described by `config`.
    pub fn open(config: &Config, sink: Arc<dyn NotificationSink>) -> Result<Self, MigrationError> {
        config
            .bootstrap
            .validate()
            .map_err(MigrationError::InvalidConfig)?;
        let legacy_baseline = config.bootstrap.legacy_baseline().map_err(|e| {
            MigrationError::InvalidConfig(format!("bootstrap.legacy_version: {}", e))
        })?;

        let registry = script::registry_from_dir(&config.scripts_directory())?;
        let settings_file = config.settings_file();
        let store = SettingsFile::new(&settings_file);
        let probe = RecordDirProbe::new(
            config.records_directory(),
            config.bootstrap.legacy_marker.clone(),
        );

        tracing::debug!(
            units = registry.len(),
            settings = %settings_file.display(),
            "installation opened"
        );

        let executor = Executor::new(Arc::new(registry), Arc::new(store), Arc::new(probe), sink)
            .with_bootstrap(Bootstrap::new(legacy_baseline));
        Ok(Self {
            settings_file,
            executor,
        })
    }

    pub fn settings_file(&self) -> &Path {
        &self.settings_file
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub async fn status(&self) -> Result<RunStatus, MigrationError> {
        self.executor.status().await
    }

    /// Run pending migrations while holding the settings file's run lock.
    pub async fn run(&self) -> Result<RunOutcome, MigrationError> {
        let _lock = RunLock::acquire(&self.settings_file)?;
        self.executor.run().await
    }
}
