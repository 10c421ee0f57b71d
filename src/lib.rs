//! datemig Library
//!
//! Runs date-versioned migrations against a persistent installation, in
//! version order, recording progress after each step so an interrupted run
//! resumes where it stopped.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod installation;
pub mod lock;
pub mod notify;
pub mod registry;
pub mod script;
pub mod store;
pub mod version;

pub use bootstrap::{Bootstrap, BootstrapOutcome, LegacyProbe, NoLegacyData, RecordDirProbe};
pub use config::Config;
pub use error::{MigrationError, RegistryError, StoreError, VersionError};
pub use executor::{Executor, FailureStage, RunOutcome, RunStatus};
pub use installation::Installation;
pub use notify::NotificationSink;
pub use registry::{MigrationUnit, RegisteredUnit, Registry, RegistryBuilder};
pub use store::{MemoryStore, SettingsFile, VersionStore};
pub use version::VersionId;
