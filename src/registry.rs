//! Migration registry.
//!
//! Units are registered once at startup, each under an identifying name that
//! embeds its `YYYY-MM-DD` version. The built [`Registry`] holds them sorted by
//! version, then by id, so two units that share a date still run in a fixed
//! order.
//!
//! To add a migration in code:
//! 1. Implement [`MigrationUnit`] (or use [`RegistryBuilder::register_fn`])
//! 2. Register it under a name like `2024-08-15-move-notes`

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::RegistryError;
use crate::version::VersionId;

/// One discrete, versioned upgrade step.
///
/// A unit is only ever invoked for versions not yet recorded as applied, but a
/// failed checkpoint write can cause a completed unit to run again, so units
/// must tolerate re-execution.
#[async_trait]
pub trait MigrationUnit: Send + Sync {
    async fn run(&self) -> Result<()>;
}

type BoxedFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Adapts a closure returning a future into a [`MigrationUnit`].
struct FnUnit<F>(F);

#[async_trait]
impl<F> MigrationUnit for FnUnit<F>
where
    F: Fn() -> BoxedFuture + Send + Sync,
{
    async fn run(&self) -> Result<()> {
        (self.0)().await
    }
}

/// A unit together with its id and extracted version.
pub struct RegisteredUnit {
    id: String,
    version: VersionId,
    unit: Box<dyn MigrationUnit>,
}

impl RegisteredUnit {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &VersionId {
        &self.version
    }

    pub async fn run(&self) -> Result<()> {
        self.unit.run().await
    }
}

impl std::fmt::Debug for RegisteredUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredUnit")
            .field("id", &self.id)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Collects units before sorting them into a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    units: Vec<RegisteredUnit>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit under its identifying name.
    pub fn register(mut self, id: impl Into<String>, unit: impl MigrationUnit + 'static) -> Self {
        self.push(id.into(), Box::new(unit));
        self
    }

    /// Register an async closure as a unit.
    pub fn register_fn<F, Fut>(self, id: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let unit = FnUnit(move || -> BoxedFuture { Box::pin(f()) });
        self.register(id, unit)
    }

    /// Register an already boxed unit, as built by script discovery.
    pub fn register_boxed(mut self, id: impl Into<String>, unit: Box<dyn MigrationUnit>) -> Self {
        self.push(id.into(), unit);
        self
    }

    fn push(&mut self, id: String, unit: Box<dyn MigrationUnit>) {
        let version = VersionId::from_unit_name(&id);
        if version.is_none() {
            tracing::warn!(unit = %id, "migration name has no YYYY-MM-DD date; it will never run");
        }
        self.units.push(RegisteredUnit { id, version, unit });
    }

    /// Sort the collected units and reject duplicate ids.
    pub fn build(mut self) -> Result<Registry, RegistryError> {
        let mut seen = HashSet::new();
        for unit in &self.units {
            if !seen.insert(unit.id.as_str()) {
                return Err(RegistryError::DuplicateId {
                    id: unit.id.clone(),
                });
            }
        }

        self.units
            .sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.id.cmp(&b.id)));
        Ok(Registry { units: self.units })
    }
}

/// The ordered set of all known migration units.
#[derive(Debug, Default)]
pub struct Registry {
    units: Vec<RegisteredUnit>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// All units, ascending by version then id.
    pub fn all_units_sorted(&self) -> &[RegisteredUnit] {
        &self.units
    }

    /// Version of the newest unit, or the empty version for an empty registry.
    pub fn latest_version(&self) -> VersionId {
        self.units
            .last()
            .map(|u| u.version.clone())
            .unwrap_or_default()
    }

    /// Units whose version is strictly newer than `recorded`, in run order.
    pub fn pending_after(
        &self,
        recorded: &VersionId,
    ) -> impl Iterator<Item = &RegisteredUnit> + '_ {
        let recorded = recorded.clone();
        self.units
            .iter()
            .filter(move |u| u.version.is_newer_than(&recorded))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
