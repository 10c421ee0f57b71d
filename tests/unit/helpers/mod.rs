//! Test helper utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use datemig::notify::CollectingSink;
use datemig::{
    Executor, LegacyProbe, MemoryStore, NoLegacyData, Registry, StoreError, VersionStore,
};

/// Shared record of which units ran, in order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Build a registry whose units append their id to `log`. Units listed in
/// `failing` return an error instead.
pub fn recording_registry(log: &CallLog, ids: &[&str], failing: &[&str]) -> Arc<Registry> {
    let mut builder = Registry::builder();
    for id in ids {
        let id = id.to_string();
        let fails = failing.contains(&id.as_str());
        let log = log.clone();
        builder = builder.register_fn(id.clone(), move || {
            let log = log.clone();
            let id = id.clone();
            async move {
                log.lock().unwrap().push(id.clone());
                if fails {
                    anyhow::bail!("{} could not rewrite records", id);
                }
                Ok(())
            }
        });
    }
    Arc::new(builder.build().unwrap())
}

/// Probe that reports a fixed answer.
pub struct FixedProbe(pub bool);

#[async_trait]
impl LegacyProbe for FixedProbe {
    async fn has_legacy_data(&self) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}

/// Probe whose query fails.
pub struct BrokenProbe;

#[async_trait]
impl LegacyProbe for BrokenProbe {
    async fn has_legacy_data(&self) -> anyhow::Result<bool> {
        anyhow::bail!("records database is unreachable")
    }
}

/// Memory store whose writes start failing after `ok_writes` successes.
pub struct FlakyStore {
    inner: MemoryStore,
    ok_writes: usize,
    writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, ok_writes: usize) -> Self {
        Self {
            inner,
            ok_writes,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.inner.snapshot(key)
    }
}

#[async_trait]
impl VersionStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.ok_writes {
            return Err(StoreError::Backend("settings storage is read-only".to_string()));
        }
        self.inner.set(key, value).await
    }
}

/// Executor over `store` with no legacy data and a collecting sink.
pub fn executor_with(
    registry: Arc<Registry>,
    store: Arc<dyn VersionStore>,
    probe: Arc<dyn LegacyProbe>,
) -> (Executor, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let executor = Executor::new(registry, store, probe, sink.clone());
    (executor, sink)
}

pub fn fresh_executor(
    registry: Arc<Registry>,
    store: Arc<MemoryStore>,
) -> (Executor, Arc<CollectingSink>) {
    executor_with(registry, store, Arc::new(NoLegacyData))
}
