//! Executor behaviour across bootstrap, failure and resume

use std::sync::Arc;

use datemig::notify::{Notification, MIGRATION_FAILED, MIGRATION_FINISHED, MIGRATION_STARTED};
use datemig::store::MIGRATION_VERSION_KEY;
use datemig::{FailureStage, MemoryStore, MigrationError, RunOutcome};

use crate::helpers::{
    calls, executor_with, fresh_executor, recording_registry, BrokenProbe, CallLog, FixedProbe,
    FlakyStore,
};

const UNITS: &[&str] = &[
    "2024-05-01-drop-tmp",
    "2024-07-28-baseline",
    "2024-08-15-move-notes",
    "2024-09-02-rename-tags",
];

#[tokio::test]
async fn fresh_install_records_latest_and_runs_nothing() {
    let log = CallLog::default();
    let registry = recording_registry(&log, UNITS, &[]);
    let store = Arc::new(MemoryStore::new());
    let (executor, sink) = fresh_executor(registry, store.clone());

    let outcome = executor.run().await.unwrap();

    assert!(matches!(outcome, RunOutcome::UpToDate { .. }));
    assert_eq!(outcome.recorded().as_str(), "2024-09-02");
    assert_eq!(
        store.snapshot(MIGRATION_VERSION_KEY).as_deref(),
        Some("2024-09-02")
    );
    assert!(calls(&log).is_empty());
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn legacy_install_runs_everything_after_baseline() {
    let log = CallLog::default();
    let registry = recording_registry(&log, UNITS, &[]);
    let store = Arc::new(MemoryStore::new());
    let (executor, sink) = executor_with(registry, store.clone(), Arc::new(FixedProbe(true)));

    let outcome = executor.run().await.unwrap();

    assert_eq!(
        calls(&log),
        vec!["2024-08-15-move-notes", "2024-09-02-rename-tags"]
    );
    assert_eq!(
        outcome,
        RunOutcome::Completed {
            applied: vec![
                "2024-08-15-move-notes".to_string(),
                "2024-09-02-rename-tags".to_string()
            ],
            recorded: datemig::VersionId::parse("2024-09-02").unwrap(),
        }
    );
    assert_eq!(
        sink.events(),
        vec![
            Notification::Info {
                key: MIGRATION_STARTED.to_string()
            },
            Notification::Info {
                key: MIGRATION_FINISHED.to_string()
            },
        ]
    );
}

#[tokio::test]
async fn failed_unit_resumes_on_next_run() {
    let log = CallLog::default();
    let failing = recording_registry(&log, UNITS, &["2024-08-15-move-notes"]);
    let store = Arc::new(MemoryStore::with_value(MIGRATION_VERSION_KEY, "2024-05-01"));
    let (executor, sink) = fresh_executor(failing, store.clone());

    let outcome = executor.run().await.unwrap();

    assert_eq!(
        calls(&log),
        vec!["2024-07-28-baseline", "2024-08-15-move-notes"]
    );
    match &outcome {
        RunOutcome::Failed {
            applied,
            failed_unit,
            stage,
            error,
            recorded,
        } => {
            assert_eq!(applied, &vec!["2024-07-28-baseline".to_string()]);
            assert_eq!(failed_unit, "2024-08-15-move-notes");
            assert_eq!(*stage, FailureStage::Unit);
            assert!(error.contains("could not rewrite records"));
            assert_eq!(recorded.as_str(), "2024-07-28");
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(
        store.snapshot(MIGRATION_VERSION_KEY).as_deref(),
        Some("2024-07-28")
    );
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[1],
        Notification::Error { key, .. } if key == MIGRATION_FAILED
    ));

    // Same store, fixed unit: picks up at the failed one.
    let log = CallLog::default();
    let fixed = recording_registry(&log, UNITS, &[]);
    let (executor, _sink) = fresh_executor(fixed, store.clone());

    let outcome = executor.run().await.unwrap();

    assert_eq!(
        calls(&log),
        vec!["2024-08-15-move-notes", "2024-09-02-rename-tags"]
    );
    assert_eq!(outcome.recorded().as_str(), "2024-09-02");
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let log = CallLog::default();
    let registry = recording_registry(&log, UNITS, &[]);
    let store = Arc::new(MemoryStore::with_value(MIGRATION_VERSION_KEY, "2024-01-01"));
    let (executor, sink) = fresh_executor(registry, store.clone());

    executor.run().await.unwrap();
    let first_calls = calls(&log).len();
    let first_events = sink.events().len();

    let outcome = executor.run().await.unwrap();

    assert_eq!(first_calls, UNITS.len());
    assert_eq!(calls(&log).len(), first_calls);
    assert_eq!(sink.events().len(), first_events);
    assert!(matches!(outcome, RunOutcome::UpToDate { .. }));
}

#[tokio::test]
async fn failed_checkpoint_leaves_unit_pending() {
    let log = CallLog::default();
    let registry = recording_registry(&log, UNITS, &[]);
    let store = Arc::new(FlakyStore::new(
        MemoryStore::with_value(MIGRATION_VERSION_KEY, "2024-07-28"),
        1,
    ));
    let (executor, _sink) = executor_with(registry, store.clone(), Arc::new(FixedProbe(false)));

    let outcome = executor.run().await.unwrap();

    assert_eq!(
        calls(&log),
        vec!["2024-08-15-move-notes", "2024-09-02-rename-tags"]
    );
    match outcome {
        RunOutcome::Failed {
            failed_unit,
            stage,
            recorded,
            ..
        } => {
            assert_eq!(failed_unit, "2024-09-02-rename-tags");
            assert_eq!(stage, FailureStage::Checkpoint);
            assert_eq!(recorded.as_str(), "2024-08-15");
        }
        other => panic!("expected checkpoint failure, got {:?}", other),
    }
    assert_eq!(
        store.snapshot(MIGRATION_VERSION_KEY).as_deref(),
        Some("2024-08-15")
    );

    let status = executor.status().await.unwrap();
    assert_eq!(status.pending, vec!["2024-09-02-rename-tags".to_string()]);
}

#[tokio::test]
async fn probe_failure_aborts_before_any_write() {
    let log = CallLog::default();
    let registry = recording_registry(&log, UNITS, &[]);
    let store = Arc::new(MemoryStore::new());
    let (executor, sink) = executor_with(registry, store.clone(), Arc::new(BrokenProbe));

    let err = executor.run().await.unwrap_err();

    assert!(matches!(err, MigrationError::Bootstrap(_)));
    assert!(err.to_string().contains("records database is unreachable"));
    assert_eq!(store.snapshot(MIGRATION_VERSION_KEY), None);
    assert!(calls(&log).is_empty());
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn malformed_recorded_version_is_an_error() {
    let log = CallLog::default();
    let registry = recording_registry(&log, UNITS, &[]);
    let store = Arc::new(MemoryStore::with_value(MIGRATION_VERSION_KEY, "2024-8-1"));
    let (executor, _sink) = fresh_executor(registry, store);

    let err = executor.run().await.unwrap_err();

    assert!(matches!(err, MigrationError::Store(_)));
    assert!(calls(&log).is_empty());
}

#[tokio::test]
async fn undated_units_never_run() {
    let log = CallLog::default();
    let registry = recording_registry(&log, &["cleanup", "2024-08-15-move-notes"], &[]);
    let store = Arc::new(MemoryStore::with_value(MIGRATION_VERSION_KEY, "2024-07-28"));
    let (executor, _sink) = fresh_executor(registry, store);

    executor.run().await.unwrap();

    assert_eq!(calls(&log), vec!["2024-08-15-move-notes"]);
}
