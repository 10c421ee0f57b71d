//! End-to-end runs of the datemig binary

use predicates::prelude::*;

use crate::helpers::Sandbox;

#[cfg(unix)]
#[test]
fn fresh_install_records_latest_without_running() {
    let sandbox = Sandbox::new();
    sandbox.script("2024-08-01-first.sh", 0);
    sandbox.script("2024-09-01-second.sh", 0);

    sandbox
        .cmd(&["run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Already up to date (version 2024-09-01)."));

    assert_eq!(sandbox.recorded().as_deref(), Some("2024-09-01"));
    assert!(sandbox.ran().is_empty());
}

#[cfg(unix)]
#[test]
fn legacy_install_runs_units_after_baseline() {
    let sandbox = Sandbox::new();
    sandbox.legacy_record();
    sandbox.script("2024-07-01-before.sh", 0);
    sandbox.script("2024-09-01-second.sh", 0);
    sandbox.script("2024-08-01-first.sh", 0);

    sandbox
        .cmd(&["run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Applied 2 migration(s); recorded version is now 2024-09-01.",
        ))
        .stderr(predicate::str::contains(
            "Your data has been updated to the latest version.",
        ));

    assert_eq!(
        sandbox.ran(),
        vec![
            "2024-08-01-first.sh 2024-08-01",
            "2024-09-01-second.sh 2024-09-01"
        ]
    );
}

#[cfg(unix)]
#[test]
fn failing_script_exits_nonzero_and_resumes_later() {
    let sandbox = Sandbox::new();
    std::fs::write(sandbox.settings(), "migrationVersion = \"2024-01-01\"\n").unwrap();
    sandbox.script("2024-08-01-first.sh", 0);
    sandbox.script("2024-08-02-second.sh", 3);
    sandbox.script("2024-08-03-third.sh", 0);

    sandbox
        .cmd(&["run"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "Applied 1 migration(s) before 2024-08-02-second.sh failed; recorded version is 2024-08-01.",
        ))
        .stderr(predicate::str::contains("Updating your data failed:"))
        .stderr(predicate::str::contains("disk full"));

    assert_eq!(sandbox.recorded().as_deref(), Some("2024-08-01"));

    sandbox.script("2024-08-02-second.sh", 0);
    sandbox.cmd(&["run"]).assert().success();

    assert_eq!(
        sandbox.ran(),
        vec![
            "2024-08-01-first.sh 2024-08-01",
            "2024-08-02-second.sh 2024-08-02",
            "2024-08-02-second.sh 2024-08-02",
            "2024-08-03-third.sh 2024-08-03"
        ]
    );
    assert_eq!(sandbox.recorded().as_deref(), Some("2024-08-03"));
}

#[cfg(unix)]
#[test]
fn status_and_list_report_pending_units() {
    let sandbox = Sandbox::new();
    std::fs::write(sandbox.settings(), "migrationVersion = \"2024-08-01\"\n").unwrap();
    sandbox.script("2024-08-01-first.sh", 0);
    sandbox.script("2024-08-02-second.sh", 0);
    sandbox.script("notes.sh", 0);

    sandbox
        .cmd(&["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded version: 2024-08-01"))
        .stdout(predicate::str::contains("Latest version:   2024-08-02"))
        .stdout(predicate::str::contains("Pending:          1"));

    let output = sandbox.cmd(&["list"]).assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();
    insta::assert_snapshot!(stdout, @r"
    undated  (none)      notes.sh
    applied  2024-08-01  2024-08-01-first.sh
    pending  2024-08-02  2024-08-02-second.sh
    ");
    assert!(sandbox.ran().is_empty());
}

#[test]
fn status_before_first_run() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd(&["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded version: (none)"))
        .stdout(predicate::str::contains("No version recorded yet"));

    assert!(!sandbox.settings().exists());
}

#[test]
fn list_without_scripts() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd(&["list"])
        .assert()
        .success()
        .stdout("No migrations found.\n");
}

#[test]
fn config_show_prints_effective_config() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd(&["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[store]"))
        .stdout(predicate::str::contains("legacy_version = \"2024-07-28\""))
        .stdout(predicate::str::contains(
            sandbox.settings().display().to_string(),
        ));
}

#[test]
fn invalid_legacy_version_in_config_is_rejected() {
    let sandbox = Sandbox::new();
    std::fs::write(
        sandbox.config(),
        "[bootstrap]\nlegacy_version = \"July 2024\"\n",
    )
    .unwrap();

    sandbox
        .cmd(&["status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("legacy_version"));
}

#[test]
fn completions_are_generated() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd(&["completions", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("datemig"));
}
