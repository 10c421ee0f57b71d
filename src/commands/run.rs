//! Run command handler

use anyhow::Result;
use std::path::Path;

use datemig::RunOutcome;

/// Apply pending migrations. Returns `false` when a migration failed; the
/// failure has already been shown through the notification sink.
pub async fn handle(config_path: Option<&Path>) -> Result<bool> {
    let installation = super::open_installation(config_path)?;
    let outcome = installation.run().await?;

    match &outcome {
        RunOutcome::UpToDate { recorded } => {
            println!("Already up to date (version {}).", recorded);
        }
        RunOutcome::Completed { applied, recorded } => {
            println!(
                "Applied {} migration(s); recorded version is now {}.",
                applied.len(),
                recorded
            );
        }
        RunOutcome::Failed {
            applied,
            failed_unit,
            recorded,
            ..
        } => {
            println!(
                "Applied {} migration(s) before {} failed; recorded version is {}.",
                applied.len(),
                failed_unit,
                recorded
            );
        }
    }

    Ok(!outcome.is_failure())
}
