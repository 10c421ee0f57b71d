//! List command handler

use anyhow::Result;
use std::path::Path;

use datemig::VersionId;

/// State label for a unit relative to the recorded version.
fn state_label(version: &VersionId, recorded: &VersionId) -> &'static str {
    if version.is_none() {
        "undated"
    } else if version.is_newer_than(recorded) {
        "pending"
    } else {
        "applied"
    }
}

/// List every registered migration with its version and state.
pub async fn handle(config_path: Option<&Path>) -> Result<()> {
    let installation = super::open_installation(config_path)?;
    let status = installation.status().await?;
    let units = installation.executor().registry().all_units_sorted();

    if units.is_empty() {
        println!("No migrations found.");
        return Ok(());
    }

    for unit in units {
        println!(
            "{:<8} {:<10}  {}",
            state_label(unit.version(), &status.recorded),
            unit.version(),
            unit.id()
        );
    }
    Ok(())
}
