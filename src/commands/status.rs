//! Status command handler

use anyhow::Result;
use std::path::Path;

/// Print recorded version, latest available version and pending count.
pub async fn handle(config_path: Option<&Path>) -> Result<()> {
    let installation = super::open_installation(config_path)?;
    let status = installation.status().await?;

    println!("Settings file:    {}", installation.settings_file().display());
    println!("Recorded version: {}", status.recorded);
    println!("Latest version:   {}", status.latest);
    println!("Pending:          {}", status.pending.len());
    if status.recorded.is_none() {
        println!("No version recorded yet; the next run will pick a baseline.");
    }
    Ok(())
}
