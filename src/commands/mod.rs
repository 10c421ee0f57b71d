//! Command handlers for the datemig CLI.
//!
//! Each submodule handles a specific CLI command or command group.
//! The main dispatch logic remains in main.rs.

pub mod completions;
pub mod config;
pub mod list;
pub mod run;
pub mod status;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use datemig::notify::{ConsoleSink, Notifications, TracingSink};
use datemig::{Config, Installation};

/// Load the config from `--config`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Open the configured installation, printing notifications to the terminal.
pub fn open_installation(config_path: Option<&Path>) -> Result<Installation> {
    let config = load_config(config_path)?;
    let sink = Notifications::new()
        .with(ConsoleSink::new())
        .with(TracingSink);
    let installation = Installation::open(&config, Arc::new(sink))?;
    Ok(installation)
}
