//! CLI definitions for datemig
//!
//! This module contains the clap CLI structure definitions, separated from main.rs
//! so they can be accessed by xtask for documentation generation (man pages, markdown).

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

/// Build clap styles.
///
/// - Green: headers, usage, command names
/// - White: descriptions, placeholders
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "datemig")]
#[command(about = "Run date-versioned migrations against an installation, resumably")]
#[command(
    long_about = "datemig - Date-versioned, resumable migration runner.

Migrations are executable scripts named with a YYYY-MM-DD date, for example
2024-08-15-move-notes.sh. datemig records the newest applied date in a settings
file and only runs scripts with a newer date, oldest first. If a script fails,
the run stops and the next run resumes from the failed script.

QUICK START:
    datemig status                 Show recorded and latest versions
    datemig list                   List migrations and whether they are applied
    datemig run                    Apply pending migrations

CONFIGURATION:
    ~/.config/datemig/config.toml  (override with --config)"
)]
#[command(version)]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply pending migrations
    #[command(long_about = "Apply every pending migration in version order.

On a first run with no recorded version, datemig decides a baseline: if the
records directory holds data marked as legacy, the configured legacy version is
recorded so later migrations run; otherwise every existing migration is
treated as applied.

The recorded version is written after each successful migration. A failing
migration stops the run and exits with status 1.

EXAMPLE:
    datemig run")]
    Run,

    /// Show the recorded version and pending migration count
    Status,

    /// List all migrations with their state
    List,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration as TOML
    #[command(long_about = "Display the effective configuration in TOML format.

Values missing from the config file are shown with their defaults.

EXAMPLE:
    datemig config show
    datemig --config ./datemig.toml config show")]
    Show,
}
