//! Executable files as migration units.
//!
//! Every regular, non-hidden file in the scripts directory is one unit, named
//! by its file name: `2024-08-15-move-notes.sh` carries version `2024-08-15`.
//! On unix only files with an executable bit are picked up.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{ChildStdout, Command};

use crate::error::RegistryError;
use crate::registry::{MigrationUnit, Registry, RegistryBuilder};
use crate::version::VersionId;

/// Environment variable carrying the unit id into the script.
pub const ENV_UNIT: &str = "DATEMIG_UNIT";
/// Environment variable carrying the unit version into the script.
pub const ENV_VERSION: &str = "DATEMIG_VERSION";

#[derive(Debug, Clone)]
pub struct ScriptUnit {
    path: PathBuf,
    id: String,
}

impl ScriptUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { path, id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScriptUnit {
    /// Log each stdout line until the script closes the pipe. Output need
    /// not be UTF-8.
    async fn log_stdout(&self, stdout: ChildStdout) {
        let mut reader = BufReader::new(stdout);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&line);
                    tracing::info!(unit = %self.id, "{}", text.trim_end());
                }
                Err(e) => {
                    tracing::warn!(unit = %self.id, error = %e, "failed to read script output");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl MigrationUnit for ScriptUnit {
    async fn run(&self) -> Result<()> {
        // Relative program paths combined with current_dir are platform specific
        let program = if self.path.is_absolute() {
            self.path.clone()
        } else {
            std::env::current_dir()
                .context("Failed to resolve current directory")?
                .join(&self.path)
        };
        let mut command = Command::new(&program);
        if let Some(dir) = program.parent() {
            command.current_dir(dir);
        }
        let mut child = command
            .env(ENV_UNIT, &self.id)
            .env(ENV_VERSION, VersionId::from_unit_name(&self.id).as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start migration script {}", self.path.display()))?;

        let stdout = child.stdout.take().context("Script stdout was not captured")?;
        let mut stderr = child.stderr.take().context("Script stderr was not captured")?;

        // Drain stderr concurrently so a chatty script cannot block on a full pipe
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        self.log_stdout(stdout).await;

        let status = child
            .wait()
            .await
            .with_context(|| format!("Failed to wait for migration script {}", self.id))?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if status.success() {
            return Ok(());
        }

        let code = status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        match last_non_empty_line(&stderr_output) {
            Some(line) => anyhow::bail!("{} exited with status {}: {}", self.id, code, line),
            None => anyhow::bail!("{} exited with status {}", self.id, code),
        }
    }
}

fn last_non_empty_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rev().find(|l| !l.is_empty())
}

/// List script units in `dir`, sorted by file name. A missing directory has
/// no scripts.
pub fn discover(dir: &Path) -> Result<Vec<ScriptUnit>, RegistryError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "scripts directory does not exist");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(RegistryError::Discover {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut units: Vec<ScriptUnit> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| is_script(path))
        .map(ScriptUnit::new)
        .collect();
    units.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(units)
}

/// Build a registry from every script in `dir`.
pub fn registry_from_dir(dir: &Path) -> Result<Registry, RegistryError> {
    discover(dir)?
        .into_iter()
        .fold(RegistryBuilder::new(), |builder, unit| {
            let id = unit.id.clone();
            builder.register_boxed(id, Box::new(unit))
        })
        .build()
}

fn is_script(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(true, |n| n.starts_with('.'));
    if hidden {
        return false;
    }
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    meta.is_file() && is_executable(&meta)
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    true
}
