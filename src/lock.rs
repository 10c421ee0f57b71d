//! Cross-process run lock for file-backed stores.
//!
//! A run holds `<settings>.lock` for its whole duration. The lock file is
//! created exclusively and stores the owner's PID, so a lock left behind by a
//! crashed process is detected and reclaimed.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MigrationError;

/// Metadata stored in a lock file to identify the owning process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub started: String,
}

/// Get the lock file path for a given settings file.
///
/// The lock path is the original path with `.lock` appended.
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut lock = path.as_os_str().to_owned();
    lock.push(".lock");
    PathBuf::from(lock)
}

/// Read lock info if the lock file exists and the owning PID is still alive.
///
/// Returns `None` if the lock file is missing, malformed, or the PID is dead.
pub fn read_lock(path: &Path) -> Option<LockInfo> {
    let contents = fs::read_to_string(lock_path_for(path)).ok()?;
    let info: LockInfo = serde_json::from_str(&contents).ok()?;
    if !is_pid_alive(info.pid) {
        return None;
    }
    Some(info)
}

/// Exclusive hold on a settings file for the duration of a run.
/// Dropping it removes the lock file.
#[derive(Debug)]
pub struct RunLock {
    lock_path: PathBuf,
}

impl RunLock {
    /// Take the lock for `path`, reclaiming a stale lock once.
    pub fn acquire(path: &Path) -> Result<Self, MigrationError> {
        let lock_path = lock_path_for(path);
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| MigrationError::Lock {
                path: lock_path.clone(),
                source,
            })?;
        }

        match try_create(&lock_path) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if let Some(info) = read_lock(path) {
                    return Err(MigrationError::Locked {
                        pid: info.pid,
                        path: lock_path,
                    });
                }
                tracing::warn!(lock = %lock_path.display(), "removing stale run lock");
                let _ = fs::remove_file(&lock_path);
                try_create(&lock_path).map_err(|source| lock_error(&lock_path, source))
            }
            Err(source) => Err(lock_error(&lock_path, source)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn lock_error(lock_path: &Path, source: std::io::Error) -> MigrationError {
    match read_lock_file(lock_path) {
        Some(info) if source.kind() == ErrorKind::AlreadyExists => MigrationError::Locked {
            pid: info.pid,
            path: lock_path.to_path_buf(),
        },
        _ => MigrationError::Lock {
            path: lock_path.to_path_buf(),
            source,
        },
    }
}

fn read_lock_file(lock_path: &Path) -> Option<LockInfo> {
    let contents = fs::read_to_string(lock_path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Create the lock file exclusively and write our PID and start time.
fn try_create(lock_path: &Path) -> std::io::Result<RunLock> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)?;
    let info = LockInfo {
        pid: std::process::id(),
        started: chrono::Utc::now().to_rfc3339(),
    };
    let json = serde_json::to_string(&info)?;
    let lock = RunLock {
        lock_path: lock_path.to_path_buf(),
    };
    // On write failure the guard drops and removes the half-written file
    file.write_all(json.as_bytes())?;
    Ok(lock)
}

/// Check whether a process with the given PID is still running.
///
/// Uses `kill(pid, 0)` which checks for process existence without sending a signal.
/// Returns `true` if the process exists (even if owned by another user: EPERM).
#[cfg(unix)]
pub(crate) fn is_pid_alive(pid: u32) -> bool {
    // SAFETY: kill with signal 0 only checks process existence, no signal is sent.
    let ret = unsafe { libc::kill(pid as libc::pid_t, 0) };
    if ret == 0 {
        return true;
    }
    // EPERM means the process exists but belongs to another user
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub(crate) fn is_pid_alive(_pid: u32) -> bool {
    false
}
