//! TOML settings file backend.
//!
//! Values are top-level string keys. Writes go through `toml_edit` so comments,
//! formatting and unrelated keys survive, and land atomically (temp file in the
//! same directory, fsync, rename, directory fsync) so a crash mid-write leaves
//! the previous file intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use toml_edit::{value, DocumentMut};

use super::VersionStore;
use crate::error::StoreError;

#[derive(Debug)]
pub struct SettingsFile {
    path: PathBuf,
    write_guard: Mutex<()>,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Read and parse the file. A missing file is an empty document.
    async fn load(&self) -> Result<DocumentMut, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(self.io_error(e)),
        };
        content.parse().map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn atomic_write(&self, content: &str) -> Result<(), StoreError> {
        // Temp file in the same directory keeps the rename on one filesystem
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| self.io_error(e))?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("settings");
        let temp_path = parent.join(format!(".{}.tmp", file_name));

        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(self.io_error(e));
        }
        // The rename is only durable once the directory entry is flushed
        sync_dir(&parent).await.map_err(|e| self.io_error(e))
    }
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

// Directories cannot be opened as files on windows
#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl VersionStore for SettingsFile {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let doc = self.load().await?;
        match doc.as_table().get(key) {
            None => Ok(None),
            Some(item) => item
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| StoreError::NotAString {
                    key: key.to_string(),
                }),
        }
    }

    async fn set(&self, key: &str, new_value: &str) -> Result<(), StoreError> {
        // Serialize read-modify-write cycles within this process
        let _guard = self.write_guard.lock().await;

        let mut doc = self.load().await?;
        doc.insert(key, value(new_value));
        self.atomic_write(&doc.to_string()).await?;

        tracing::debug!(key, value = new_value, path = %self.path.display(), "setting persisted");
        Ok(())
    }
}
