//! Backup and restore of a single configuration file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{HarnessError, Result};

/// Copies a file aside so later edits can be undone.
///
/// The backup lives next to the original with a `.bak` suffix. The file
/// format is irrelevant; contents are copied byte for byte.
#[derive(Debug, Clone)]
pub struct ConfigBackup {
    path: PathBuf,
    backup_path: PathBuf,
}

impl ConfigBackup {
    /// Create a backup handle for `path`. Nothing is copied yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut backup = OsString::from(path.as_os_str());
        backup.push(".bak");
        Self {
            path,
            backup_path: PathBuf::from(backup),
        }
    }

    /// The file being protected.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the copy is kept.
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Copy the file to its backup location.
    pub async fn save(&self) -> Result<()> {
        debug!("backing up {}", self.path.display());
        copy(&self.path, &self.backup_path).await
    }

    /// Copy the backup over the file.
    pub async fn restore(&self) -> Result<()> {
        debug!("restoring {}", self.path.display());
        copy(&self.backup_path, &self.path).await
    }
}

async fn copy(from: &Path, to: &Path) -> Result<()> {
    tokio::fs::copy(from, to)
        .await
        .map_err(|source| HarnessError::Backup {
            path: from.display().to_string(),
            source,
        })?;
    Ok(())
}
