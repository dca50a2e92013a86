//! Exclusive lock on the data directory
//!
//! Every `fambudget` invocation is its own process, so the in-process
//! transaction mutex is not enough to serialize writers. `StoreLock` takes an
//! advisory lock on `data/.lock` and holds it until dropped.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;

use crate::error::BudgetError;

#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Block until the lock at `path` is ours
    pub fn acquire(path: &Path) -> Result<Self, BudgetError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                BudgetError::Storage(format!("Failed to open lock file {}: {}", path.display(), e))
            })?;

        FileExt::lock_exclusive(&file).map_err(|e| {
            BudgetError::Storage(format!("Failed to lock {}: {}", path.display(), e))
        })?;
        tracing::trace!(path = %path.display(), "acquired store lock");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to release store lock");
        }
    }
}
