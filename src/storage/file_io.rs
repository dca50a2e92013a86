//! JSON file persistence
//!
//! A commit touches several data files. Each one is first written and synced
//! to a `.staged` sibling; only when every file has been staged are they
//! renamed over the live files. A failure while staging leaves every live
//! file untouched.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::BudgetError;

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, BudgetError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| BudgetError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| BudgetError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write a single JSON file through a one-entry [`StagedWrites`]
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), BudgetError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let mut writes = StagedWrites::new();
    writes.stage(path, data)?;
    writes.publish()
}

/// Files written to disk but not yet moved into place
///
/// Dropping an unpublished set removes its staged files.
#[derive(Debug, Default)]
pub struct StagedWrites {
    staged: Vec<(PathBuf, PathBuf)>,
}

impl StagedWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `data` next to `path` and sync it
    pub fn stage<T, P>(&mut self, path: P, data: &T) -> Result<(), BudgetError>
    where
        T: Serialize,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BudgetError::Storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let staged_path = staged_path_for(path);
        let file = File::create(&staged_path).map_err(|e| {
            BudgetError::Storage(format!("Failed to create {}: {}", staged_path.display(), e))
        })?;
        // Tracked before writing so a failed write is still cleaned up
        self.staged.push((staged_path, path.to_path_buf()));

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, data)
            .map_err(|e| BudgetError::Storage(format!("Failed to serialize data: {}", e)))?;
        writer
            .flush()
            .map_err(|e| BudgetError::Storage(format!("Failed to flush data: {}", e)))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| BudgetError::Storage(format!("Failed to sync data: {}", e)))?;
        Ok(())
    }

    /// Rename every staged file over its target, in staging order
    pub fn publish(mut self) -> Result<(), BudgetError> {
        let staged = std::mem::take(&mut self.staged);
        let mut pending = staged.into_iter();
        while let Some((from, to)) = pending.next() {
            if let Err(e) = fs::rename(&from, &to) {
                let _ = fs::remove_file(&from);
                for (rest, _) in pending {
                    let _ = fs::remove_file(rest);
                }
                return Err(BudgetError::Storage(format!(
                    "Failed to move {} into place: {}",
                    to.display(),
                    e
                )));
            }
        }
        Ok(())
    }
}

impl Drop for StagedWrites {
    fn drop(&mut self) {
        for (staged, _) in self.staged.drain(..) {
            let _ = fs::remove_file(staged);
        }
    }
}

fn staged_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".staged");
    path.with_file_name(name)
}
