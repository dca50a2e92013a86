//! Storage layer for family-budget
//!
//! Each entity set lives in its own JSON file under the data directory.
//! Multi-entity changes go through a [`UnitOfWork`], which holds an exclusive
//! lock on the data directory, reloads whatever another process committed
//! since this handle last looked, and restores the previous state if the
//! work is not committed.

pub mod budgets;
pub mod categories;
pub mod credits;
pub mod expenses;
pub mod families;
pub mod file_io;
pub mod lock;
pub mod rules;
pub mod unit_of_work;

pub use budgets::BudgetRepository;
pub use categories::{CategoryData, CategoryRepository};
pub use credits::CreditRepository;
pub use expenses::ExpenseRepository;
pub use families::FamilyRepository;
pub use file_io::{read_json, write_json_atomic, StagedWrites};
pub use lock::StoreLock;
pub use rules::RuleRepository;
pub use unit_of_work::UnitOfWork;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::audit::AuditLogger;
use crate::config::paths::BudgetPaths;
use crate::error::{BudgetError, BudgetResult};
use crate::models::UserId;

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, BudgetError> {
    lock.read()
        .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, BudgetError> {
    lock.write()
        .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))
}

/// Number of commits made to a data directory
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct Revision {
    #[serde(default)]
    revision: u64,
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: BudgetPaths,
    pub families: FamilyRepository,
    pub categories: CategoryRepository,
    pub budgets: BudgetRepository,
    pub expenses: ExpenseRepository,
    pub credits: CreditRepository,
    pub rules: RuleRepository,
    audit: AuditLogger,
    txn_lock: Mutex<()>,
    /// Revision the in-memory repositories reflect
    revision: AtomicU64,
}

impl Storage {
    /// Create a new Storage instance, creating the data directory if needed
    pub fn new(paths: BudgetPaths) -> BudgetResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            families: FamilyRepository::new(paths.families_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            budgets: BudgetRepository::new(paths.budgets_file()),
            expenses: ExpenseRepository::new(paths.expenses_file()),
            credits: CreditRepository::new(paths.credits_file()),
            rules: RuleRepository::new(paths.rules_file()),
            audit: AuditLogger::new(paths.audit_log()),
            txn_lock: Mutex::new(()),
            revision: AtomicU64::new(0),
            paths,
        })
    }

    /// Open storage at `paths` and load everything from disk
    pub fn open(paths: BudgetPaths) -> BudgetResult<Self> {
        let storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    pub fn paths(&self) -> &BudgetPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk, waiting for any writer to finish first
    pub fn load_all(&self) -> BudgetResult<()> {
        let _lock = StoreLock::acquire(&self.paths.lock_file())?;
        self.load_locked()
    }

    /// Save all data to disk
    pub fn save_all(&self) -> BudgetResult<()> {
        let _lock = StoreLock::acquire(&self.paths.lock_file())?;
        self.save_locked()
    }

    /// Start a unit of work on behalf of `actor`
    ///
    /// Blocks until any other unit of work on this data directory, in this
    /// process or another, has finished.
    pub fn begin(&self, actor: &UserId) -> BudgetResult<UnitOfWork<'_>> {
        let guard = self
            .txn_lock
            .lock()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire transaction lock: {}", e)))?;
        let file_lock = StoreLock::acquire(&self.paths.lock_file())?;
        self.refresh_locked()?;
        UnitOfWork::start(self, guard, file_lock, actor.clone())
    }

    fn read_revision(&self) -> BudgetResult<u64> {
        let on_disk: Revision = read_json(self.paths.revision_file())?;
        Ok(on_disk.revision)
    }

    fn load_locked(&self) -> BudgetResult<()> {
        let revision = self.read_revision()?;
        self.families.load()?;
        self.categories.load()?;
        self.budgets.load()?;
        self.expenses.load()?;
        self.credits.load()?;
        self.rules.load()?;
        self.revision.store(revision, Ordering::SeqCst);
        tracing::debug!(
            data_dir = %self.paths.data_dir().display(),
            revision,
            "loaded storage"
        );
        Ok(())
    }

    /// Reload if another handle committed since this one last loaded or saved
    fn refresh_locked(&self) -> BudgetResult<()> {
        let on_disk = self.read_revision()?;
        if on_disk != self.revision.load(Ordering::SeqCst) {
            tracing::debug!(revision = on_disk, "data changed on disk, reloading");
            self.load_locked()?;
        }
        Ok(())
    }

    /// Write every repository and bump the revision; caller holds the store lock
    pub(crate) fn save_locked(&self) -> BudgetResult<()> {
        let next = self.read_revision()?.max(self.revision.load(Ordering::SeqCst)) + 1;

        let mut writes = StagedWrites::new();
        // Revision goes first so a half-published commit still forces a reload
        writes.stage(self.paths.revision_file(), &Revision { revision: next })?;
        self.families.stage(&mut writes)?;
        self.categories.stage(&mut writes)?;
        self.budgets.stage(&mut writes)?;
        self.expenses.stage(&mut writes)?;
        self.credits.stage(&mut writes)?;
        self.rules.stage(&mut writes)?;
        writes.publish()?;

        self.revision.store(next, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Family;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().join("fresh"));
        let storage = Storage::new(paths).unwrap();
        assert!(storage.paths().data_dir().exists());
    }

    #[test]
    fn test_save_and_open() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths.clone()).unwrap();
        storage
            .families
            .insert(Family::new("Smith", UserId::new("alice")))
            .unwrap();
        storage.save_all().unwrap();

        let reopened = Storage::open(paths).unwrap();
        assert!(reopened.families.get_by_name("smith").unwrap().is_some());
    }

    #[test]
    fn test_begin_sees_commits_from_other_handles() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let first = Storage::open(paths.clone()).unwrap();
        let second = Storage::open(paths.clone()).unwrap();
        let alice = UserId::new("alice");

        let uow = first.begin(&alice).unwrap();
        uow.storage()
            .families
            .insert(Family::new("Smith", alice.clone()))
            .unwrap();
        uow.commit().unwrap();

        // Stale until it starts a unit of work
        assert_eq!(second.families.count().unwrap(), 0);
        let uow = second.begin(&alice).unwrap();
        assert!(uow.storage().families.get_by_name("Smith").unwrap().is_some());
        uow.storage()
            .families
            .insert(Family::new("Jones", alice.clone()))
            .unwrap();
        uow.commit().unwrap();

        let reopened = Storage::open(paths).unwrap();
        assert_eq!(reopened.families.count().unwrap(), 2);
    }

    #[test]
    fn test_unsaved_changes_survive_begin_without_outside_commits() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        let alice = UserId::new("alice");
        storage
            .families
            .insert(Family::new("Smith", alice.clone()))
            .unwrap();

        let uow = storage.begin(&alice).unwrap();
        assert_eq!(uow.storage().families.count().unwrap(), 1);
        uow.commit().unwrap();
    }
}
