//! All-or-nothing changes across repositories
//!
//! A `UnitOfWork` holds the storage's transaction mutex, the data directory
//! lock, and a snapshot of every repository taken when it started. Writes go
//! straight to the in-memory repositories; `commit` stages every data file,
//! publishes them together and appends the pending audit entries. Dropping
//! an uncommitted unit of work, or a failed save, puts the snapshot back.

use std::sync::MutexGuard;

use serde::Serialize;

use crate::audit::{AuditEntry, EntityType};
use crate::error::BudgetResult;
use crate::models::{Budget, Credit, Expense, Family, RecurringRule, UserId};

use super::{CategoryData, Storage, StoreLock};

struct StorageSnapshot {
    families: Vec<Family>,
    categories: CategoryData,
    budgets: Vec<Budget>,
    expenses: Vec<Expense>,
    credits: Vec<Credit>,
    rules: Vec<RecurringRule>,
}

impl StorageSnapshot {
    fn capture(storage: &Storage) -> BudgetResult<Self> {
        Ok(Self {
            families: storage.families.get_all()?,
            categories: storage.categories.get_all()?,
            budgets: storage.budgets.get_all()?,
            expenses: storage.expenses.get_all()?,
            credits: storage.credits.get_all()?,
            rules: storage.rules.get_all()?,
        })
    }

    fn restore(self, storage: &Storage) -> BudgetResult<()> {
        storage.families.replace_all(self.families)?;
        storage.categories.replace_all(self.categories)?;
        storage.budgets.replace_all(self.budgets)?;
        storage.expenses.replace_all(self.expenses)?;
        storage.credits.replace_all(self.credits)?;
        storage.rules.replace_all(self.rules)?;
        Ok(())
    }
}

pub struct UnitOfWork<'a> {
    storage: &'a Storage,
    _file_lock: StoreLock,
    _guard: MutexGuard<'a, ()>,
    actor: UserId,
    snapshot: Option<StorageSnapshot>,
    pending: Vec<AuditEntry>,
}

impl<'a> UnitOfWork<'a> {
    pub(super) fn start(
        storage: &'a Storage,
        guard: MutexGuard<'a, ()>,
        file_lock: StoreLock,
        actor: UserId,
    ) -> BudgetResult<Self> {
        let snapshot = StorageSnapshot::capture(storage)?;
        Ok(Self {
            storage,
            _file_lock: file_lock,
            _guard: guard,
            actor,
            snapshot: Some(snapshot),
            pending: Vec::new(),
        })
    }

    pub fn storage(&self) -> &'a Storage {
        self.storage
    }

    pub fn actor(&self) -> &UserId {
        &self.actor
    }

    pub fn log_create<T: Serialize>(
        &mut self,
        entity_type: EntityType,
        entity_id: impl ToString,
        label: impl Into<String>,
        entity: &T,
    ) {
        self.pending
            .push(AuditEntry::create(entity_type, entity_id, &self.actor, entity).with_label(label));
    }

    pub fn log_update<T: Serialize>(
        &mut self,
        entity_type: EntityType,
        entity_id: impl ToString,
        label: impl Into<String>,
        before: &T,
        after: &T,
    ) {
        self.pending.push(
            AuditEntry::update(entity_type, entity_id, &self.actor, before, after)
                .with_label(label),
        );
    }

    pub fn log_delete<T: Serialize>(
        &mut self,
        entity_type: EntityType,
        entity_id: impl ToString,
        label: impl Into<String>,
        entity: &T,
    ) {
        self.pending
            .push(AuditEntry::delete(entity_type, entity_id, &self.actor, entity).with_label(label));
    }

    /// Persist every repository, then append the audit entries
    ///
    /// If saving fails the in-memory state is rolled back and re-saved so
    /// memory and disk agree again. An audit log that cannot be written is
    /// reported but does not undo committed data.
    pub fn commit(mut self) -> BudgetResult<()> {
        if let Err(err) = self.storage.save_locked() {
            tracing::error!(error = %err, "commit failed, rolling back");
            self.restore();
            if let Err(resave) = self.storage.save_locked() {
                tracing::error!(error = %resave, "could not re-save state after failed commit");
            }
            return Err(err);
        }

        self.snapshot = None;
        let entries = std::mem::take(&mut self.pending);
        tracing::debug!(entries = entries.len(), actor = %self.actor, "committed unit of work");
        if let Err(err) = self.storage.audit().log_batch(&entries) {
            tracing::warn!(error = %err, "failed to write audit entries");
        }
        Ok(())
    }

    /// Discard every change made since `begin`
    pub fn rollback(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.pending.clear();
            if let Err(err) = snapshot.restore(self.storage) {
                tracing::error!(error = %err, "failed to restore storage snapshot");
            } else {
                tracing::debug!(actor = %self.actor, "rolled back unit of work");
            }
        }
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}

#[cfg(test)]
mod tests {
    use crate::config::paths::BudgetPaths;
    use crate::models::{Budget, BudgetMonth, Family, UserId};
    use crate::storage::Storage;
    use tempfile::TempDir;

    fn create_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_commit_persists_and_audits() {
        let (_temp, storage) = create_storage();
        let alice = UserId::new("alice");
        let family = Family::new("Smith", alice.clone());

        let mut uow = storage.begin(&alice).unwrap();
        uow.storage().families.insert(family.clone()).unwrap();
        uow.log_create(crate::audit::EntityType::Family, family.id, "Smith", &family);
        uow.commit().unwrap();

        let reopened = Storage::open(storage.paths().clone()).unwrap();
        assert_eq!(reopened.families.count().unwrap(), 1);

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor, alice);
    }

    #[test]
    fn test_drop_rolls_back() {
        let (_temp, storage) = create_storage();
        let alice = UserId::new("alice");
        let family = Family::new("Smith", alice.clone());
        let month = BudgetMonth::new(2024, 2).unwrap();

        {
            let mut uow = storage.begin(&alice).unwrap();
            uow.storage().families.insert(family.clone()).unwrap();
            uow.storage()
                .budgets
                .insert(Budget::new(family.id, month))
                .unwrap();
            uow.log_create(crate::audit::EntityType::Family, family.id, "Smith", &family);
        }

        assert_eq!(storage.families.count().unwrap(), 0);
        assert!(storage.budgets.find(family.id, month).unwrap().is_none());
        assert!(storage.audit().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_explicit_rollback_keeps_earlier_commits() {
        let (_temp, storage) = create_storage();
        let alice = UserId::new("alice");

        let uow = storage.begin(&alice).unwrap();
        uow.storage()
            .families
            .insert(Family::new("Kept", alice.clone()))
            .unwrap();
        uow.commit().unwrap();

        let uow = storage.begin(&alice).unwrap();
        uow.storage()
            .families
            .insert(Family::new("Dropped", alice.clone()))
            .unwrap();
        uow.rollback();

        let names: Vec<_> = storage
            .families
            .get_all()
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Kept"]);
    }
}
