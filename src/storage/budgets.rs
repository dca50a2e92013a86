//! Budget repository for JSON storage
//!
//! Enforces the one-budget-per-(family, month) constraint; an insert that
//! would violate it fails with `BudgetError::Duplicate` and leaves the store
//! unchanged.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::BudgetError;
use crate::models::{Budget, BudgetId, BudgetMonth, FamilyId};

use super::file_io::{read_json, StagedWrites};
use super::{read_lock, write_lock};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct BudgetData {
    #[serde(default)]
    budgets: Vec<Budget>,
}

#[derive(Debug, Default)]
struct BudgetIndex {
    budgets: HashMap<BudgetId, Budget>,
    by_month: HashMap<(FamilyId, BudgetMonth), BudgetId>,
}

/// Repository for monthly budget persistence
pub struct BudgetRepository {
    path: PathBuf,
    index: RwLock<BudgetIndex>,
}

impl BudgetRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            index: RwLock::new(BudgetIndex::default()),
        }
    }

    /// Load budgets from disk
    pub fn load(&self) -> Result<(), BudgetError> {
        let file_data: BudgetData = read_json(&self.path)?;
        self.replace_all(file_data.budgets)
    }

    /// Stage budgets for the next publish
    pub fn stage(&self, writes: &mut StagedWrites) -> Result<(), BudgetError> {
        let file_data = BudgetData {
            budgets: self.get_all()?,
        };
        writes.stage(&self.path, &file_data)
    }

    pub(crate) fn replace_all(&self, budgets: Vec<Budget>) -> Result<(), BudgetError> {
        let mut index = write_lock(&self.index)?;
        index.budgets.clear();
        index.by_month.clear();

        for budget in budgets {
            if index.by_month.insert(budget.key(), budget.id).is_some() {
                return Err(BudgetError::Storage(format!(
                    "Duplicate budget for {} in {}",
                    budget.month,
                    self.path.display()
                )));
            }
            index.budgets.insert(budget.id, budget);
        }
        Ok(())
    }

    pub fn get(&self, id: BudgetId) -> Result<Option<Budget>, BudgetError> {
        Ok(read_lock(&self.index)?.budgets.get(&id).cloned())
    }

    /// Find the budget for a family's month
    pub fn find(
        &self,
        family_id: FamilyId,
        month: BudgetMonth,
    ) -> Result<Option<Budget>, BudgetError> {
        let index = read_lock(&self.index)?;
        Ok(index
            .by_month
            .get(&(family_id, month))
            .and_then(|id| index.budgets.get(id))
            .cloned())
    }

    /// Insert a new budget; fails if the family already has one for that month
    pub fn insert(&self, budget: Budget) -> Result<(), BudgetError> {
        let mut index = write_lock(&self.index)?;
        if index.by_month.contains_key(&budget.key()) || index.budgets.contains_key(&budget.id) {
            return Err(BudgetError::Duplicate {
                entity_type: "Budget",
                identifier: budget.month.to_string(),
            });
        }
        index.by_month.insert(budget.key(), budget.id);
        index.budgets.insert(budget.id, budget);
        Ok(())
    }

    /// Update an existing budget; the (family, month) key cannot change
    pub fn update(&self, budget: Budget) -> Result<(), BudgetError> {
        let mut index = write_lock(&self.index)?;
        match index.budgets.get(&budget.id) {
            Some(existing) if existing.key() == budget.key() => {}
            Some(_) => {
                return Err(BudgetError::Validation(
                    "A budget's family and month cannot be changed".into(),
                ))
            }
            None => {
                return Err(BudgetError::NotFound {
                    entity_type: "Budget",
                    identifier: budget.id.to_string(),
                })
            }
        }
        index.budgets.insert(budget.id, budget);
        Ok(())
    }

    /// Budgets of a family, oldest month first
    pub fn for_family(&self, family_id: FamilyId) -> Result<Vec<Budget>, BudgetError> {
        let index = read_lock(&self.index)?;
        let mut list: Vec<_> = index
            .budgets
            .values()
            .filter(|b| b.family_id == family_id)
            .cloned()
            .collect();
        list.sort_by_key(|b| b.month);
        Ok(list)
    }

    pub fn get_all(&self) -> Result<Vec<Budget>, BudgetError> {
        let index = read_lock(&self.index)?;
        let mut list: Vec<_> = index.budgets.values().cloned().collect();
        list.sort_by(|a, b| a.month.cmp(&b.month).then(a.created_at.cmp(&b.created_at)));
        Ok(list)
    }

    pub fn count(&self) -> Result<usize, BudgetError> {
        Ok(read_lock(&self.index)?.budgets.len())
    }
}
