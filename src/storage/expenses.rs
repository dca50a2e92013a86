//! Expense repository for JSON storage
//!
//! Manages expenses.json with two indexes: expenses per budget, and the
//! (budget, rule, date) occurrence key of generated expenses. The occurrence
//! key is unique, which is what keeps recurring generation idempotent.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::BudgetError;
use crate::models::{BudgetId, Expense, ExpenseId, OccurrenceKey, RecurringRuleId};

use super::file_io::{read_json, StagedWrites};
use super::{read_lock, write_lock};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ExpenseData {
    #[serde(default)]
    expenses: Vec<Expense>,
}

#[derive(Debug, Default)]
struct ExpenseIndex {
    expenses: HashMap<ExpenseId, Expense>,
    by_budget: HashMap<BudgetId, Vec<ExpenseId>>,
    occurrences: HashMap<OccurrenceKey, ExpenseId>,
}

impl ExpenseIndex {
    fn insert(&mut self, expense: Expense) -> Result<(), BudgetError> {
        if self.expenses.contains_key(&expense.id) {
            return Err(BudgetError::Duplicate {
                entity_type: "Expense",
                identifier: expense.id.to_string(),
            });
        }
        if let Some(key) = expense.occurrence_key() {
            if self.occurrences.contains_key(&key) {
                return Err(BudgetError::Duplicate {
                    entity_type: "Recurring occurrence",
                    identifier: format!("{} on {}", key.1, key.2),
                });
            }
            self.occurrences.insert(key, expense.id);
        }
        self.by_budget
            .entry(expense.budget_id)
            .or_default()
            .push(expense.id);
        self.expenses.insert(expense.id, expense);
        Ok(())
    }

    fn remove(&mut self, id: ExpenseId) -> Option<Expense> {
        let expense = self.expenses.remove(&id)?;
        if let Some(ids) = self.by_budget.get_mut(&expense.budget_id) {
            ids.retain(|&eid| eid != id);
        }
        if let Some(key) = expense.occurrence_key() {
            self.occurrences.remove(&key);
        }
        Some(expense)
    }
}

/// Repository for expense persistence with indexing
pub struct ExpenseRepository {
    path: PathBuf,
    index: RwLock<ExpenseIndex>,
}

impl ExpenseRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            index: RwLock::new(ExpenseIndex::default()),
        }
    }

    /// Load expenses from disk and build indexes
    pub fn load(&self) -> Result<(), BudgetError> {
        let file_data: ExpenseData = read_json(&self.path)?;
        self.replace_all(file_data.expenses)
    }

    /// Stage expenses for the next publish
    pub fn stage(&self, writes: &mut StagedWrites) -> Result<(), BudgetError> {
        let mut expenses = self.get_all()?;
        expenses.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        writes.stage(&self.path, &ExpenseData { expenses })
    }

    pub(crate) fn replace_all(&self, expenses: Vec<Expense>) -> Result<(), BudgetError> {
        let mut index = write_lock(&self.index)?;
        *index = ExpenseIndex::default();
        for expense in expenses {
            index.insert(expense).map_err(|e| {
                BudgetError::Storage(format!("Corrupt {}: {}", self.path.display(), e))
            })?;
        }
        Ok(())
    }

    pub fn get(&self, id: ExpenseId) -> Result<Option<Expense>, BudgetError> {
        Ok(read_lock(&self.index)?.expenses.get(&id).cloned())
    }

    pub fn get_all(&self) -> Result<Vec<Expense>, BudgetError> {
        Ok(read_lock(&self.index)?.expenses.values().cloned().collect())
    }

    /// Expenses of a budget, by date
    pub fn get_by_budget(&self, budget_id: BudgetId) -> Result<Vec<Expense>, BudgetError> {
        let index = read_lock(&self.index)?;
        let ids = index
            .by_budget
            .get(&budget_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let mut expenses: Vec<_> = ids
            .iter()
            .filter_map(|id| index.expenses.get(id).cloned())
            .collect();
        expenses.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(expenses)
    }

    /// Expenses generated from a rule
    pub fn get_by_rule(&self, rule_id: RecurringRuleId) -> Result<Vec<Expense>, BudgetError> {
        let index = read_lock(&self.index)?;
        let mut expenses: Vec<_> = index
            .expenses
            .values()
            .filter(|e| e.recurring_rule_id == Some(rule_id))
            .cloned()
            .collect();
        expenses.sort_by_key(|e| e.date);
        Ok(expenses)
    }

    /// The expense already materialized for an occurrence, if any
    pub fn find_occurrence(&self, key: &OccurrenceKey) -> Result<Option<Expense>, BudgetError> {
        let index = read_lock(&self.index)?;
        Ok(index
            .occurrences
            .get(key)
            .and_then(|id| index.expenses.get(id))
            .cloned())
    }

    /// Insert a new expense; generated expenses must have a fresh occurrence key
    pub fn insert(&self, expense: Expense) -> Result<(), BudgetError> {
        write_lock(&self.index)?.insert(expense)
    }

    /// Replace a stored expense, keeping the indexes in step
    pub fn update(&self, expense: Expense) -> Result<(), BudgetError> {
        let mut index = write_lock(&self.index)?;
        let previous = index.remove(expense.id).ok_or_else(|| BudgetError::NotFound {
            entity_type: "Expense",
            identifier: expense.id.to_string(),
        })?;
        if let Err(err) = index.insert(expense) {
            index.insert(previous)?;
            return Err(err);
        }
        Ok(())
    }

    pub fn delete(&self, id: ExpenseId) -> Result<bool, BudgetError> {
        Ok(write_lock(&self.index)?.remove(id).is_some())
    }

    pub fn count(&self) -> Result<usize, BudgetError> {
        Ok(read_lock(&self.index)?.expenses.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, FamilyId, Money, NewRule, PaymentTypeId, RecurringRule, UserId};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, ExpenseRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = ExpenseRepository::new(temp_dir.path().join("expenses.json"));
        (temp_dir, repo)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn gym_rule() -> RecurringRule {
        RecurringRule::new(
            NewRule::weekly(
                FamilyId::new(),
                CategoryId::new(),
                PaymentTypeId::new(),
                "Gym",
                Money::from_cents(1500),
                date(1),
                2,
            ),
            UserId::new("alice"),
        )
    }

    fn manual(budget_id: BudgetId, day: u32) -> Expense {
        Expense::new(
            budget_id,
            CategoryId::new(),
            PaymentTypeId::new(),
            Money::from_cents(500),
            date(day),
            UserId::new("alice"),
        )
    }

    #[test]
    fn test_get_by_budget_sorted() {
        let (_temp_dir, repo) = create_test_repo();
        let budget = BudgetId::new();
        repo.insert(manual(budget, 20)).unwrap();
        repo.insert(manual(budget, 3)).unwrap();
        repo.insert(manual(BudgetId::new(), 5)).unwrap();

        let expenses = repo.get_by_budget(budget).unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].date, date(3));
    }

    #[test]
    fn test_occurrence_key_unique() {
        let (_temp_dir, repo) = create_test_repo();
        let budget = BudgetId::new();
        let rule = gym_rule();

        let first = Expense::from_rule(budget, &rule, date(6), "Recurring: ", UserId::new("a"));
        repo.insert(first.clone()).unwrap();

        let again = Expense::from_rule(budget, &rule, date(6), "Recurring: ", UserId::new("b"));
        assert!(repo.insert(again).unwrap_err().is_conflict());

        let found = repo.find_occurrence(&(budget, rule.id, date(6))).unwrap();
        assert_eq!(found.unwrap().id, first.id);
        assert_eq!(repo.get_by_rule(rule.id).unwrap().len(), 1);
    }

    #[test]
    fn test_manual_expenses_never_collide() {
        let (_temp_dir, repo) = create_test_repo();
        let budget = BudgetId::new();
        repo.insert(manual(budget, 6)).unwrap();
        repo.insert(manual(budget, 6)).unwrap();
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_delete_frees_occurrence() {
        let (_temp_dir, repo) = create_test_repo();
        let budget = BudgetId::new();
        let rule = gym_rule();
        let expense = Expense::from_rule(budget, &rule, date(13), "", UserId::new("a"));
        let id = expense.id;
        repo.insert(expense).unwrap();

        assert!(repo.delete(id).unwrap());
        assert!(repo
            .find_occurrence(&(budget, rule.id, date(13)))
            .unwrap()
            .is_none());
        assert!(repo.get_by_budget(budget).unwrap().is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let budget = BudgetId::new();
        let rule = gym_rule();
        repo.insert(Expense::from_rule(budget, &rule, date(20), "", UserId::new("a")))
            .unwrap();
        let mut writes = StagedWrites::new();
        repo.stage(&mut writes).unwrap();
        writes.publish().unwrap();

        let repo2 = ExpenseRepository::new(temp_dir.path().join("expenses.json"));
        repo2.load().unwrap();
        assert!(repo2
            .find_occurrence(&(budget, rule.id, date(20)))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_update_moves_between_budgets() {
        let (_temp, repo) = create_test_repo();
        let march = BudgetId::new();
        let april = BudgetId::new();
        let rule = gym_rule();
        let mut expense = Expense::from_rule(march, &rule, date(6), "", UserId::new("a"));
        repo.insert(expense.clone()).unwrap();

        expense.budget_id = april;
        repo.update(expense.clone()).unwrap();
        assert!(repo.get_by_budget(march).unwrap().is_empty());
        assert_eq!(repo.get_by_budget(april).unwrap().len(), 1);
        assert!(repo.find_occurrence(&(march, rule.id, date(6))).unwrap().is_none());
        assert!(repo.find_occurrence(&(april, rule.id, date(6))).unwrap().is_some());
    }

    #[test]
    fn test_update_conflict_keeps_previous() {
        let (_temp, repo) = create_test_repo();
        let budget = BudgetId::new();
        let rule = gym_rule();
        repo.insert(Expense::from_rule(budget, &rule, date(6), "", UserId::new("a")))
            .unwrap();
        let mut second = Expense::from_rule(budget, &rule, date(13), "", UserId::new("a"));
        repo.insert(second.clone()).unwrap();

        second.date = date(6);
        assert!(repo.update(second.clone()).unwrap_err().is_conflict());
        assert_eq!(repo.get(second.id).unwrap().unwrap().date, date(13));
        assert_eq!(repo.count().unwrap(), 2);

        let missing = Expense::from_rule(budget, &rule, date(20), "", UserId::new("a"));
        assert!(repo.update(missing).unwrap_err().is_not_found());
    }
}
