//! Credit repository for JSON storage
//!
//! Manages credits.json, indexed by budget for monthly listings.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::BudgetError;
use crate::models::{BudgetId, Credit, CreditId};

use super::file_io::{read_json, StagedWrites};
use super::{read_lock, write_lock};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct CreditData {
    #[serde(default)]
    credits: Vec<Credit>,
}

/// Repository for credit persistence
pub struct CreditRepository {
    path: PathBuf,
    data: RwLock<HashMap<CreditId, Credit>>,
}

impl CreditRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load credits from disk
    pub fn load(&self) -> Result<(), BudgetError> {
        let file_data: CreditData = read_json(&self.path)?;
        self.replace_all(file_data.credits)
    }

    /// Stage credits for the next publish
    pub fn stage(&self, writes: &mut StagedWrites) -> Result<(), BudgetError> {
        let mut credits = self.get_all()?;
        credits.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        writes.stage(&self.path, &CreditData { credits })
    }

    pub(crate) fn replace_all(&self, credits: Vec<Credit>) -> Result<(), BudgetError> {
        let mut data = write_lock(&self.data)?;
        data.clear();
        data.extend(credits.into_iter().map(|c| (c.id, c)));
        Ok(())
    }

    pub fn get(&self, id: CreditId) -> Result<Option<Credit>, BudgetError> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    pub fn get_all(&self) -> Result<Vec<Credit>, BudgetError> {
        Ok(read_lock(&self.data)?.values().cloned().collect())
    }

    /// Credits of a budget, by date
    pub fn get_by_budget(&self, budget_id: BudgetId) -> Result<Vec<Credit>, BudgetError> {
        let mut credits: Vec<_> = read_lock(&self.data)?
            .values()
            .filter(|c| c.budget_id == budget_id)
            .cloned()
            .collect();
        credits.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(credits)
    }

    /// Insert or replace a credit
    pub fn upsert(&self, credit: Credit) -> Result<(), BudgetError> {
        write_lock(&self.data)?.insert(credit.id, credit);
        Ok(())
    }

    pub fn delete(&self, id: CreditId) -> Result<bool, BudgetError> {
        Ok(write_lock(&self.data)?.remove(&id).is_some())
    }

    pub fn count(&self) -> Result<usize, BudgetError> {
        Ok(read_lock(&self.data)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, UserId};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, CreditRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = CreditRepository::new(temp_dir.path().join("credits.json"));
        (temp_dir, repo)
    }

    fn refund(budget: BudgetId, day: u32) -> Credit {
        Credit::new(
            budget,
            "Refund",
            Money::from_cents(2_500),
            NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            UserId::new("alice"),
        )
    }

    #[test]
    fn test_get_by_budget_sorted() {
        let (_temp, repo) = create_test_repo();
        let budget = BudgetId::new();
        repo.upsert(refund(budget, 20)).unwrap();
        repo.upsert(refund(budget, 3)).unwrap();
        repo.upsert(refund(BudgetId::new(), 1)).unwrap();

        let credits = repo.get_by_budget(budget).unwrap();
        assert_eq!(credits.len(), 2);
        assert_eq!(credits[0].date.format("%d").to_string(), "03");
    }

    #[test]
    fn test_delete() {
        let (_temp, repo) = create_test_repo();
        let credit = refund(BudgetId::new(), 5);
        repo.upsert(credit.clone()).unwrap();
        assert!(repo.delete(credit.id).unwrap());
        assert!(!repo.delete(credit.id).unwrap());
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let credit = refund(BudgetId::new(), 5);
        repo.upsert(credit.clone()).unwrap();
        let mut writes = StagedWrites::new();
        repo.stage(&mut writes).unwrap();
        writes.publish().unwrap();

        let repo2 = CreditRepository::new(temp_dir.path().join("credits.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.get(credit.id).unwrap().unwrap().amount.cents(), 2_500);
    }
}
