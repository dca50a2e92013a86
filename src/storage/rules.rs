//! Recurring rule repository for JSON storage
//!
//! Manages loading and saving recurring expense rules to recurring_rules.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::BudgetError;
use crate::models::{FamilyId, RecurringRule, RecurringRuleId};

use super::file_io::{read_json, StagedWrites};
use super::{read_lock, write_lock};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct RuleData {
    #[serde(default)]
    rules: Vec<RecurringRule>,
}

/// Repository for recurring rule persistence
pub struct RuleRepository {
    path: PathBuf,
    data: RwLock<HashMap<RecurringRuleId, RecurringRule>>,
}

impl RuleRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load rules from disk
    pub fn load(&self) -> Result<(), BudgetError> {
        let file_data: RuleData = read_json(&self.path)?;
        self.replace_all(file_data.rules)
    }

    /// Stage rules for the next publish
    pub fn stage(&self, writes: &mut StagedWrites) -> Result<(), BudgetError> {
        let file_data = RuleData {
            rules: self.get_all()?,
        };
        writes.stage(&self.path, &file_data)
    }

    pub(crate) fn replace_all(&self, rules: Vec<RecurringRule>) -> Result<(), BudgetError> {
        let mut data = write_lock(&self.data)?;
        data.clear();
        data.extend(rules.into_iter().map(|r| (r.id, r)));
        Ok(())
    }

    pub fn get(&self, id: RecurringRuleId) -> Result<Option<RecurringRule>, BudgetError> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// All rules, oldest first
    pub fn get_all(&self) -> Result<Vec<RecurringRule>, BudgetError> {
        let data = read_lock(&self.data)?;
        let mut rules: Vec<_> = data.values().cloned().collect();
        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rules)
    }

    /// Rules of a family, oldest first so generation order is stable
    pub fn for_family(&self, family_id: FamilyId) -> Result<Vec<RecurringRule>, BudgetError> {
        let mut rules = self.get_all()?;
        rules.retain(|r| r.family_id == family_id);
        Ok(rules)
    }

    /// Insert or update a rule
    pub fn upsert(&self, rule: RecurringRule) -> Result<(), BudgetError> {
        write_lock(&self.data)?.insert(rule.id, rule);
        Ok(())
    }

    pub fn delete(&self, id: RecurringRuleId) -> Result<bool, BudgetError> {
        Ok(write_lock(&self.data)?.remove(&id).is_some())
    }

    pub fn count(&self) -> Result<usize, BudgetError> {
        Ok(read_lock(&self.data)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, Money, NewRule, PaymentTypeId, UserId};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, RuleRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = RuleRepository::new(temp_dir.path().join("recurring_rules.json"));
        (temp_dir, repo)
    }

    fn rule(family: FamilyId, description: &str) -> RecurringRule {
        RecurringRule::new(
            NewRule::monthly(
                family,
                CategoryId::new(),
                PaymentTypeId::new(),
                description,
                Money::from_cents(1000),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                1,
            ),
            UserId::new("alice"),
        )
    }

    #[test]
    fn test_for_family_filters() {
        let (_temp_dir, repo) = create_test_repo();
        let mine = FamilyId::new();
        repo.upsert(rule(mine, "Rent")).unwrap();
        repo.upsert(rule(mine, "Internet")).unwrap();
        repo.upsert(rule(FamilyId::new(), "Other")).unwrap();

        assert_eq!(repo.for_family(mine).unwrap().len(), 2);
        assert_eq!(repo.count().unwrap(), 3);
    }

    #[test]
    fn test_upsert_and_delete() {
        let (_temp_dir, repo) = create_test_repo();
        let mut r = rule(FamilyId::new(), "Rent");
        repo.upsert(r.clone()).unwrap();

        r.amount = Money::from_cents(2000);
        repo.upsert(r.clone()).unwrap();
        assert_eq!(repo.get(r.id).unwrap().unwrap().amount.cents(), 2000);
        assert_eq!(repo.count().unwrap(), 1);

        assert!(repo.delete(r.id).unwrap());
        assert!(!repo.delete(r.id).unwrap());
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let family = FamilyId::new();
        let r = rule(family, "Rent");
        repo.upsert(r.clone()).unwrap();
        let mut writes = StagedWrites::new();
        repo.stage(&mut writes).unwrap();
        writes.publish().unwrap();

        let repo2 = RuleRepository::new(temp_dir.path().join("recurring_rules.json"));
        repo2.load().unwrap();
        let loaded = repo2.get(r.id).unwrap().unwrap();
        assert_eq!(loaded.day_of_month, Some(1));
        assert_eq!(loaded.description, "Rent");
    }
}
