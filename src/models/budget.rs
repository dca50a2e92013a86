//! Monthly budget model
//!
//! One budget exists per (family, month). It is created lazily the first
//! time anything touches that month.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{BudgetId, FamilyId};
use super::money::Money;
use super::month::BudgetMonth;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub family_id: FamilyId,
    pub month: BudgetMonth,

    /// Amount the family plans to spend this month
    #[serde(default)]
    pub planned_amount: Money,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Create a budget with zero planned amount
    pub fn new(family_id: FamilyId, month: BudgetMonth) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            family_id,
            month,
            planned_amount: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_planned(&mut self, amount: Money) {
        self.planned_amount = amount;
        self.updated_at = Utc::now();
    }

    /// Uniqueness key enforced by the budget store
    pub fn key(&self) -> (FamilyId, BudgetMonth) {
        (self.family_id, self.month)
    }
}
