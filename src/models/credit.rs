//! Credit model
//!
//! Money coming back into a month (refunds, reimbursements). Credits belong
//! to a budget like expenses do but carry no category.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{BudgetId, CreditId, UserId};
use super::money::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credit {
    pub id: CreditId,
    pub budget_id: BudgetId,

    #[serde(default)]
    pub description: String,

    pub amount: Money,

    pub date: NaiveDate,

    pub created_by: UserId,
    pub updated_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credit {
    pub fn new(
        budget_id: BudgetId,
        description: impl Into<String>,
        amount: Money,
        date: NaiveDate,
        user: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CreditId::new(),
            budget_id,
            description: description.into(),
            amount,
            date,
            created_by: user.clone(),
            updated_by: user,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record `user` as the latest editor
    pub fn touch(&mut self, user: UserId) {
        self.updated_by = user;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_touch() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let mut credit = Credit::new(
            BudgetId::new(),
            "Tax refund",
            Money::from_cents(12_000),
            date,
            UserId::new("alice"),
        );
        assert_eq!(credit.created_by, credit.updated_by);

        credit.touch(UserId::new("bob"));
        assert_eq!(credit.updated_by, UserId::new("bob"));
        assert_eq!(credit.created_by, UserId::new("alice"));
        assert!(credit.updated_at >= credit.created_at);
    }
}
