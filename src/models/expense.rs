//! Expense model
//!
//! Expenses are either entered by hand or materialized from a recurring
//! rule. Materialized ones keep an explicit link back to the rule, which is
//! what generation uses to stay idempotent.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetId, CategoryId, ExpenseId, PaymentTypeId, RecurringRuleId, UserId};
use super::money::Money;
use super::recurring::RecurringRule;

/// Identity of a materialized occurrence: one expense per rule per date per budget
pub type OccurrenceKey = (BudgetId, RecurringRuleId, NaiveDate);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub budget_id: BudgetId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub subcategory_id: Option<CategoryId>,
    pub payment_type_id: PaymentTypeId,

    #[serde(default)]
    pub description: String,

    pub amount: Money,

    pub date: NaiveDate,

    /// Rule this expense was generated from (None for manual entries)
    #[serde(default)]
    pub recurring_rule_id: Option<RecurringRuleId>,

    pub created_by: UserId,
    pub updated_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Create a manual expense attributed to `user`
    pub fn new(
        budget_id: BudgetId,
        category_id: CategoryId,
        payment_type_id: PaymentTypeId,
        amount: Money,
        date: NaiveDate,
        user: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ExpenseId::new(),
            budget_id,
            category_id,
            subcategory_id: None,
            payment_type_id,
            description: String::new(),
            amount,
            date,
            recurring_rule_id: None,
            created_by: user.clone(),
            updated_by: user,
            created_at: now,
            updated_at: now,
        }
    }

    /// Materialize one occurrence of `rule` on `date`
    pub fn from_rule(
        budget_id: BudgetId,
        rule: &RecurringRule,
        date: NaiveDate,
        description_prefix: &str,
        user: UserId,
    ) -> Self {
        let mut expense = Self::new(
            budget_id,
            rule.category_id,
            rule.payment_type_id,
            rule.amount,
            date,
            user,
        );
        expense.subcategory_id = rule.subcategory_id;
        expense.description = format!("{}{}", description_prefix, rule.description);
        expense.recurring_rule_id = Some(rule.id);
        expense
    }

    /// Record `user` as the latest editor
    pub fn touch(&mut self, user: UserId) {
        self.updated_by = user;
        self.updated_at = Utc::now();
    }

    pub fn is_generated(&self) -> bool {
        self.recurring_rule_id.is_some()
    }

    pub fn occurrence_key(&self) -> Option<OccurrenceKey> {
        self.recurring_rule_id
            .map(|rule_id| (self.budget_id, rule_id, self.date))
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.date, self.amount, self.description)
    }
}
