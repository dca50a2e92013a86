//! Turns rule occurrences into expense records
//!
//! An occurrence is identified by (budget, rule, date). The expense store
//! keeps that key unique, so materializing the same occurrence twice inserts
//! one expense and reports "already generated" the second time.

use chrono::NaiveDate;

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{BudgetId, Expense, RecurringRule};
use crate::storage::UnitOfWork;

/// Inserts generated expenses inside a unit of work
pub struct Materializer<'p> {
    prefix: &'p str,
}

impl<'p> Materializer<'p> {
    /// `prefix` is put in front of the rule's description
    pub fn new(prefix: &'p str) -> Self {
        Self { prefix }
    }

    /// Ensure exactly one expense exists for `rule` on `date` in `budget_id`
    ///
    /// Returns `true` if an expense was inserted. The unit of work's actor is
    /// recorded as creator and updater.
    pub fn materialize(
        &self,
        uow: &mut UnitOfWork<'_>,
        budget_id: BudgetId,
        rule: &RecurringRule,
        date: NaiveDate,
    ) -> BudgetResult<bool> {
        let storage = uow.storage();
        let key = (budget_id, rule.id, date);
        if storage.expenses.find_occurrence(&key)?.is_some() {
            tracing::trace!(rule = %rule.id, %date, "occurrence already generated");
            return Ok(false);
        }

        let budget = storage.budgets.get(budget_id)?.ok_or_else(|| BudgetError::NotFound {
            entity_type: "Budget",
            identifier: budget_id.to_string(),
        })?;
        if budget.family_id != rule.family_id || !budget.month.contains(date) {
            return Err(BudgetError::Validation(format!(
                "Occurrence {} of rule {} does not belong to budget {}",
                date, rule.id, budget.month
            )));
        }

        let expense = Expense::from_rule(budget_id, rule, date, self.prefix, uow.actor().clone());
        match storage.expenses.insert(expense.clone()) {
            Ok(()) => {}
            Err(err) if err.is_conflict() => return Ok(false),
            Err(err) => return Err(err),
        }

        tracing::debug!(rule = %rule.id, %date, amount = %expense.amount, "materialized expense");
        uow.log_create(EntityType::Expense, expense.id, &expense.description, &expense);
        Ok(true)
    }
}
