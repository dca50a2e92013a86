//! Budget service
//!
//! Monthly budgets are created lazily. Manual expenses, credits and
//! recurring generation all go through [`BudgetService::get_or_create_in`],
//! which relies on the store's (family, month) uniqueness: the insert is
//! attempted first, and a conflict means the budget exists, so it is
//! reloaded instead of failing.

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Budget, BudgetMonth, FamilyId, Money, UserId};
use crate::storage::{Storage, UnitOfWork};

use super::membership::{ensure_member, Membership};

/// Service for monthly budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
    membership: &'a dyn Membership,
}

/// A budget together with what has been spent and credited against it
#[derive(Debug, Clone)]
pub struct BudgetSummary {
    pub budget: Budget,
    pub spent: Money,
    pub credited: Money,
    /// Planned amount minus spending plus credits
    pub remaining: Money,
    pub generated: usize,
    pub manual: usize,
    pub credits: usize,
}

/// Validate a raw (year, month) pair
pub fn target_month(year: i32, month: u32) -> BudgetResult<BudgetMonth> {
    BudgetMonth::new(year, month).map_err(|_| BudgetError::InvalidMonth { year, month })
}

impl<'a> BudgetService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self::with_membership(storage, &storage.families)
    }

    pub fn with_membership(storage: &'a Storage, membership: &'a dyn Membership) -> Self {
        Self {
            storage,
            membership,
        }
    }

    /// Get the family's budget for a month, creating it if absent
    pub fn get_or_create(
        &self,
        family_id: FamilyId,
        year: i32,
        month: u32,
        user: &UserId,
    ) -> BudgetResult<Budget> {
        let month = target_month(year, month)?;
        ensure_member(self.membership, family_id, user)?;

        let mut uow = self.storage.begin(user)?;
        let budget = Self::get_or_create_in(&mut uow, family_id, month)?;
        uow.commit()?;
        Ok(budget)
    }

    /// Get-or-create inside an open unit of work
    ///
    /// A newly created budget has a zero planned amount and is only
    /// persisted when the unit of work commits.
    pub fn get_or_create_in(
        uow: &mut UnitOfWork<'_>,
        family_id: FamilyId,
        month: BudgetMonth,
    ) -> BudgetResult<Budget> {
        let budgets = &uow.storage().budgets;
        let budget = Budget::new(family_id, month);
        match budgets.insert(budget.clone()) {
            Ok(()) => {
                tracing::info!(family = %family_id, month = %month, "created budget");
                uow.log_create(EntityType::Budget, budget.id, month.to_string(), &budget);
                Ok(budget)
            }
            Err(err) if err.is_conflict() => {
                tracing::trace!(family = %family_id, month = %month, "budget already exists, reloading");
                budgets.find(family_id, month)?.ok_or_else(|| {
                    BudgetError::Storage(format!("Budget for {} vanished after conflict", month))
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Set the planned amount for a month, creating the budget if needed
    pub fn set_planned(
        &self,
        family_id: FamilyId,
        month: BudgetMonth,
        amount: Money,
        user: &UserId,
    ) -> BudgetResult<Budget> {
        ensure_member(self.membership, family_id, user)?;
        if amount.is_negative() {
            return Err(BudgetError::Validation(
                "Planned amount cannot be negative".into(),
            ));
        }

        let mut uow = self.storage.begin(user)?;
        let mut budget = Self::get_or_create_in(&mut uow, family_id, month)?;
        let before = budget.clone();
        budget.set_planned(amount);
        uow.storage().budgets.update(budget.clone())?;
        uow.log_update(EntityType::Budget, budget.id, month.to_string(), &before, &budget);
        uow.commit()?;

        Ok(budget)
    }

    /// The budget for a month with spending totals, if it exists
    pub fn summary(
        &self,
        family_id: FamilyId,
        month: BudgetMonth,
        user: &UserId,
    ) -> BudgetResult<Option<BudgetSummary>> {
        ensure_member(self.membership, family_id, user)?;

        let Some(budget) = self.storage.budgets.find(family_id, month)? else {
            return Ok(None);
        };
        let expenses = self.storage.expenses.get_by_budget(budget.id)?;
        let credits = self.storage.credits.get_by_budget(budget.id)?;
        let generated = expenses.iter().filter(|e| e.is_generated()).count();

        let overflow = || {
            BudgetError::Validation(format!("Totals for {} exceed the representable amount", month))
        };
        let spent = Money::checked_sum(expenses.iter().map(|e| e.amount)).ok_or_else(overflow)?;
        let credited = Money::checked_sum(credits.iter().map(|c| c.amount)).ok_or_else(overflow)?;
        let remaining = budget
            .planned_amount
            .checked_sub(spent)
            .and_then(|m| m.checked_add(credited))
            .ok_or_else(overflow)?;

        Ok(Some(BudgetSummary {
            spent,
            credited,
            remaining,
            generated,
            manual: expenses.len() - generated,
            credits: credits.len(),
            budget,
        }))
    }

    /// All budgets of a family, oldest month first
    pub fn list(&self, family_id: FamilyId, user: &UserId) -> BudgetResult<Vec<Budget>> {
        ensure_member(self.membership, family_id, user)?;
        self.storage.budgets.for_family(family_id)
    }
}
