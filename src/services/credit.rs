//! Credit service
//!
//! Refunds and reimbursements. Like expenses, the first credit of a month
//! creates that month's budget.

use chrono::NaiveDate;

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{BudgetMonth, Credit, CreditId, FamilyId, Money, UserId};
use crate::storage::{Storage, UnitOfWork};

use super::budget::BudgetService;
use super::membership::{ensure_member, Membership};

#[derive(Debug, Clone)]
pub struct NewCredit {
    pub family_id: FamilyId,
    pub description: String,
    pub amount: Money,
    pub date: NaiveDate,
}

/// Changes to an existing credit; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct CreditUpdate {
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub date: Option<NaiveDate>,
}

pub struct CreditService<'a> {
    storage: &'a Storage,
    membership: &'a dyn Membership,
}

impl<'a> CreditService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            membership: &storage.families,
        }
    }

    /// Record a credit, creating the month's budget if needed
    pub fn add(&self, input: NewCredit, user: &UserId) -> BudgetResult<Credit> {
        ensure_member(self.membership, input.family_id, user)?;
        check_amount(input.amount)?;

        let mut uow = self.storage.begin(user)?;
        let month = BudgetMonth::containing(input.date);
        let budget = BudgetService::get_or_create_in(&mut uow, input.family_id, month)?;

        let credit = Credit::new(
            budget.id,
            input.description.trim(),
            input.amount,
            input.date,
            user.clone(),
        );
        uow.storage().credits.upsert(credit.clone())?;
        uow.log_create(EntityType::Credit, credit.id, &credit.description, &credit);
        uow.commit()?;

        tracing::debug!(credit = %credit.id, %month, "credit recorded");
        Ok(credit)
    }

    pub fn update(
        &self,
        family_id: FamilyId,
        id: CreditId,
        changes: CreditUpdate,
        user: &UserId,
    ) -> BudgetResult<Credit> {
        ensure_member(self.membership, family_id, user)?;

        let mut uow = self.storage.begin(user)?;
        let before = Self::family_credit(&uow, family_id, id)?;

        let mut credit = before.clone();
        if let Some(description) = changes.description {
            credit.description = description.trim().to_string();
        }
        if let Some(amount) = changes.amount {
            check_amount(amount)?;
            credit.amount = amount;
        }
        if let Some(date) = changes.date {
            let month = BudgetMonth::containing(date);
            if month != BudgetMonth::containing(before.date) {
                credit.budget_id = BudgetService::get_or_create_in(&mut uow, family_id, month)?.id;
            }
            credit.date = date;
        }

        credit.touch(user.clone());
        uow.storage().credits.upsert(credit.clone())?;
        uow.log_update(
            EntityType::Credit,
            credit.id,
            &credit.description,
            &before,
            &credit,
        );
        uow.commit()?;

        Ok(credit)
    }

    pub fn delete(&self, family_id: FamilyId, id: CreditId, user: &UserId) -> BudgetResult<Credit> {
        ensure_member(self.membership, family_id, user)?;

        let mut uow = self.storage.begin(user)?;
        let credit = Self::family_credit(&uow, family_id, id)?;
        uow.storage().credits.delete(id)?;
        uow.log_delete(EntityType::Credit, id, &credit.description, &credit);
        uow.commit()?;

        Ok(credit)
    }

    /// Credits of a family's month, by date; empty if the month has no budget
    pub fn list_month(
        &self,
        family_id: FamilyId,
        month: BudgetMonth,
        user: &UserId,
    ) -> BudgetResult<Vec<Credit>> {
        ensure_member(self.membership, family_id, user)?;
        match self.storage.budgets.find(family_id, month)? {
            Some(budget) => self.storage.credits.get_by_budget(budget.id),
            None => Ok(Vec::new()),
        }
    }

    fn family_credit(
        uow: &UnitOfWork<'_>,
        family_id: FamilyId,
        id: CreditId,
    ) -> BudgetResult<Credit> {
        let storage = uow.storage();
        let not_found = || BudgetError::NotFound {
            entity_type: "Credit",
            identifier: id.to_string(),
        };
        let credit = storage.credits.get(id)?.ok_or_else(not_found)?;
        storage
            .budgets
            .get(credit.budget_id)?
            .filter(|b| b.family_id == family_id)
            .ok_or_else(not_found)?;
        Ok(credit)
    }
}

fn check_amount(amount: Money) -> BudgetResult<()> {
    if amount.is_negative() {
        return Err(BudgetError::Validation("Amount cannot be negative".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Fixture;

    fn refund(fx: &Fixture, month: u32, day: u32) -> NewCredit {
        NewCredit {
            family_id: fx.family.id,
            description: " Returned shoes ".into(),
            amount: Money::from_cents(4_999),
            date: NaiveDate::from_ymd_opt(2024, month, day).unwrap(),
        }
    }

    #[test]
    fn test_add_creates_budget_lazily() {
        let fx = Fixture::new();
        let service = CreditService::new(&fx.storage);
        assert_eq!(fx.storage.budgets.count().unwrap(), 0);

        let credit = service.add(refund(&fx, 8, 14), &fx.alice).unwrap();
        assert_eq!(credit.description, "Returned shoes");

        let august = BudgetMonth::new(2024, 8).unwrap();
        let budget = fx.storage.budgets.find(fx.family.id, august).unwrap().unwrap();
        assert_eq!(credit.budget_id, budget.id);

        service.add(refund(&fx, 8, 20), &fx.alice).unwrap();
        assert_eq!(fx.storage.budgets.count().unwrap(), 1);
        assert_eq!(service.list_month(fx.family.id, august, &fx.alice).unwrap().len(), 2);
    }

    #[test]
    fn test_add_rejects_outsider_and_negative_amount() {
        let fx = Fixture::new();
        let service = CreditService::new(&fx.storage);

        assert!(service
            .add(refund(&fx, 8, 14), &fx.bob)
            .unwrap_err()
            .is_unauthorized());

        let mut input = refund(&fx, 8, 14);
        input.amount = Money::from_cents(-100);
        assert!(service.add(input, &fx.alice).unwrap_err().is_validation());
        assert_eq!(fx.storage.budgets.count().unwrap(), 0);
        assert_eq!(fx.storage.credits.count().unwrap(), 0);
    }

    #[test]
    fn test_update_moves_to_other_month() {
        let fx = Fixture::new();
        let service = CreditService::new(&fx.storage);
        let credit = service.add(refund(&fx, 8, 31), &fx.alice).unwrap();

        let moved = service
            .update(
                fx.family.id,
                credit.id,
                CreditUpdate {
                    amount: Some(Money::from_cents(5_000)),
                    date: Some(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()),
                    ..Default::default()
                },
                &fx.alice,
            )
            .unwrap();
        assert_eq!(moved.amount.cents(), 5_000);
        assert_ne!(moved.budget_id, credit.budget_id);

        let september = BudgetMonth::new(2024, 9).unwrap();
        let listed = service.list_month(fx.family.id, september, &fx.alice).unwrap();
        assert_eq!(listed.len(), 1);
        assert!(service
            .list_month(fx.family.id, september.prev(), &fx.alice)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_checks_family() {
        let fx = Fixture::new();
        let service = CreditService::new(&fx.storage);
        let credit = service.add(refund(&fx, 8, 14), &fx.alice).unwrap();

        let other = fx.other_family();
        assert!(service
            .delete(other.id, credit.id, &fx.bob)
            .unwrap_err()
            .is_not_found());

        service.delete(fx.family.id, credit.id, &fx.alice).unwrap();
        assert_eq!(fx.storage.credits.count().unwrap(), 0);
    }
}
