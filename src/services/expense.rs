//! Expense service
//!
//! Manual expense entry and editing. Entering the first expense of a month
//! creates the month's budget, the same way recurring generation does.

use chrono::NaiveDate;

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    BudgetMonth, CategoryId, Expense, ExpenseId, FamilyId, Money, PaymentTypeId, UserId,
};
use crate::storage::Storage;

use super::budget::BudgetService;
use super::category::CategoryService;
use super::membership::{ensure_member, Membership};

/// Input for a manually entered expense
#[derive(Debug, Clone)]
pub struct ManualExpense {
    pub family_id: FamilyId,
    pub category_id: CategoryId,
    pub subcategory_id: Option<CategoryId>,
    pub payment_type_id: PaymentTypeId,
    pub description: String,
    pub amount: Money,
    pub date: NaiveDate,
}

/// Changes to an existing expense; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub category_id: Option<CategoryId>,
    /// `Some(None)` clears the subcategory
    pub subcategory_id: Option<Option<CategoryId>>,
    pub payment_type_id: Option<PaymentTypeId>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub date: Option<NaiveDate>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.subcategory_id.is_none()
            && self.payment_type_id.is_none()
            && self.description.is_none()
            && self.amount.is_none()
            && self.date.is_none()
    }
}

/// Service for expense management
pub struct ExpenseService<'a> {
    storage: &'a Storage,
    membership: &'a dyn Membership,
}

impl<'a> ExpenseService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            membership: &storage.families,
        }
    }

    /// Record an expense, creating the month's budget if needed
    pub fn add(&self, input: ManualExpense, user: &UserId) -> BudgetResult<Expense> {
        ensure_member(self.membership, input.family_id, user)?;
        if input.amount.is_negative() {
            return Err(BudgetError::Validation("Amount cannot be negative".into()));
        }

        let mut uow = self.storage.begin(user)?;
        CategoryService::new(self.storage).check_references(
            input.family_id,
            input.category_id,
            input.subcategory_id,
            input.payment_type_id,
        )?;
        let month = BudgetMonth::containing(input.date);
        let budget = BudgetService::get_or_create_in(&mut uow, input.family_id, month)?;

        let mut expense = Expense::new(
            budget.id,
            input.category_id,
            input.payment_type_id,
            input.amount,
            input.date,
            user.clone(),
        );
        expense.subcategory_id = input.subcategory_id;
        expense.description = input.description.trim().to_string();

        uow.storage().expenses.insert(expense.clone())?;
        uow.log_create(EntityType::Expense, expense.id, &expense.description, &expense);
        uow.commit()?;

        Ok(expense)
    }

    /// Apply `changes` to an expense of the family
    ///
    /// Moving a manual expense to a date in another month moves it to that
    /// month's budget, creating it if needed. Generated expenses keep their
    /// date: it is part of their occurrence identity.
    pub fn update(
        &self,
        family_id: FamilyId,
        id: ExpenseId,
        changes: ExpenseUpdate,
        user: &UserId,
    ) -> BudgetResult<Expense> {
        ensure_member(self.membership, family_id, user)?;

        let mut uow = self.storage.begin(user)?;
        let before = Self::family_expense(uow.storage(), family_id, id)?;
        if changes.is_empty() {
            return Ok(before);
        }

        let mut expense = before.clone();
        if let Some(category_id) = changes.category_id {
            if category_id != expense.category_id && changes.subcategory_id.is_none() {
                expense.subcategory_id = None;
            }
            expense.category_id = category_id;
        }
        if let Some(subcategory_id) = changes.subcategory_id {
            expense.subcategory_id = subcategory_id;
        }
        if let Some(payment_type_id) = changes.payment_type_id {
            expense.payment_type_id = payment_type_id;
        }
        if let Some(description) = changes.description {
            expense.description = description.trim().to_string();
        }
        if let Some(amount) = changes.amount {
            if amount.is_negative() {
                return Err(BudgetError::Validation("Amount cannot be negative".into()));
            }
            expense.amount = amount;
        }
        CategoryService::new(self.storage).check_references(
            family_id,
            expense.category_id,
            expense.subcategory_id,
            expense.payment_type_id,
        )?;

        if let Some(date) = changes.date.filter(|d| *d != before.date) {
            if expense.is_generated() {
                return Err(BudgetError::Validation(
                    "The date of a generated expense cannot be changed".into(),
                ));
            }
            let month = BudgetMonth::containing(date);
            if month != BudgetMonth::containing(before.date) {
                let budget = BudgetService::get_or_create_in(&mut uow, family_id, month)?;
                expense.budget_id = budget.id;
            }
            expense.date = date;
        }

        expense.touch(user.clone());
        uow.storage().expenses.update(expense.clone())?;
        uow.log_update(
            EntityType::Expense,
            expense.id,
            &expense.description,
            &before,
            &expense,
        );
        uow.commit()?;

        Ok(expense)
    }

    /// Expenses of a family's month, by date; empty if the month has no budget
    pub fn list_month(
        &self,
        family_id: FamilyId,
        month: BudgetMonth,
        user: &UserId,
    ) -> BudgetResult<Vec<Expense>> {
        ensure_member(self.membership, family_id, user)?;
        match self.storage.budgets.find(family_id, month)? {
            Some(budget) => self.storage.expenses.get_by_budget(budget.id),
            None => Ok(Vec::new()),
        }
    }

    pub fn get(&self, family_id: FamilyId, id: ExpenseId, user: &UserId) -> BudgetResult<Expense> {
        ensure_member(self.membership, family_id, user)?;
        Self::family_expense(self.storage, family_id, id)
    }

    /// Delete an expense of the family
    pub fn delete(&self, family_id: FamilyId, id: ExpenseId, user: &UserId) -> BudgetResult<Expense> {
        ensure_member(self.membership, family_id, user)?;

        let mut uow = self.storage.begin(user)?;
        let expense = Self::family_expense(uow.storage(), family_id, id)?;
        uow.storage().expenses.delete(id)?;
        uow.log_delete(
            EntityType::Expense,
            id,
            BudgetMonth::containing(expense.date).to_string(),
            &expense,
        );
        uow.commit()?;

        Ok(expense)
    }

    /// The expense `id`, if its budget belongs to `family_id`
    fn family_expense(storage: &Storage, family_id: FamilyId, id: ExpenseId) -> BudgetResult<Expense> {
        let not_found = || BudgetError::NotFound {
            entity_type: "Expense",
            identifier: id.to_string(),
        };
        let expense = storage.expenses.get(id)?.ok_or_else(not_found)?;
        storage
            .budgets
            .get(expense.budget_id)?
            .filter(|b| b.family_id == family_id)
            .ok_or_else(not_found)?;
        Ok(expense)
    }
}
