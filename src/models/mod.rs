//! Core data models for family-budget
//!
//! This module contains the data structures of the household budgeting
//! domain: families, categories, monthly budgets, expenses, credits
//! and the recurring rules expenses are generated from.

pub mod budget;
pub mod category;
pub mod credit;
pub mod expense;
pub mod family;
pub mod ids;
pub mod money;
pub mod month;
pub mod recurring;

pub use budget::Budget;
pub use category::{Category, CategoryValidationError, PaymentType};
pub use credit::Credit;
pub use expense::{Expense, OccurrenceKey};
pub use family::Family;
pub use ids::{
    BudgetId, CategoryId, CreditId, ExpenseId, FamilyId, PaymentTypeId, RecurringRuleId, UserId,
};
pub use money::{Money, MoneyParseError};
pub use month::{BudgetMonth, MonthError};
pub use recurring::{
    weekday_from_index, NewRule, RecurrenceKind, RecurringRule, RuleValidationError, Schedule,
};
