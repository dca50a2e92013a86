//! CLI command handlers
//!
//! Bridges clap argument parsing with the service layer. Every handler acts
//! on behalf of the user given by `--user` / `FAMILY_BUDGET_USER`.

pub mod budget;
pub mod category;
pub mod credit;
pub mod expense;
pub mod family;
pub mod generate;
pub mod rule;

pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use credit::{handle_credit_command, CreditCommands};
pub use expense::{handle_expense_command, ExpenseCommands};
pub use family::{handle_family_command, FamilyCommands};
pub use generate::{handle_generate_command, GenerateArgs};
pub use rule::{handle_rule_command, RuleCommands};

use chrono::NaiveDate;

use crate::error::{BudgetError, BudgetResult};
use crate::models::{BudgetMonth, Category, Family, Money, PaymentType, UserId};
use crate::services::{CategoryService, FamilyService};
use crate::storage::Storage;

/// Parse "YYYY-MM" into a raw (year, month) pair without range checks
pub fn parse_year_month(s: &str) -> BudgetResult<(i32, u32)> {
    let invalid = || BudgetError::Validation(format!("Invalid month '{}' (expected YYYY-MM)", s));
    let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
    let year = year.parse().map_err(|_| invalid())?;
    let month = month.parse().map_err(|_| invalid())?;
    Ok((year, month))
}

pub fn parse_month(s: &str) -> BudgetResult<BudgetMonth> {
    let (year, month) = parse_year_month(s)?;
    BudgetMonth::new(year, month).map_err(|_| BudgetError::InvalidMonth { year, month })
}

pub fn parse_date(s: &str) -> BudgetResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
        BudgetError::Validation(format!("Invalid date '{}': {} (expected YYYY-MM-DD)", s, e))
    })
}

pub fn parse_amount(s: &str) -> BudgetResult<Money> {
    Money::parse(s).map_err(|e| BudgetError::Validation(format!("Invalid amount: {}", e)))
}

/// Parse a weekday as 0..=6 (0 = Monday) or a name such as "wed"
pub fn parse_weekday(s: &str) -> BudgetResult<u8> {
    if let Ok(index) = s.trim().parse::<u8>() {
        return Ok(index);
    }
    s.trim()
        .parse::<chrono::Weekday>()
        .map(|w| w.num_days_from_monday() as u8)
        .map_err(|_| BudgetError::Validation(format!("Invalid day of week: {}", s)))
}

pub(crate) fn resolve_family(storage: &Storage, identifier: &str, user: &UserId) -> BudgetResult<Family> {
    FamilyService::new(storage).resolve_for(identifier, user)
}

pub(crate) fn resolve_category(
    storage: &Storage,
    family: &Family,
    identifier: &str,
    parent: Option<&Category>,
) -> BudgetResult<Category> {
    CategoryService::new(storage)
        .find_category(family.id, identifier, parent.map(|p| p.id))?
        .ok_or_else(|| BudgetError::category_not_found(identifier))
}

pub(crate) fn resolve_payment_type(
    storage: &Storage,
    family: &Family,
    identifier: &str,
) -> BudgetResult<PaymentType> {
    CategoryService::new(storage)
        .find_payment_type(family.id, identifier)?
        .ok_or_else(|| BudgetError::NotFound {
            entity_type: "Payment type",
            identifier: identifier.to_string(),
        })
}
