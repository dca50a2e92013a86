//! Expense CLI commands

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::format_expense_list;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{ExpenseId, UserId};
use crate::services::{ExpenseService, ExpenseUpdate, ManualExpense};
use crate::storage::Storage;

use super::{
    parse_amount, parse_date, parse_month, resolve_category, resolve_family, resolve_payment_type,
};

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// Family name or ID
        family: String,
        /// Amount (e.g. "12.50")
        amount: String,
        /// Category name or ID
        #[arg(short, long)]
        category: String,
        /// Subcategory name or ID
        #[arg(short, long)]
        subcategory: Option<String>,
        /// Payment type name or ID
        #[arg(short, long)]
        payment: String,
        /// Expense date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// List a month's expenses
    List {
        /// Family name or ID
        family: String,
        /// Month (YYYY-MM)
        month: String,
    },

    /// Edit an expense
    Edit {
        /// Family name or ID
        family: String,
        /// Expense ID
        expense: String,
        #[arg(short, long)]
        amount: Option<String>,
        /// Category name or ID
        #[arg(short, long)]
        category: Option<String>,
        /// Subcategory name or ID
        #[arg(short, long, conflicts_with = "clear_subcategory")]
        subcategory: Option<String>,
        /// Remove the subcategory
        #[arg(long)]
        clear_subcategory: bool,
        /// Payment type name or ID
        #[arg(short, long)]
        payment: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete an expense
    Delete {
        /// Family name or ID
        family: String,
        /// Expense ID
        expense: String,
    },
}

fn parse_expense_id(s: &str) -> BudgetResult<ExpenseId> {
    s.parse()
        .map_err(|_| BudgetError::Validation(format!("Invalid expense ID: {}", s)))
}

pub fn handle_expense_command(
    storage: &Storage,
    settings: &Settings,
    user: &UserId,
    cmd: ExpenseCommands,
) -> BudgetResult<()> {
    let service = ExpenseService::new(storage);

    match cmd {
        ExpenseCommands::Add {
            family,
            amount,
            category,
            subcategory,
            payment,
            date,
            description,
        } => {
            let family = resolve_family(storage, &family, user)?;
            let category = resolve_category(storage, &family, &category, None)?;
            let subcategory = subcategory
                .as_deref()
                .map(|s| resolve_category(storage, &family, s, Some(&category)))
                .transpose()?;
            let payment = resolve_payment_type(storage, &family, &payment)?;
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => chrono::Local::now().date_naive(),
            };

            let expense = service.add(
                ManualExpense {
                    family_id: family.id,
                    category_id: category.id,
                    subcategory_id: subcategory.map(|s| s.id),
                    payment_type_id: payment.id,
                    description,
                    amount: parse_amount(&amount)?,
                    date,
                },
                user,
            )?;
            println!(
                "Recorded {} on {}",
                expense.amount.format_with_symbol(&settings.currency_symbol),
                expense.date
            );
            println!("  ID: {}", expense.id);
        }

        ExpenseCommands::List { family, month } => {
            let family = resolve_family(storage, &family, user)?;
            let month = parse_month(&month)?;
            let expenses = service.list_month(family.id, month, user)?;
            print!("{}", format_expense_list(&expenses, &settings.currency_symbol));
        }

        ExpenseCommands::Edit {
            family,
            expense,
            amount,
            category,
            subcategory,
            clear_subcategory,
            payment,
            date,
            description,
        } => {
            let id = parse_expense_id(&expense)?;
            let amount = amount.as_deref().map(parse_amount).transpose()?;
            let date = date.as_deref().map(parse_date).transpose()?;
            let family = resolve_family(storage, &family, user)?;

            let current = service.get(family.id, id, user)?;
            let category = category
                .as_deref()
                .map(|c| resolve_category(storage, &family, c, None))
                .transpose()?;
            let subcategory_id = if clear_subcategory {
                Some(None)
            } else if let Some(sub) = subcategory.as_deref() {
                let parent = match &category {
                    Some(c) => c.clone(),
                    None => storage
                        .categories
                        .get_family_category(family.id, current.category_id)?
                        .ok_or_else(|| BudgetError::category_not_found(current.category_id.to_string()))?,
                };
                Some(Some(resolve_category(storage, &family, sub, Some(&parent))?.id))
            } else {
                None
            };
            let payment_type_id = payment
                .as_deref()
                .map(|p| resolve_payment_type(storage, &family, p).map(|p| p.id))
                .transpose()?;

            let updated = service.update(
                family.id,
                id,
                ExpenseUpdate {
                    category_id: category.map(|c| c.id),
                    subcategory_id,
                    payment_type_id,
                    description,
                    amount,
                    date,
                },
                user,
            )?;
            println!(
                "Updated expense: {} on {}",
                updated.amount.format_with_symbol(&settings.currency_symbol),
                updated.date
            );
        }

        ExpenseCommands::Delete { family, expense } => {
            let id = parse_expense_id(&expense)?;
            let family = resolve_family(storage, &family, user)?;
            let deleted = service.delete(family.id, id, user)?;
            println!("Deleted expense of {} on {}", deleted.amount, deleted.date);
        }
    }

    Ok(())
}
