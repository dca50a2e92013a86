//! Budget CLI commands

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::format_budget_summary;
use crate::error::BudgetResult;
use crate::models::UserId;
use crate::services::BudgetService;
use crate::storage::Storage;

use super::{parse_amount, parse_month, resolve_family};

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Show planned vs. spent for a month
    Show {
        /// Family name or ID
        family: String,
        /// Month (YYYY-MM)
        month: String,
    },

    /// Set the planned amount for a month
    Set {
        /// Family name or ID
        family: String,
        /// Month (YYYY-MM)
        month: String,
        /// Planned amount (e.g. "2500")
        amount: String,
    },

    /// List all months that have a budget
    List {
        /// Family name or ID
        family: String,
    },
}

pub fn handle_budget_command(
    storage: &Storage,
    settings: &Settings,
    user: &UserId,
    cmd: BudgetCommands,
) -> BudgetResult<()> {
    let service = BudgetService::new(storage);
    let currency = settings.currency_symbol.as_str();

    match cmd {
        BudgetCommands::Show { family, month } => {
            let family = resolve_family(storage, &family, user)?;
            let month = parse_month(&month)?;
            match service.summary(family.id, month, user)? {
                Some(summary) => print!("{}", format_budget_summary(&summary, currency)),
                None => println!("No budget for {} yet.", month),
            }
        }

        BudgetCommands::Set {
            family,
            month,
            amount,
        } => {
            let family = resolve_family(storage, &family, user)?;
            let month = parse_month(&month)?;
            let budget = service.set_planned(family.id, month, parse_amount(&amount)?, user)?;
            println!(
                "Planned {} for {}",
                budget.planned_amount.format_with_symbol(currency),
                budget.month
            );
        }

        BudgetCommands::List { family } => {
            let family = resolve_family(storage, &family, user)?;
            let budgets = service.list(family.id, user)?;
            if budgets.is_empty() {
                println!("No budgets yet.");
            }
            for budget in budgets {
                println!(
                    "{}  planned {}",
                    budget.month,
                    budget.planned_amount.format_with_symbol(currency)
                );
            }
        }
    }

    Ok(())
}
