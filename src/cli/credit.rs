//! Credit CLI commands

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::format_credit_list;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{CreditId, UserId};
use crate::services::{CreditService, CreditUpdate, NewCredit};
use crate::storage::Storage;

use super::{parse_amount, parse_date, parse_month, resolve_family};

#[derive(Subcommand)]
pub enum CreditCommands {
    /// Record a refund or reimbursement
    Add {
        /// Family name or ID
        family: String,
        /// Amount (e.g. "12.50")
        amount: String,
        /// Credit date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// List a month's credits
    List {
        /// Family name or ID
        family: String,
        /// Month (YYYY-MM)
        month: String,
    },

    /// Edit a credit
    Edit {
        /// Family name or ID
        family: String,
        /// Credit ID
        credit: String,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a credit
    Delete {
        /// Family name or ID
        family: String,
        /// Credit ID
        credit: String,
    },
}

fn parse_credit_id(s: &str) -> BudgetResult<CreditId> {
    s.parse()
        .map_err(|_| BudgetError::Validation(format!("Invalid credit ID: {}", s)))
}

pub fn handle_credit_command(
    storage: &Storage,
    settings: &Settings,
    user: &UserId,
    cmd: CreditCommands,
) -> BudgetResult<()> {
    let service = CreditService::new(storage);
    let currency = settings.currency_symbol.as_str();

    match cmd {
        CreditCommands::Add {
            family,
            amount,
            date,
            description,
        } => {
            let amount = parse_amount(&amount)?;
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => chrono::Local::now().date_naive(),
            };
            let family = resolve_family(storage, &family, user)?;
            let credit = service.add(
                NewCredit {
                    family_id: family.id,
                    description,
                    amount,
                    date,
                },
                user,
            )?;
            println!(
                "Credited {} on {}",
                credit.amount.format_with_symbol(currency),
                credit.date
            );
            println!("  ID: {}", credit.id);
        }

        CreditCommands::List { family, month } => {
            let month = parse_month(&month)?;
            let family = resolve_family(storage, &family, user)?;
            let credits = service.list_month(family.id, month, user)?;
            print!("{}", format_credit_list(&credits, currency));
        }

        CreditCommands::Edit {
            family,
            credit,
            amount,
            date,
            description,
        } => {
            let id = parse_credit_id(&credit)?;
            let changes = CreditUpdate {
                description,
                amount: amount.as_deref().map(parse_amount).transpose()?,
                date: date.as_deref().map(parse_date).transpose()?,
            };
            let family = resolve_family(storage, &family, user)?;
            let credit = service.update(family.id, id, changes, user)?;
            println!(
                "Updated credit: {} on {}",
                credit.amount.format_with_symbol(currency),
                credit.date
            );
        }

        CreditCommands::Delete { family, credit } => {
            let id = parse_credit_id(&credit)?;
            let family = resolve_family(storage, &family, user)?;
            let deleted = service.delete(family.id, id, user)?;
            println!("Deleted credit of {} on {}", deleted.amount, deleted.date);
        }
    }

    Ok(())
}
