//! The `generate` command

use clap::Args;

use crate::config::settings::Settings;
use crate::error::BudgetResult;
use crate::models::UserId;
use crate::services::budget::target_month;
use crate::services::GenerationService;
use crate::storage::Storage;

use super::{parse_year_month, resolve_family};

#[derive(Args)]
pub struct GenerateArgs {
    /// Family name or ID
    pub family: String,
    /// Month to generate (YYYY-MM)
    pub month: String,
}

pub fn handle_generate_command(
    storage: &Storage,
    settings: &Settings,
    user: &UserId,
    args: GenerateArgs,
) -> BudgetResult<()> {
    let (year, month) = parse_year_month(&args.month)?;
    target_month(year, month)?;
    let family = resolve_family(storage, &args.family, user)?;

    let count = GenerationService::new(storage, settings).generate(family.id, year, month, user)?;

    match count {
        0 => println!("No new recurring expenses for {:04}-{:02}.", year, month),
        1 => println!("Generated 1 recurring expense for {:04}-{:02}.", year, month),
        n => println!("Generated {} recurring expenses for {:04}-{:02}.", n, year, month),
    }
    Ok(())
}
