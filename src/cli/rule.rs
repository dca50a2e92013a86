//! Recurring rule CLI commands

use clap::{Args, Subcommand};

use crate::config::settings::Settings;
use crate::display::{format_rule_details, format_rule_list};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{NewRule, RecurrenceKind, RecurringRuleId, UserId};
use crate::services::{RuleService, RuleUpdate};
use crate::storage::Storage;

use super::{
    parse_amount, parse_date, parse_weekday, resolve_category, resolve_family,
    resolve_payment_type,
};

#[derive(Args)]
pub struct RuleAddArgs {
    /// Family name or ID
    pub family: String,
    /// Description used for generated expenses
    #[arg(short, long)]
    pub description: String,
    /// Amount (e.g. "49.99")
    #[arg(short, long)]
    pub amount: String,
    /// Category name or ID
    #[arg(short, long)]
    pub category: String,
    /// Subcategory name or ID
    #[arg(short, long)]
    pub subcategory: Option<String>,
    /// Payment type name or ID
    #[arg(short, long)]
    pub payment: String,
    /// weekly, biweekly or monthly
    #[arg(short, long)]
    pub kind: String,
    /// First day the rule applies (YYYY-MM-DD)
    #[arg(long)]
    pub start: String,
    /// Last day the rule applies, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
    /// Weekday for weekly/biweekly rules (0 = Monday, or a name like "wed")
    #[arg(long)]
    pub day_of_week: Option<String>,
    /// Day of month for monthly rules (1-31; clamped in short months)
    #[arg(long)]
    pub day_of_month: Option<u8>,
}

#[derive(Args)]
pub struct RuleEditArgs {
    /// Rule ID
    pub rule: String,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long)]
    pub amount: Option<String>,
    /// Category name or ID
    #[arg(short, long)]
    pub category: Option<String>,
    /// Subcategory name or ID
    #[arg(short, long, conflicts_with = "clear_subcategory")]
    pub subcategory: Option<String>,
    #[arg(long)]
    pub clear_subcategory: bool,
    /// Payment type name or ID
    #[arg(short, long)]
    pub payment: Option<String>,
    #[arg(short, long)]
    pub kind: Option<String>,
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long, conflicts_with = "clear_end")]
    pub end: Option<String>,
    /// Remove the end date
    #[arg(long)]
    pub clear_end: bool,
    #[arg(long)]
    pub day_of_week: Option<String>,
    #[arg(long)]
    pub day_of_month: Option<u8>,
}

#[derive(Subcommand)]
pub enum RuleCommands {
    /// Create a recurring expense rule
    Add(RuleAddArgs),

    /// List a family's rules
    List {
        /// Family name or ID
        family: String,
    },

    /// Show a rule
    Show {
        /// Rule ID
        rule: String,
    },

    /// Change some fields of a rule
    Edit(RuleEditArgs),

    /// Delete a rule (expenses already generated are kept)
    Delete {
        /// Rule ID
        rule: String,
    },
}

fn parse_rule_id(s: &str) -> BudgetResult<RecurringRuleId> {
    s.parse()
        .map_err(|_| BudgetError::Validation(format!("Invalid rule ID: {}", s)))
}

fn parse_kind(s: &str) -> BudgetResult<RecurrenceKind> {
    s.parse()
        .map_err(|e: crate::models::RuleValidationError| BudgetError::Validation(e.to_string()))
}

pub fn handle_rule_command(
    storage: &Storage,
    settings: &Settings,
    user: &UserId,
    cmd: RuleCommands,
) -> BudgetResult<()> {
    let service = RuleService::new(storage);
    let currency = settings.currency_symbol.as_str();

    match cmd {
        RuleCommands::Add(args) => {
            let family = resolve_family(storage, &args.family, user)?;
            let category = resolve_category(storage, &family, &args.category, None)?;
            let subcategory = args
                .subcategory
                .as_deref()
                .map(|s| resolve_category(storage, &family, s, Some(&category)))
                .transpose()?;
            let payment = resolve_payment_type(storage, &family, &args.payment)?;

            let fields = NewRule {
                family_id: family.id,
                category_id: category.id,
                subcategory_id: subcategory.map(|s| s.id),
                payment_type_id: payment.id,
                description: args.description,
                amount: parse_amount(&args.amount)?,
                kind: parse_kind(&args.kind)?,
                start_date: parse_date(&args.start)?,
                end_date: args.end.as_deref().map(parse_date).transpose()?,
                day_of_week: args.day_of_week.as_deref().map(parse_weekday).transpose()?,
                day_of_month: args.day_of_month,
            };

            let rule = service.create(fields, user)?;
            println!("Created recurring rule: {}", rule.description);
            println!("  ID: {}", rule.id);
        }

        RuleCommands::List { family } => {
            let family = resolve_family(storage, &family, user)?;
            let rules = service.list(family.id, user)?;
            print!("{}", format_rule_list(&rules, currency));
        }

        RuleCommands::Show { rule } => {
            let rule = service.get(parse_rule_id(&rule)?, user)?;
            print!("{}", format_rule_details(&rule, currency));
        }

        RuleCommands::Edit(args) => {
            let current = service.get(parse_rule_id(&args.rule)?, user)?;
            let family = storage
                .families
                .get(current.family_id)?
                .ok_or_else(|| BudgetError::family_not_found(current.family_id.to_string()))?;

            let category = args
                .category
                .as_deref()
                .map(|c| resolve_category(storage, &family, c, None))
                .transpose()?;

            let subcategory_id = if args.clear_subcategory {
                Some(None)
            } else if let Some(sub) = args.subcategory.as_deref() {
                let parent_id = category.as_ref().map_or(current.category_id, |c| c.id);
                let parent = storage
                    .categories
                    .get_category(parent_id)?
                    .ok_or_else(|| BudgetError::category_not_found(parent_id.to_string()))?;
                Some(Some(resolve_category(storage, &family, sub, Some(&parent))?.id))
            } else {
                None
            };

            let update = RuleUpdate {
                category_id: category.map(|c| c.id),
                subcategory_id,
                payment_type_id: args
                    .payment
                    .as_deref()
                    .map(|p| resolve_payment_type(storage, &family, p).map(|p| p.id))
                    .transpose()?,
                description: args.description,
                amount: args.amount.as_deref().map(parse_amount).transpose()?,
                kind: args.kind.as_deref().map(parse_kind).transpose()?,
                start_date: args.start.as_deref().map(parse_date).transpose()?,
                end_date: if args.clear_end {
                    Some(None)
                } else {
                    args.end.as_deref().map(parse_date).transpose()?.map(Some)
                },
                day_of_week: args
                    .day_of_week
                    .as_deref()
                    .map(parse_weekday)
                    .transpose()?
                    .map(Some),
                day_of_month: args.day_of_month.map(Some),
            };

            if update.is_empty() {
                println!("No changes specified.");
                return Ok(());
            }

            let rule = service.update(current.id, update, user)?;
            println!("Updated recurring rule: {}", rule.description);
        }

        RuleCommands::Delete { rule } => {
            let (rule, kept) = service.delete(parse_rule_id(&rule)?, user)?;
            println!("Deleted recurring rule: {}", rule.description);
            if kept > 0 {
                println!("Kept {} expense(s) already generated from it.", kept);
            }
        }
    }

    Ok(())
}
