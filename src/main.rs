use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use family_budget::cli::{
    handle_budget_command, handle_category_command, handle_credit_command,
    handle_expense_command, handle_family_command, handle_generate_command, handle_rule_command,
    BudgetCommands, CategoryCommands, CreditCommands, ExpenseCommands, FamilyCommands,
    GenerateArgs, RuleCommands,
};
use family_budget::config::{paths::BudgetPaths, settings::Settings};
use family_budget::models::UserId;
use family_budget::storage::Storage;

#[derive(Parser)]
#[command(
    name = "fambudget",
    version,
    about = "Household budgeting with recurring expense generation",
    long_about = "fambudget keeps monthly budgets for a family and turns recurring \
                  expense rules (weekly, biweekly, monthly) into dated expenses, \
                  one month at a time, without ever duplicating an occurrence."
)]
struct Cli {
    /// Acting user handle
    #[arg(short, long, global = true, env = "FAMILY_BUDGET_USER")]
    user: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Family management commands
    #[command(subcommand)]
    Family(FamilyCommands),

    /// Category and payment type commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Recurring expense rule commands
    #[command(subcommand)]
    Rule(RuleCommands),

    /// Generate a month's recurring expenses
    Generate(GenerateArgs),

    /// Expense commands
    #[command(subcommand, alias = "exp")]
    Expense(ExpenseCommands),

    /// Refund and reimbursement commands
    #[command(subcommand)]
    Credit(CreditCommands),

    /// Monthly budget commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Initialize the data directory and default settings
    Init,

    /// Show current configuration and paths
    Config,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "family_budget=debug",
        _ => "family_budget=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn acting_user(user: Option<String>) -> Result<UserId> {
    let handle = user
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .context("No user given; pass --user or set FAMILY_BUDGET_USER")?;
    Ok(UserId::new(handle))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let paths = BudgetPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    let storage = Storage::open(paths.clone())
        .with_context(|| format!("Failed to load data from {}", paths.data_dir().display()))?;

    match cli.command {
        Some(Commands::Family(cmd)) => {
            handle_family_command(&storage, &acting_user(cli.user)?, cmd)?;
        }
        Some(Commands::Category(cmd)) => {
            handle_category_command(&storage, &acting_user(cli.user)?, cmd)?;
        }
        Some(Commands::Rule(cmd)) => {
            handle_rule_command(&storage, &settings, &acting_user(cli.user)?, cmd)?;
        }
        Some(Commands::Generate(args)) => {
            handle_generate_command(&storage, &settings, &acting_user(cli.user)?, args)?;
        }
        Some(Commands::Expense(cmd)) => {
            handle_expense_command(&storage, &settings, &acting_user(cli.user)?, cmd)?;
        }
        Some(Commands::Credit(cmd)) => {
            handle_credit_command(&storage, &settings, &acting_user(cli.user)?, cmd)?;
        }
        Some(Commands::Budget(cmd)) => {
            handle_budget_command(&storage, &settings, &acting_user(cli.user)?, cmd)?;
        }
        Some(Commands::Audit { limit }) => {
            let entries = storage.audit().read_recent(limit)?;
            if entries.is_empty() {
                println!("Audit log is empty.");
            }
            for entry in entries {
                println!("{}", entry.format_human_readable());
            }
        }
        Some(Commands::Init) => {
            println!("Initializing family-budget at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            storage.save_all()?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Next steps:");
            println!("  fambudget --user <you> family create <name>");
            println!("  fambudget --user <you> category create <family> <name>");
            println!("  fambudget --user <you> category add-payment-type <family> <name>");
        }
        Some(Commands::Config) => {
            println!("family-budget configuration");
            println!("===========================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Data directory: {}", paths.data_dir().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol:  {}", settings.currency_symbol);
            println!("  Recurring prefix: {:?}", settings.recurring_prefix);
            println!("  Anchor mode:      {:?}", settings.anchor_mode);
        }
        None => {
            println!("fambudget - household budgets with recurring expenses");
            println!();
            println!("Run 'fambudget --help' for usage information.");
        }
    }

    Ok(())
}
