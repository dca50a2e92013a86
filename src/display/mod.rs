//! Display formatting for terminal output
//!
//! Plain-text tables for the CLI. Amounts are rendered with the configured
//! currency symbol.

pub mod category;
pub mod expense;
pub mod rule;

pub use category::{format_category_tree, format_payment_types};
pub use expense::{format_budget_summary, format_credit_list, format_expense_list};
pub use rule::{format_rule_details, format_rule_list};
