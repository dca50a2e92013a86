//! Service layer for family-budget
//!
//! Services add validation, membership checks and audit logging on top of
//! the storage layer. The recurring expense engine is split into
//! [`calendar`] (which dates), [`materializer`] (one expense per occurrence)
//! and [`generation`] (a whole month in one unit of work).

pub mod budget;
pub mod calendar;
pub mod category;
pub mod credit;
pub mod expense;
pub mod family;
pub mod generation;
pub mod materializer;
pub mod membership;
pub mod rule;

pub use budget::{BudgetService, BudgetSummary};
pub use calendar::{anchor_for, occurrences_in_month, AnchorStrategy, EpochAnchor, StartDateAnchor};
pub use category::CategoryService;
pub use credit::{CreditService, CreditUpdate, NewCredit};
pub use expense::{ExpenseService, ExpenseUpdate, ManualExpense};
pub use family::FamilyService;
pub use generation::GenerationService;
pub use materializer::Materializer;
pub use membership::{ensure_member, Membership};
pub use rule::{RuleService, RuleUpdate};
