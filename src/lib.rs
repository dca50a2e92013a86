//! family-budget - household budgets with recurring expense generation
//!
//! Families keep one budget per calendar month, made of categorized
//! expenses. Recurring rules (weekly, biweekly or monthly) describe expenses
//! that repeat; generating a month turns every rule occurrence in that month
//! into an expense exactly once, creating the month's budget if needed.
//!
//! # Architecture
//!
//! - `config`: path resolution and user settings
//! - `error`: the crate error type
//! - `models`: families, categories, budgets, expenses and rules
//! - `storage`: JSON file repositories and the unit of work
//! - `audit`: append-only audit log
//! - `services`: validation, membership checks and the generation engine
//! - `cli` / `display`: the `fambudget` command line front end
//!
//! # Example
//!
//! ```rust,ignore
//! use family_budget::config::{paths::BudgetPaths, settings::Settings};
//! use family_budget::services::GenerationService;
//! use family_budget::storage::Storage;
//!
//! let paths = BudgetPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths)?;
//! let created = GenerationService::new(&storage, &settings)
//!     .generate(family_id, 2024, 2, &user)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{BudgetError, BudgetResult};
