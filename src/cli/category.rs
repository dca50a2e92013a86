//! Category and payment type CLI commands

use clap::Subcommand;

use crate::display::{format_category_tree, format_payment_types};
use crate::error::BudgetResult;
use crate::models::UserId;
use crate::services::CategoryService;
use crate::storage::Storage;

use super::{resolve_category, resolve_family};

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List a family's categories
    List {
        /// Family name or ID
        family: String,
    },

    /// Create a category, or a subcategory with --parent
    Create {
        /// Family name or ID
        family: String,
        /// Category name
        name: String,
        /// Parent category name or ID
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Create a payment type
    #[command(name = "add-payment-type")]
    AddPaymentType {
        /// Family name or ID
        family: String,
        /// Payment type name (e.g. "Credit card")
        name: String,
    },

    /// List a family's payment types
    #[command(name = "payment-types")]
    PaymentTypes {
        /// Family name or ID
        family: String,
    },
}

pub fn handle_category_command(
    storage: &Storage,
    user: &UserId,
    cmd: CategoryCommands,
) -> BudgetResult<()> {
    let service = CategoryService::new(storage);

    match cmd {
        CategoryCommands::List { family } => {
            let family = resolve_family(storage, &family, user)?;
            let categories = service.list_categories(family.id, user)?;
            print!("{}", format_category_tree(&categories));
        }

        CategoryCommands::Create {
            family,
            name,
            parent,
        } => {
            let family = resolve_family(storage, &family, user)?;
            let category = match parent {
                Some(parent) => {
                    let parent = resolve_category(storage, &family, &parent, None)?;
                    service.create_subcategory(family.id, parent.id, &name, user)?
                }
                None => service.create_category(family.id, &name, user)?,
            };
            println!("Created category: {}", category.name);
            println!("  ID: {}", category.id);
        }

        CategoryCommands::AddPaymentType { family, name } => {
            let family = resolve_family(storage, &family, user)?;
            let payment_type = service.create_payment_type(family.id, &name, user)?;
            println!("Created payment type: {}", payment_type.name);
            println!("  ID: {}", payment_type.id);
        }

        CategoryCommands::PaymentTypes { family } => {
            let family = resolve_family(storage, &family, user)?;
            let payment_types = service.list_payment_types(family.id, user)?;
            print!("{}", format_payment_types(&payment_types));
        }
    }

    Ok(())
}
