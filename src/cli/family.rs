//! Family CLI commands

use clap::Subcommand;

use crate::error::BudgetResult;
use crate::models::UserId;
use crate::services::FamilyService;
use crate::storage::Storage;

use super::resolve_family;

#[derive(Subcommand)]
pub enum FamilyCommands {
    /// Create a family; you become its first member
    Create {
        /// Family name
        name: String,
    },

    /// Add a user to a family
    #[command(name = "add-member")]
    AddMember {
        /// Family name or ID
        family: String,
        /// User handle to add
        member: String,
    },

    /// List the families you belong to
    List,
}

pub fn handle_family_command(
    storage: &Storage,
    user: &UserId,
    cmd: FamilyCommands,
) -> BudgetResult<()> {
    let service = FamilyService::new(storage);

    match cmd {
        FamilyCommands::Create { name } => {
            let family = service.create(&name, user)?;
            println!("Created family: {}", family.name);
            println!("  ID: {}", family.id);
        }

        FamilyCommands::AddMember { family, member } => {
            let family = resolve_family(storage, &family, user)?;
            let member = UserId::new(member.trim());
            let updated = service.add_member(family.id, &member, user)?;
            println!("Added {} to {}", member, updated.name);
        }

        FamilyCommands::List => {
            let families = service.list_for(user)?;
            if families.is_empty() {
                println!("You do not belong to any family yet.");
            }
            for family in families {
                let members: Vec<_> = family.members.iter().map(|m| m.as_str()).collect();
                println!("{}  ({})  members: {}", family.name, family.id, members.join(", "));
            }
        }
    }

    Ok(())
}
