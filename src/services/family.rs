//! Family service
//!
//! Creates families and manages their member lists. The creator of a family
//! is its first member.

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Family, FamilyId, UserId};
use crate::storage::Storage;

use super::membership::{ensure_member, Membership};

const MAX_NAME_LEN: usize = 100;

/// Service for family management
pub struct FamilyService<'a> {
    storage: &'a Storage,
    membership: &'a dyn Membership,
}

impl<'a> FamilyService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            membership: &storage.families,
        }
    }

    /// Create a family with `creator` as its only member
    pub fn create(&self, name: &str, creator: &UserId) -> BudgetResult<Family> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BudgetError::Validation("Family name cannot be empty".into()));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(BudgetError::Validation(format!(
                "Family name too long ({} chars, max {})",
                name.len(),
                MAX_NAME_LEN
            )));
        }
        if creator.as_str().trim().is_empty() {
            return Err(BudgetError::Validation("User handle cannot be empty".into()));
        }

        let family = Family::new(name, creator.clone());

        let mut uow = self.storage.begin(creator)?;
        uow.storage().families.insert(family.clone())?;
        uow.log_create(EntityType::Family, family.id, &family.name, &family);
        uow.commit()?;

        tracing::info!(family = %family.id, name = %family.name, "created family");
        Ok(family)
    }

    /// Add `member` to a family; only existing members may do so
    pub fn add_member(
        &self,
        family_id: FamilyId,
        member: &UserId,
        acting_user: &UserId,
    ) -> BudgetResult<Family> {
        ensure_member(self.membership, family_id, acting_user)?;
        if member.as_str().trim().is_empty() {
            return Err(BudgetError::Validation("User handle cannot be empty".into()));
        }

        let mut uow = self.storage.begin(acting_user)?;
        let mut family = uow
            .storage()
            .families
            .get(family_id)?
            .ok_or_else(|| BudgetError::family_not_found(family_id.to_string()))?;
        let before = family.clone();

        if !family.add_member(member.clone()) {
            return Err(BudgetError::Duplicate {
                entity_type: "Family member",
                identifier: member.to_string(),
            });
        }

        uow.storage().families.update(family.clone())?;
        uow.log_update(EntityType::Family, family.id, &family.name, &before, &family);
        uow.commit()?;

        Ok(family)
    }

    pub fn get(&self, id: FamilyId) -> BudgetResult<Option<Family>> {
        self.storage.families.get(id)
    }

    /// Find a family by name or ID string
    pub fn find(&self, identifier: &str) -> BudgetResult<Option<Family>> {
        if let Some(family) = self.storage.families.get_by_name(identifier)? {
            return Ok(Some(family));
        }
        if let Ok(id) = identifier.parse::<FamilyId>() {
            return self.storage.families.get(id);
        }
        Ok(None)
    }

    /// Resolve a family the user belongs to, by name or ID
    pub fn resolve_for(&self, identifier: &str, user: &UserId) -> BudgetResult<Family> {
        let family = self
            .find(identifier)?
            .ok_or_else(|| BudgetError::family_not_found(identifier))?;
        ensure_member(self.membership, family.id, user)?;
        Ok(family)
    }

    /// Families `user` belongs to
    pub fn list_for(&self, user: &UserId) -> BudgetResult<Vec<Family>> {
        let mut families = self.storage.families.get_all()?;
        families.retain(|f| f.has_member(user));
        Ok(families)
    }
}
