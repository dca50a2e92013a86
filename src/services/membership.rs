//! Family membership checks
//!
//! Every operation on a family's data is gated on the acting user belonging
//! to that family. Authentication itself happens elsewhere; this layer only
//! receives the already-authenticated user handle.

use crate::error::{BudgetError, BudgetResult};
use crate::models::{FamilyId, UserId};
use crate::storage::FamilyRepository;

/// Answers whether a user belongs to a family
pub trait Membership {
    fn is_member(&self, family_id: FamilyId, user: &UserId) -> BudgetResult<bool>;
}

/// Membership backed by the stored family member lists
impl Membership for FamilyRepository {
    fn is_member(&self, family_id: FamilyId, user: &UserId) -> BudgetResult<bool> {
        Ok(self
            .get(family_id)?
            .map_or(false, |family| family.has_member(user)))
    }
}

/// Fail with `Unauthorized` unless `user` belongs to the family
///
/// An unknown family is reported the same way, so callers cannot discover
/// family ids they have no access to.
pub fn ensure_member(
    membership: &dyn Membership,
    family_id: FamilyId,
    user: &UserId,
) -> BudgetResult<()> {
    if membership.is_member(family_id, user)? {
        Ok(())
    } else {
        tracing::warn!(family = %family_id, user = %user, "membership check failed");
        Err(BudgetError::unauthorized(user, family_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Family;
    use tempfile::TempDir;

    #[test]
    fn test_repository_membership() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FamilyRepository::new(temp_dir.path().join("families.json"));
        let mut family = Family::new("Smith", UserId::new("alice"));
        family.add_member(UserId::new("bob"));
        let id = family.id;
        repo.insert(family).unwrap();

        assert!(repo.is_member(id, &UserId::new("alice")).unwrap());
        assert!(repo.is_member(id, &UserId::new("bob")).unwrap());
        assert!(!repo.is_member(id, &UserId::new("mallory")).unwrap());
        assert!(!repo.is_member(FamilyId::new(), &UserId::new("alice")).unwrap());
    }

    #[test]
    fn test_ensure_member_reports_unauthorized() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FamilyRepository::new(temp_dir.path().join("families.json"));

        let err = ensure_member(&repo, FamilyId::new(), &UserId::new("alice")).unwrap_err();
        assert!(err.is_unauthorized());
    }
}
