//! Family repository for JSON storage
//!
//! Manages loading and saving families (with their member lists) to
//! families.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::BudgetError;
use crate::models::{Family, FamilyId};

use super::file_io::{read_json, StagedWrites};
use super::{read_lock, write_lock};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct FamilyData {
    families: Vec<Family>,
}

/// Repository for family persistence
pub struct FamilyRepository {
    path: PathBuf,
    data: RwLock<HashMap<FamilyId, Family>>,
}

impl FamilyRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load families from disk
    pub fn load(&self) -> Result<(), BudgetError> {
        let file_data: FamilyData = read_json(&self.path)?;
        self.replace_all(file_data.families)
    }

    /// Stage families for the next publish
    pub fn stage(&self, writes: &mut StagedWrites) -> Result<(), BudgetError> {
        let file_data = FamilyData {
            families: self.get_all()?,
        };
        writes.stage(&self.path, &file_data)
    }

    pub(crate) fn replace_all(&self, families: Vec<Family>) -> Result<(), BudgetError> {
        let mut data = write_lock(&self.data)?;
        data.clear();
        data.extend(families.into_iter().map(|f| (f.id, f)));
        Ok(())
    }

    pub fn get(&self, id: FamilyId) -> Result<Option<Family>, BudgetError> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// Find a family by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<Option<Family>, BudgetError> {
        let data = read_lock(&self.data)?;
        Ok(data
            .values()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    /// All families, sorted by name
    pub fn get_all(&self) -> Result<Vec<Family>, BudgetError> {
        let data = read_lock(&self.data)?;
        let mut families: Vec<_> = data.values().cloned().collect();
        families.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(families)
    }

    /// Insert a new family; names are unique
    pub fn insert(&self, family: Family) -> Result<(), BudgetError> {
        let mut data = write_lock(&self.data)?;
        if data.contains_key(&family.id)
            || data
                .values()
                .any(|f| f.name.eq_ignore_ascii_case(&family.name))
        {
            return Err(BudgetError::Duplicate {
                entity_type: "Family",
                identifier: family.name,
            });
        }
        data.insert(family.id, family);
        Ok(())
    }

    /// Replace an existing family
    pub fn update(&self, family: Family) -> Result<(), BudgetError> {
        let mut data = write_lock(&self.data)?;
        if !data.contains_key(&family.id) {
            return Err(BudgetError::family_not_found(family.id.to_string()));
        }
        data.insert(family.id, family);
        Ok(())
    }

    pub fn count(&self) -> Result<usize, BudgetError> {
        Ok(read_lock(&self.data)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, FamilyRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = FamilyRepository::new(temp_dir.path().join("families.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_insert_and_get() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let family = Family::new("Smith", UserId::new("alice"));
        let id = family.id;
        repo.insert(family).unwrap();

        assert_eq!(repo.get(id).unwrap().unwrap().name, "Smith");
        assert!(repo.get_by_name("smith").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (_temp_dir, repo) = create_test_repo();
        repo.insert(Family::new("Smith", UserId::new("alice"))).unwrap();

        let err = repo
            .insert(Family::new("SMITH", UserId::new("bob")))
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let mut family = Family::new("Smith", UserId::new("alice"));
        family.add_member(UserId::new("bob"));
        let id = family.id;
        repo.insert(family).unwrap();
        let mut writes = StagedWrites::new();
        repo.stage(&mut writes).unwrap();
        writes.publish().unwrap();

        let repo2 = FamilyRepository::new(temp_dir.path().join("families.json"));
        repo2.load().unwrap();
        let loaded = repo2.get(id).unwrap().unwrap();
        assert_eq!(loaded.members.len(), 2);
    }
}
