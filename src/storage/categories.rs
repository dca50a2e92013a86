//! Category and payment type repository for JSON storage
//!
//! Both live in categories.json. Categories are unique per
//! (family, name, parent); payment types per (family, name).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::BudgetError;
use crate::models::{Category, CategoryId, FamilyId, PaymentType, PaymentTypeId};

use super::file_io::{read_json, StagedWrites};
use super::{read_lock, write_lock};

/// Serializable category data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CategoryData {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub payment_types: Vec<PaymentType>,
}

/// Repository for category and payment type persistence
pub struct CategoryRepository {
    path: PathBuf,
    categories: RwLock<HashMap<CategoryId, Category>>,
    payment_types: RwLock<HashMap<PaymentTypeId, PaymentType>>,
}

impl CategoryRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            categories: RwLock::new(HashMap::new()),
            payment_types: RwLock::new(HashMap::new()),
        }
    }

    /// Load categories and payment types from disk
    pub fn load(&self) -> Result<(), BudgetError> {
        let file_data: CategoryData = read_json(&self.path)?;
        self.replace_all(file_data)
    }

    /// Stage categories and payment types for the next publish
    pub fn stage(&self, writes: &mut StagedWrites) -> Result<(), BudgetError> {
        writes.stage(&self.path, &self.get_all()?)
    }

    pub(crate) fn replace_all(&self, file_data: CategoryData) -> Result<(), BudgetError> {
        let mut categories = write_lock(&self.categories)?;
        let mut payment_types = write_lock(&self.payment_types)?;

        categories.clear();
        categories.extend(file_data.categories.into_iter().map(|c| (c.id, c)));
        payment_types.clear();
        payment_types.extend(file_data.payment_types.into_iter().map(|p| (p.id, p)));
        Ok(())
    }

    /// Everything in the repository, in stable order
    pub fn get_all(&self) -> Result<CategoryData, BudgetError> {
        let categories = read_lock(&self.categories)?;
        let payment_types = read_lock(&self.payment_types)?;

        let mut category_list: Vec<_> = categories.values().cloned().collect();
        category_list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        let mut payment_list: Vec<_> = payment_types.values().cloned().collect();
        payment_list.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(CategoryData {
            categories: category_list,
            payment_types: payment_list,
        })
    }

    // === Categories ===

    pub fn get_category(&self, id: CategoryId) -> Result<Option<Category>, BudgetError> {
        Ok(read_lock(&self.categories)?.get(&id).cloned())
    }

    /// Get a category only if it belongs to `family_id`
    pub fn get_family_category(
        &self,
        family_id: FamilyId,
        id: CategoryId,
    ) -> Result<Option<Category>, BudgetError> {
        Ok(self
            .get_category(id)?
            .filter(|c| c.family_id == family_id))
    }

    /// Find a category by name under `parent` (None = top level)
    pub fn find_category(
        &self,
        family_id: FamilyId,
        name: &str,
        parent_id: Option<CategoryId>,
    ) -> Result<Option<Category>, BudgetError> {
        let categories = read_lock(&self.categories)?;
        Ok(categories
            .values()
            .find(|c| {
                c.family_id == family_id
                    && c.parent_id == parent_id
                    && c.name.eq_ignore_ascii_case(name)
            })
            .cloned())
    }

    /// Categories of a family, top-level first then by name
    pub fn categories_for_family(&self, family_id: FamilyId) -> Result<Vec<Category>, BudgetError> {
        let categories = read_lock(&self.categories)?;
        let mut list: Vec<_> = categories
            .values()
            .filter(|c| c.family_id == family_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            a.parent_id
                .is_some()
                .cmp(&b.parent_id.is_some())
                .then(a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(list)
    }

    pub fn subcategories_of(&self, parent_id: CategoryId) -> Result<Vec<Category>, BudgetError> {
        let categories = read_lock(&self.categories)?;
        let mut list: Vec<_> = categories
            .values()
            .filter(|c| c.is_child_of(parent_id))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    /// Insert a category, enforcing (family, name, parent) uniqueness
    pub fn insert_category(&self, category: Category) -> Result<(), BudgetError> {
        let mut categories = write_lock(&self.categories)?;
        let clash = categories.values().any(|c| {
            c.family_id == category.family_id
                && c.parent_id == category.parent_id
                && c.name.eq_ignore_ascii_case(&category.name)
        });
        if clash || categories.contains_key(&category.id) {
            return Err(BudgetError::Duplicate {
                entity_type: "Category",
                identifier: category.name,
            });
        }
        categories.insert(category.id, category);
        Ok(())
    }

    // === Payment types ===

    pub fn get_payment_type(&self, id: PaymentTypeId) -> Result<Option<PaymentType>, BudgetError> {
        Ok(read_lock(&self.payment_types)?.get(&id).cloned())
    }

    pub fn get_family_payment_type(
        &self,
        family_id: FamilyId,
        id: PaymentTypeId,
    ) -> Result<Option<PaymentType>, BudgetError> {
        Ok(self
            .get_payment_type(id)?
            .filter(|p| p.family_id == family_id))
    }

    pub fn find_payment_type(
        &self,
        family_id: FamilyId,
        name: &str,
    ) -> Result<Option<PaymentType>, BudgetError> {
        let payment_types = read_lock(&self.payment_types)?;
        Ok(payment_types
            .values()
            .find(|p| p.family_id == family_id && p.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    pub fn payment_types_for_family(
        &self,
        family_id: FamilyId,
    ) -> Result<Vec<PaymentType>, BudgetError> {
        let payment_types = read_lock(&self.payment_types)?;
        let mut list: Vec<_> = payment_types
            .values()
            .filter(|p| p.family_id == family_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    /// Insert a payment type, enforcing (family, name) uniqueness
    pub fn insert_payment_type(&self, payment_type: PaymentType) -> Result<(), BudgetError> {
        let mut payment_types = write_lock(&self.payment_types)?;
        let clash = payment_types.values().any(|p| {
            p.family_id == payment_type.family_id && p.name.eq_ignore_ascii_case(&payment_type.name)
        });
        if clash || payment_types.contains_key(&payment_type.id) {
            return Err(BudgetError::Duplicate {
                entity_type: "Payment type",
                identifier: payment_type.name,
            });
        }
        payment_types.insert(payment_type.id, payment_type);
        Ok(())
    }
}
