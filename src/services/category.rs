//! Category service
//!
//! Categories, subcategories and payment types of a family, plus the
//! ownership checks rules and expenses run against them.

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Category, CategoryId, FamilyId, PaymentType, PaymentTypeId, UserId};
use crate::storage::{Storage, UnitOfWork};

use super::membership::{ensure_member, Membership};

/// Service for category and payment type management
pub struct CategoryService<'a> {
    storage: &'a Storage,
    membership: &'a dyn Membership,
}

impl<'a> CategoryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            membership: &storage.families,
        }
    }

    /// Create a top-level category
    pub fn create_category(
        &self,
        family_id: FamilyId,
        name: &str,
        user: &UserId,
    ) -> BudgetResult<Category> {
        ensure_member(self.membership, family_id, user)?;

        let mut uow = self.storage.begin(user)?;
        let category = Self::insert_category(&mut uow, Category::new(family_id, name.trim()))?;
        uow.commit()?;
        Ok(category)
    }

    /// Create a subcategory under a top-level category of the same family
    pub fn create_subcategory(
        &self,
        family_id: FamilyId,
        parent_id: CategoryId,
        name: &str,
        user: &UserId,
    ) -> BudgetResult<Category> {
        ensure_member(self.membership, family_id, user)?;

        let mut uow = self.storage.begin(user)?;
        let parent = uow
            .storage()
            .categories
            .get_family_category(family_id, parent_id)?
            .ok_or_else(|| BudgetError::category_not_found(parent_id.to_string()))?;
        if parent.parent_id.is_some() {
            return Err(BudgetError::Validation(format!(
                "'{}' is already a subcategory and cannot have children",
                parent.name
            )));
        }

        let category = Self::insert_category(
            &mut uow,
            Category::subcategory(family_id, name.trim(), parent.id),
        )?;
        uow.commit()?;
        Ok(category)
    }

    fn insert_category(uow: &mut UnitOfWork<'_>, category: Category) -> BudgetResult<Category> {
        category
            .validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        uow.storage().categories.insert_category(category.clone())?;
        uow.log_create(EntityType::Category, category.id, &category.name, &category);
        Ok(category)
    }

    pub fn create_payment_type(
        &self,
        family_id: FamilyId,
        name: &str,
        user: &UserId,
    ) -> BudgetResult<PaymentType> {
        ensure_member(self.membership, family_id, user)?;

        let payment_type = PaymentType::new(family_id, name.trim());
        payment_type
            .validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        let mut uow = self.storage.begin(user)?;
        uow.storage()
            .categories
            .insert_payment_type(payment_type.clone())?;
        uow.log_create(
            EntityType::PaymentType,
            payment_type.id,
            &payment_type.name,
            &payment_type,
        );
        uow.commit()?;

        Ok(payment_type)
    }

    /// All categories of a family, top-level first
    pub fn list_categories(&self, family_id: FamilyId, user: &UserId) -> BudgetResult<Vec<Category>> {
        ensure_member(self.membership, family_id, user)?;
        self.storage.categories.categories_for_family(family_id)
    }

    pub fn list_payment_types(
        &self,
        family_id: FamilyId,
        user: &UserId,
    ) -> BudgetResult<Vec<PaymentType>> {
        ensure_member(self.membership, family_id, user)?;
        self.storage.categories.payment_types_for_family(family_id)
    }

    /// Find a category by name or ID string under `parent` (None = top level)
    pub fn find_category(
        &self,
        family_id: FamilyId,
        identifier: &str,
        parent_id: Option<CategoryId>,
    ) -> BudgetResult<Option<Category>> {
        if let Some(category) = self
            .storage
            .categories
            .find_category(family_id, identifier, parent_id)?
        {
            return Ok(Some(category));
        }
        if let Ok(id) = identifier.parse::<CategoryId>() {
            return self.storage.categories.get_family_category(family_id, id);
        }
        Ok(None)
    }

    /// Find a payment type by name or ID string
    pub fn find_payment_type(
        &self,
        family_id: FamilyId,
        identifier: &str,
    ) -> BudgetResult<Option<PaymentType>> {
        if let Some(payment_type) = self
            .storage
            .categories
            .find_payment_type(family_id, identifier)?
        {
            return Ok(Some(payment_type));
        }
        if let Ok(id) = identifier.parse::<PaymentTypeId>() {
            return self.storage.categories.get_family_payment_type(family_id, id);
        }
        Ok(None)
    }

    /// Check that the references of a rule or expense are usable by `family_id`
    ///
    /// The category and payment type must belong to the family, and a
    /// subcategory must be a child of the given category.
    pub fn check_references(
        &self,
        family_id: FamilyId,
        category_id: CategoryId,
        subcategory_id: Option<CategoryId>,
        payment_type_id: PaymentTypeId,
    ) -> BudgetResult<()> {
        if self
            .storage
            .categories
            .get_family_category(family_id, category_id)?
            .is_none()
        {
            return Err(BudgetError::Validation(format!(
                "Category {} does not belong to this family",
                category_id
            )));
        }

        if let Some(sub_id) = subcategory_id {
            match self.storage.categories.get_family_category(family_id, sub_id)? {
                Some(sub) if sub.is_child_of(category_id) => {}
                Some(sub) => {
                    return Err(BudgetError::Validation(format!(
                        "'{}' is not a subcategory of category {}",
                        sub.name, category_id
                    )))
                }
                None => {
                    return Err(BudgetError::Validation(format!(
                        "Subcategory {} does not belong to this family",
                        sub_id
                    )))
                }
            }
        }

        if self
            .storage
            .categories
            .get_family_payment_type(family_id, payment_type_id)?
            .is_none()
        {
            return Err(BudgetError::Validation(format!(
                "Payment type {} does not belong to this family",
                payment_type_id
            )));
        }

        Ok(())
    }
}
