//! Category and PaymentType models
//!
//! Categories form a two-level tree per family: a top-level category may have
//! subcategories pointing at it through `parent_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, FamilyId, PaymentTypeId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    pub family_id: FamilyId,

    pub name: String,

    /// Parent category when this is a subcategory
    #[serde(default)]
    pub parent_id: Option<CategoryId>,

    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(family_id: FamilyId, name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            family_id,
            name: name.into(),
            parent_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn subcategory(family_id: FamilyId, name: impl Into<String>, parent: CategoryId) -> Self {
        let mut category = Self::new(family_id, name);
        category.parent_id = Some(parent);
        category
    }

    pub fn is_child_of(&self, parent: CategoryId) -> bool {
        self.parent_id == Some(parent)
    }

    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        validate_name(&self.name)?;
        if self.parent_id == Some(self.id) {
            return Err(CategoryValidationError::SelfParent);
        }
        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// How an expense is paid (card, cash, bank transfer...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentType {
    pub id: PaymentTypeId,
    pub family_id: FamilyId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentType {
    pub fn new(family_id: FamilyId, name: impl Into<String>) -> Self {
        Self {
            id: PaymentTypeId::new(),
            family_id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        validate_name(&self.name)
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn validate_name(name: &str) -> Result<(), CategoryValidationError> {
    if name.trim().is_empty() {
        return Err(CategoryValidationError::EmptyName);
    }
    if name.len() > 100 {
        return Err(CategoryValidationError::NameTooLong(name.len()));
    }
    Ok(())
}

/// Validation errors for categories and payment types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryValidationError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Name too long ({0} characters, max 100)")]
    NameTooLong(usize),
    #[error("Category cannot be its own parent")]
    SelfParent,
}
