//! Recurring rule service
//!
//! Create, update, delete and read recurring expense rules. Every operation
//! requires the acting user to belong to the rule's family. Rules are
//! templates: deleting or editing one never touches expenses already
//! generated from it.

use chrono::NaiveDate;

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    CategoryId, FamilyId, Money, NewRule, PaymentTypeId, RecurrenceKind, RecurringRule,
    RecurringRuleId, UserId,
};
use crate::storage::Storage;

use super::category::CategoryService;
use super::membership::{ensure_member, Membership};

/// Partial update of a rule; `None` leaves a field unchanged
///
/// Nullable fields use `Option<Option<_>>`: `Some(None)` clears the field.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<Option<CategoryId>>,
    pub payment_type_id: Option<PaymentTypeId>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub kind: Option<RecurrenceKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub day_of_week: Option<Option<u8>>,
    pub day_of_month: Option<Option<u8>>,
}

impl RuleUpdate {
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.subcategory_id.is_none()
            && self.payment_type_id.is_none()
            && self.description.is_none()
            && self.amount.is_none()
            && self.kind.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.day_of_week.is_none()
            && self.day_of_month.is_none()
    }
}

/// Service for recurring rule management
pub struct RuleService<'a> {
    storage: &'a Storage,
    membership: &'a dyn Membership,
}

impl<'a> RuleService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self::with_membership(storage, &storage.families)
    }

    pub fn with_membership(storage: &'a Storage, membership: &'a dyn Membership) -> Self {
        Self {
            storage,
            membership,
        }
    }

    /// Create a rule after checking its fields and references
    pub fn create(&self, mut fields: NewRule, user: &UserId) -> BudgetResult<RecurringRule> {
        ensure_member(self.membership, fields.family_id, user)?;

        fields.description = fields.description.trim().to_string();
        let rule = RecurringRule::new(fields, user.clone());

        let mut uow = self.storage.begin(user)?;
        self.validate(&rule)?;
        uow.storage().rules.upsert(rule.clone())?;
        uow.log_create(EntityType::RecurringRule, rule.id, &rule.description, &rule);
        uow.commit()?;

        tracing::info!(rule = %rule.id, kind = %rule.kind, "created recurring rule");
        Ok(rule)
    }

    /// Apply a partial update
    ///
    /// The rule is read, merged and validated inside the unit of work that
    /// writes it. Moving the rule to another category drops a subcategory
    /// that is not a child of the new category, unless the update sets one
    /// explicitly.
    pub fn update(
        &self,
        id: RecurringRuleId,
        update: RuleUpdate,
        user: &UserId,
    ) -> BudgetResult<RecurringRule> {
        let mut uow = self.storage.begin(user)?;
        let mut rule = self.get(id, user)?;
        if update.is_empty() {
            return Ok(rule);
        }
        let before = rule.clone();

        let category_changed = match update.category_id {
            Some(category_id) if category_id != rule.category_id => {
                rule.category_id = category_id;
                true
            }
            _ => false,
        };

        match update.subcategory_id {
            Some(subcategory_id) => rule.subcategory_id = subcategory_id,
            None if category_changed => {
                if let Some(sub_id) = rule.subcategory_id {
                    let still_child = self
                        .storage
                        .categories
                        .get_category(sub_id)?
                        .map_or(false, |sub| sub.is_child_of(rule.category_id));
                    if !still_child {
                        tracing::debug!(rule = %rule.id, "clearing subcategory after category change");
                        rule.subcategory_id = None;
                    }
                }
            }
            None => {}
        }

        if let Some(payment_type_id) = update.payment_type_id {
            rule.payment_type_id = payment_type_id;
        }
        if let Some(description) = update.description {
            rule.description = description.trim().to_string();
        }
        if let Some(amount) = update.amount {
            rule.amount = amount;
        }
        if let Some(kind) = update.kind {
            rule.kind = kind;
        }
        if let Some(start_date) = update.start_date {
            rule.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            rule.end_date = end_date;
        }
        if let Some(day_of_week) = update.day_of_week {
            rule.day_of_week = day_of_week;
        }
        if let Some(day_of_month) = update.day_of_month {
            rule.day_of_month = day_of_month;
        }

        self.validate(&rule)?;
        rule.touch(user.clone());

        uow.storage().rules.upsert(rule.clone())?;
        uow.log_update(EntityType::RecurringRule, rule.id, &rule.description, &before, &rule);
        uow.commit()?;

        Ok(rule)
    }

    /// Delete a rule; its generated expenses stay
    ///
    /// Returns the deleted rule and how many expenses generated from it
    /// were kept.
    pub fn delete(
        &self,
        id: RecurringRuleId,
        user: &UserId,
    ) -> BudgetResult<(RecurringRule, usize)> {
        let mut uow = self.storage.begin(user)?;
        let rule = self.get(id, user)?;
        let kept = uow.storage().expenses.get_by_rule(id)?.len();

        uow.storage().rules.delete(id)?;
        uow.log_delete(EntityType::RecurringRule, rule.id, &rule.description, &rule);
        uow.commit()?;

        tracing::info!(rule = %rule.id, kept, "deleted recurring rule");
        Ok((rule, kept))
    }

    /// Get a rule of a family the user belongs to
    pub fn get(&self, id: RecurringRuleId, user: &UserId) -> BudgetResult<RecurringRule> {
        let rule = self
            .storage
            .rules
            .get(id)?
            .ok_or_else(|| BudgetError::rule_not_found(id.to_string()))?;
        ensure_member(self.membership, rule.family_id, user)?;
        Ok(rule)
    }

    /// Rules of a family, oldest first
    pub fn list(&self, family_id: FamilyId, user: &UserId) -> BudgetResult<Vec<RecurringRule>> {
        ensure_member(self.membership, family_id, user)?;
        self.storage.rules.for_family(family_id)
    }

    fn validate(&self, rule: &RecurringRule) -> BudgetResult<()> {
        rule.validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;
        CategoryService::new(self.storage).check_references(
            rule.family_id,
            rule.category_id,
            rule.subcategory_id,
            rule.payment_type_id,
        )
    }
}
