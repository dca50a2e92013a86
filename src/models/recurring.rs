//! Recurring expense rules
//!
//! A rule is a template: category, amount and a schedule. It never owns the
//! expenses generated from it, so deleting or editing a rule leaves already
//! materialized expenses alone.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{CategoryId, FamilyId, PaymentTypeId, RecurringRuleId, UserId};
use super::money::Money;

/// How often a rule repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    Weekly,
    Biweekly,
    Monthly,
}

impl RecurrenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceKind {
    type Err = RuleValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "biweekly" | "bi-weekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(RuleValidationError::UnknownKind(other.to_string())),
        }
    }
}

/// A rule's schedule once its kind-specific fields have been checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Weekly { weekday: Weekday },
    Biweekly { weekday: Weekday },
    Monthly { day: u32 },
}

/// Map 0..=6 (0 = Monday) to a chrono weekday
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Fields needed to create a rule
#[derive(Debug, Clone)]
pub struct NewRule {
    pub family_id: FamilyId,
    pub category_id: CategoryId,
    pub subcategory_id: Option<CategoryId>,
    pub payment_type_id: PaymentTypeId,
    pub description: String,
    pub amount: Money,
    pub kind: RecurrenceKind,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub day_of_week: Option<u8>,
    pub day_of_month: Option<u8>,
}

impl NewRule {
    fn base(
        family_id: FamilyId,
        category_id: CategoryId,
        payment_type_id: PaymentTypeId,
        description: impl Into<String>,
        amount: Money,
        kind: RecurrenceKind,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            family_id,
            category_id,
            subcategory_id: None,
            payment_type_id,
            description: description.into(),
            amount,
            kind,
            start_date,
            end_date: None,
            day_of_week: None,
            day_of_month: None,
        }
    }

    pub fn monthly(
        family_id: FamilyId,
        category_id: CategoryId,
        payment_type_id: PaymentTypeId,
        description: impl Into<String>,
        amount: Money,
        start_date: NaiveDate,
        day_of_month: u8,
    ) -> Self {
        let mut rule = Self::base(
            family_id,
            category_id,
            payment_type_id,
            description,
            amount,
            RecurrenceKind::Monthly,
            start_date,
        );
        rule.day_of_month = Some(day_of_month);
        rule
    }

    /// Weekly rule on `day_of_week` (0 = Monday)
    pub fn weekly(
        family_id: FamilyId,
        category_id: CategoryId,
        payment_type_id: PaymentTypeId,
        description: impl Into<String>,
        amount: Money,
        start_date: NaiveDate,
        day_of_week: u8,
    ) -> Self {
        let mut rule = Self::base(
            family_id,
            category_id,
            payment_type_id,
            description,
            amount,
            RecurrenceKind::Weekly,
            start_date,
        );
        rule.day_of_week = Some(day_of_week);
        rule
    }

    pub fn biweekly(
        family_id: FamilyId,
        category_id: CategoryId,
        payment_type_id: PaymentTypeId,
        description: impl Into<String>,
        amount: Money,
        start_date: NaiveDate,
        day_of_week: u8,
    ) -> Self {
        let mut rule = Self::weekly(
            family_id,
            category_id,
            payment_type_id,
            description,
            amount,
            start_date,
            day_of_week,
        );
        rule.kind = RecurrenceKind::Biweekly;
        rule
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_subcategory(mut self, subcategory_id: CategoryId) -> Self {
        self.subcategory_id = Some(subcategory_id);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: RecurringRuleId,
    pub family_id: FamilyId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub subcategory_id: Option<CategoryId>,
    pub payment_type_id: PaymentTypeId,

    #[serde(default)]
    pub description: String,

    pub amount: Money,

    pub kind: RecurrenceKind,

    pub start_date: NaiveDate,

    /// Inclusive
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    /// 0 = Monday .. 6 = Sunday
    #[serde(default)]
    pub day_of_week: Option<u8>,

    /// 1..=31, clamped to the month's length when expanded
    #[serde(default)]
    pub day_of_month: Option<u8>,

    pub created_by: UserId,
    pub updated_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringRule {
    pub fn new(fields: NewRule, user: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: RecurringRuleId::new(),
            family_id: fields.family_id,
            category_id: fields.category_id,
            subcategory_id: fields.subcategory_id,
            payment_type_id: fields.payment_type_id,
            description: fields.description,
            amount: fields.amount,
            kind: fields.kind,
            start_date: fields.start_date,
            end_date: fields.end_date,
            day_of_week: fields.day_of_week,
            day_of_month: fields.day_of_month,
            created_by: user.clone(),
            updated_by: user,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record an edit by `user`
    pub fn touch(&mut self, user: UserId) {
        self.updated_by = user;
        self.updated_at = Utc::now();
    }

    /// Typed schedule, failing if the kind's required field is missing or out of range
    pub fn schedule(&self) -> Result<Schedule, RuleValidationError> {
        match self.kind {
            RecurrenceKind::Weekly | RecurrenceKind::Biweekly => {
                let index = self
                    .day_of_week
                    .ok_or(RuleValidationError::MissingDayOfWeek(self.kind))?;
                let weekday = weekday_from_index(index)
                    .ok_or(RuleValidationError::DayOfWeekOutOfRange(index))?;
                Ok(if self.kind == RecurrenceKind::Weekly {
                    Schedule::Weekly { weekday }
                } else {
                    Schedule::Biweekly { weekday }
                })
            }
            RecurrenceKind::Monthly => {
                let day = self
                    .day_of_month
                    .ok_or(RuleValidationError::MissingDayOfMonth)?;
                if !(1..=31).contains(&day) {
                    return Err(RuleValidationError::DayOfMonthOutOfRange(day));
                }
                Ok(Schedule::Monthly {
                    day: u32::from(day),
                })
            }
        }
    }

    /// Whether [start_date, end_date] overlaps [first, last]
    pub fn is_active_between(&self, first: NaiveDate, last: NaiveDate) -> bool {
        self.start_date <= last && self.end_date.map_or(true, |end| end >= first)
    }

    /// Field-level checks that need no access to other entities
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.description.trim().is_empty() {
            return Err(RuleValidationError::EmptyDescription);
        }
        if self.amount.is_negative() {
            return Err(RuleValidationError::NegativeAmount);
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(RuleValidationError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }
        if self.subcategory_id == Some(self.category_id) {
            return Err(RuleValidationError::SubcategoryIsCategory);
        }
        self.schedule().map(|_| ())
    }
}

impl fmt::Display for RecurringRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.description, self.kind, self.amount)
    }
}

/// Validation errors for recurring rules
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleValidationError {
    #[error("Description cannot be empty")]
    EmptyDescription,
    #[error("Amount cannot be negative")]
    NegativeAmount,
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("day_of_week is required for {0} recurrence")]
    MissingDayOfWeek(RecurrenceKind),
    #[error("day_of_month is required for monthly recurrence")]
    MissingDayOfMonth,
    #[error("day_of_week must be between 0 (Monday) and 6 (Sunday), got {0}")]
    DayOfWeekOutOfRange(u8),
    #[error("day_of_month must be between 1 and 31, got {0}")]
    DayOfMonthOutOfRange(u8),
    #[error("Subcategory cannot be the category itself")]
    SubcategoryIsCategory,
    #[error("Invalid recurrence type: {0} (expected weekly, biweekly or monthly)")]
    UnknownKind(String),
}
