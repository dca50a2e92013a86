//! Calendar month a budget covers
//!
//! Budgets are keyed by (family, year, month). `BudgetMonth` is only
//! constructible for real calendar months, so first/last day never fail.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A validated (year, month) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawMonth", into = "RawMonth")]
pub struct BudgetMonth {
    year: i32,
    month: u32,
    first: NaiveDate,
}

#[derive(Serialize, Deserialize)]
struct RawMonth {
    year: i32,
    month: u32,
}

impl TryFrom<RawMonth> for BudgetMonth {
    type Error = MonthError;

    fn try_from(raw: RawMonth) -> Result<Self, Self::Error> {
        BudgetMonth::new(raw.year, raw.month)
    }
}

impl From<BudgetMonth> for RawMonth {
    fn from(m: BudgetMonth) -> Self {
        RawMonth {
            year: m.year,
            month: m.month,
        }
    }
}

impl BudgetMonth {
    /// Create a month, rejecting anything outside 1..=12 or years 1..=9999
    pub fn new(year: i32, month: u32) -> Result<Self, MonthError> {
        if !(1..=9999).contains(&year) || !(1..=12).contains(&month) {
            return Err(MonthError::OutOfRange { year, month });
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(MonthError::OutOfRange { year, month })?;
        Ok(Self { year, month, first })
    }

    /// The month containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        let first = date - Duration::days(i64::from(date.day0()));
        Self {
            year: date.year(),
            month: date.month(),
            first,
        }
    }

    /// Get the current month
    pub fn current() -> Self {
        Self::containing(chrono::Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    /// Last calendar day (28-31)
    pub fn last_day(&self) -> NaiveDate {
        self.next().first - Duration::days(1)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }

    pub fn next(&self) -> Self {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        // December 9999 rolls into year 10000 which chrono still represents
        let first = self.first + Duration::days(i64::from(days_in(self.year, self.month)));
        Self { year, month, first }
    }

    pub fn prev(&self) -> Self {
        let prev_last = self.first - Duration::days(1);
        Self::containing(prev_last)
    }

    /// Parse "YYYY-MM"
    pub fn parse(s: &str) -> Result<Self, MonthError> {
        let s = s.trim();
        let invalid = || MonthError::InvalidFormat(s.to_string());

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

fn days_in(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        _ => 28,
    }
}

impl fmt::Display for BudgetMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Error type for month construction and parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonthError {
    #[error("Invalid month format: {0} (expected YYYY-MM)")]
    InvalidFormat(String),
    #[error("Month out of range: {year}-{month:02}")]
    OutOfRange { year: i32, month: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        let feb = BudgetMonth::new(2024, 2).unwrap();
        assert_eq!(feb.first_day(), date(2024, 2, 1));
        assert_eq!(feb.last_day(), date(2024, 2, 29));

        let feb_non_leap = BudgetMonth::new(2023, 2).unwrap();
        assert_eq!(feb_non_leap.days_in_month(), 28);

        let dec = BudgetMonth::new(2024, 12).unwrap();
        assert_eq!(dec.last_day(), date(2024, 12, 31));
        assert_eq!(BudgetMonth::new(1900, 2).unwrap().days_in_month(), 28);
        assert_eq!(BudgetMonth::new(2000, 2).unwrap().days_in_month(), 29);
    }

    #[test]
    fn test_rejects_invalid_months() {
        assert!(BudgetMonth::new(2024, 0).is_err());
        assert!(BudgetMonth::new(2024, 13).is_err());
        assert!(BudgetMonth::new(0, 5).is_err());
    }

    #[test]
    fn test_navigation() {
        let dec = BudgetMonth::new(2024, 12).unwrap();
        assert_eq!(dec.next(), BudgetMonth::new(2025, 1).unwrap());
        assert_eq!(dec.next().prev(), dec);

        let mar = BudgetMonth::new(2024, 3).unwrap();
        assert_eq!(mar.prev().last_day(), date(2024, 2, 29));
    }

    #[test]
    fn test_containing_and_contains() {
        let m = BudgetMonth::containing(date(2024, 3, 17));
        assert_eq!(m, BudgetMonth::new(2024, 3).unwrap());
        assert!(m.contains(date(2024, 3, 31)));
        assert!(!m.contains(date(2024, 4, 1)));
    }

    #[test]
    fn test_parse_and_display() {
        let m = BudgetMonth::parse("2024-02").unwrap();
        assert_eq!(m.to_string(), "2024-02");
        assert!(matches!(
            BudgetMonth::parse("2024-13"),
            Err(MonthError::OutOfRange { .. })
        ));
        assert!(matches!(
            BudgetMonth::parse("February"),
            Err(MonthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_serde_validates() {
        let m = BudgetMonth::new(2024, 7).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"year":2024,"month":7}"#);
        let back: BudgetMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        assert!(serde_json::from_str::<BudgetMonth>(r#"{"year":2024,"month":14}"#).is_err());
    }
}
