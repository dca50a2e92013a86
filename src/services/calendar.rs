//! Calendar expansion of recurring rules
//!
//! Turns a rule and a target month into the concrete dates the rule falls on
//! in that month. Pure functions only; nothing here touches storage.
//!
//! Weekly and biweekly rules form one stream per rule: an anchor date, then
//! every 7 or 14 days after it. The stream is skipped forward to the target
//! month rather than restarted there, so the phase never depends on which
//! month is being generated.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::config::settings::AnchorMode;
use crate::models::{BudgetMonth, RecurringRule, RuleValidationError, Schedule};

/// Chooses where a weekday-based rule's stream of dates starts
pub trait AnchorStrategy {
    /// First date of the stream for a rule starting on `start` that repeats
    /// on `weekday` every `interval_days`. Must be on or after `start` and
    /// fall on `weekday`.
    fn anchor(&self, start: NaiveDate, weekday: Weekday, interval_days: i64) -> NaiveDate;
}

/// Earliest date on or after the rule's start date with the rule's weekday
///
/// The stream's phase follows the start date, so changing a biweekly rule's
/// start date can shift its weeks.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartDateAnchor;

impl AnchorStrategy for StartDateAnchor {
    fn anchor(&self, start: NaiveDate, weekday: Weekday, _interval_days: i64) -> NaiveDate {
        next_weekday_on_or_after(start, weekday)
    }
}

/// Pins the stream's phase to a fixed epoch week
///
/// Every rule with the same weekday and interval lands on the same weeks no
/// matter its start date. For weekly rules this is the same as
/// [`StartDateAnchor`].
#[derive(Debug, Clone, Copy)]
pub struct EpochAnchor {
    epoch: NaiveDate,
}

impl EpochAnchor {
    /// Monday 1970-01-05, the first Monday of the Unix epoch
    pub fn new() -> Self {
        Self {
            epoch: NaiveDate::from_ymd_opt(1970, 1, 5).unwrap_or(NaiveDate::MIN),
        }
    }
}

impl Default for EpochAnchor {
    fn default() -> Self {
        Self::new()
    }
}

impl AnchorStrategy for EpochAnchor {
    fn anchor(&self, start: NaiveDate, weekday: Weekday, interval_days: i64) -> NaiveDate {
        let first = next_weekday_on_or_after(start, weekday);
        let reference = next_weekday_on_or_after(self.epoch, weekday);
        let offset = (first - reference).num_days().rem_euclid(interval_days);
        if offset == 0 {
            first
        } else {
            first + Duration::days(interval_days - offset)
        }
    }
}

/// Strategy for the configured anchor mode
pub fn anchor_for(mode: AnchorMode) -> Box<dyn AnchorStrategy> {
    match mode {
        AnchorMode::StartDate => Box::new(StartDateAnchor),
        AnchorMode::Epoch => Box::new(EpochAnchor::new()),
    }
}

fn next_weekday_on_or_after(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let from = i64::from(date.weekday().num_days_from_monday());
    let to = i64::from(weekday.num_days_from_monday());
    date + Duration::days((to - from).rem_euclid(7))
}

/// Dates on which `rule` occurs in `month`, oldest first
///
/// Already restricted to the rule's [start_date, end_date] window. Fails
/// only if the rule's kind-specific fields are missing or out of range.
pub fn occurrences_in_month(
    rule: &RecurringRule,
    month: BudgetMonth,
    anchor: &dyn AnchorStrategy,
) -> Result<Vec<NaiveDate>, RuleValidationError> {
    let schedule = rule.schedule()?;
    let first = month.first_day();
    let last = month.last_day();

    if !rule.is_active_between(first, last) {
        return Ok(Vec::new());
    }

    let from = first.max(rule.start_date);
    let to = rule.end_date.map_or(last, |end| end.min(last));

    let dates = match schedule {
        Schedule::Monthly { day } => {
            let day = day.min(month.days_in_month());
            let date = first + Duration::days(i64::from(day - 1));
            if date >= from && date <= to {
                vec![date]
            } else {
                Vec::new()
            }
        }
        Schedule::Weekly { weekday } => {
            stepped(anchor.anchor(rule.start_date, weekday, 7), 7, from, to)
        }
        Schedule::Biweekly { weekday } => {
            stepped(anchor.anchor(rule.start_date, weekday, 14), 14, from, to)
        }
    };

    Ok(dates)
}

/// Dates `anchor + k * interval` (k >= 0) within [from, to]
fn stepped(anchor: NaiveDate, interval: i64, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut current = anchor;
    if current < from {
        let gap = (from - current).num_days();
        let steps = (gap + interval - 1) / interval;
        current += Duration::days(steps * interval);
    }

    let mut dates = Vec::new();
    while current <= to {
        dates.push(current);
        current += Duration::days(interval);
    }
    dates
}
