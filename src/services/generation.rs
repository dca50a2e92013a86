//! Recurring expense generation
//!
//! `generate` expands every rule of a family for one month and materializes
//! the missing expenses, all inside a single unit of work. Either every
//! expense of the call (and the month's budget, if it had to be created) is
//! committed, or nothing is.

use crate::config::settings::Settings;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{FamilyId, UserId};
use crate::storage::Storage;

use super::budget::{target_month, BudgetService};
use super::calendar::{anchor_for, occurrences_in_month, AnchorStrategy};
use super::materializer::Materializer;
use super::membership::{ensure_member, Membership};

/// Drives rule expansion and materialization for a family's month
pub struct GenerationService<'a> {
    storage: &'a Storage,
    membership: &'a dyn Membership,
    anchor: Box<dyn AnchorStrategy>,
    prefix: String,
}

impl<'a> GenerationService<'a> {
    pub fn new(storage: &'a Storage, settings: &Settings) -> Self {
        Self {
            storage,
            membership: &storage.families,
            anchor: anchor_for(settings.anchor_mode),
            prefix: settings.recurring_prefix.clone(),
        }
    }

    /// Use another membership source, e.g. an external authorization service
    pub fn with_membership(mut self, membership: &'a dyn Membership) -> Self {
        self.membership = membership;
        self
    }

    /// Use a specific anchor strategy for weekday-based rules
    pub fn with_anchor(mut self, anchor: Box<dyn AnchorStrategy>) -> Self {
        self.anchor = anchor;
        self
    }

    /// Generate the family's recurring expenses for `year`-`month`
    ///
    /// Returns how many expenses were created by this call. Running it again
    /// for the same month returns 0.
    pub fn generate(
        &self,
        family_id: FamilyId,
        year: i32,
        month: u32,
        acting_user: &UserId,
    ) -> BudgetResult<usize> {
        let month = target_month(year, month)?;
        ensure_member(self.membership, family_id, acting_user)?;

        let span = tracing::info_span!("generate", family = %family_id, %month);
        let _enter = span.enter();

        let mut uow = self.storage.begin(acting_user)?;
        let budget = BudgetService::get_or_create_in(&mut uow, family_id, month)?;
        let rules = self.storage.rules.for_family(family_id)?;
        let materializer = Materializer::new(&self.prefix);

        let mut generated = 0;
        for rule in &rules {
            let dates = occurrences_in_month(rule, month, self.anchor.as_ref()).map_err(|e| {
                BudgetError::Validation(format!("Rule '{}' ({}): {}", rule.description, rule.id, e))
            })?;
            for date in dates {
                if materializer.materialize(&mut uow, budget.id, rule, date)? {
                    generated += 1;
                }
            }
        }

        uow.commit()?;
        tracing::info!(rules = rules.len(), generated, "generated recurring expenses");
        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::AnchorMode;
    use crate::models::{BudgetMonth, Money, NewRule, RecurringRule};
    use crate::services::test_support::Fixture;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add_rule(fx: &Fixture, fields: NewRule) -> RecurringRule {
        let rule = RecurringRule::new(fields, fx.alice.clone());
        fx.storage.rules.upsert(rule.clone()).unwrap();
        rule
    }

    fn rent(fx: &Fixture) -> NewRule {
        NewRule::monthly(
            fx.family.id,
            fx.category.id,
            fx.payment_type.id,
            "Rent",
            Money::from_cents(150_000),
            date(2024, 1, 1),
            31,
        )
    }

    fn gym(fx: &Fixture) -> NewRule {
        NewRule::weekly(
            fx.family.id,
            fx.category.id,
            fx.payment_type.id,
            "Gym",
            Money::from_cents(1_500),
            date(2024, 3, 1),
            2,
        )
    }

    fn dates_in(fx: &Fixture, y: i32, m: u32) -> Vec<NaiveDate> {
        let month = BudgetMonth::new(y, m).unwrap();
        let budget = fx.storage.budgets.find(fx.family.id, month).unwrap().unwrap();
        fx.storage
            .expenses
            .get_by_budget(budget.id)
            .unwrap()
            .into_iter()
            .map(|e| e.date)
            .collect()
    }

    #[test]
    fn test_monthly_day_31_in_leap_february() {
        let fx = Fixture::new();
        add_rule(&fx, rent(&fx));
        let service = GenerationService::new(&fx.storage, &fx.settings);

        assert_eq!(service.generate(fx.family.id, 2024, 2, &fx.alice).unwrap(), 1);
        assert_eq!(dates_in(&fx, 2024, 2), vec![date(2024, 2, 29)]);
    }

    #[test]
    fn test_weekly_wednesdays_in_march() {
        let fx = Fixture::new();
        add_rule(&fx, gym(&fx));
        let service = GenerationService::new(&fx.storage, &fx.settings);

        assert_eq!(service.generate(fx.family.id, 2024, 3, &fx.alice).unwrap(), 4);
        assert_eq!(
            dates_in(&fx, 2024, 3),
            vec![
                date(2024, 3, 6),
                date(2024, 3, 13),
                date(2024, 3, 20),
                date(2024, 3, 27)
            ]
        );
    }

    #[test]
    fn test_second_generation_adds_nothing() {
        let fx = Fixture::new();
        add_rule(&fx, rent(&fx));
        add_rule(&fx, gym(&fx));
        let service = GenerationService::new(&fx.storage, &fx.settings);

        assert_eq!(service.generate(fx.family.id, 2024, 3, &fx.alice).unwrap(), 5);
        assert_eq!(service.generate(fx.family.id, 2024, 3, &fx.alice).unwrap(), 0);
        assert_eq!(fx.storage.expenses.count().unwrap(), 5);
        assert_eq!(fx.storage.budgets.count().unwrap(), 1);
    }

    #[test]
    fn test_new_rule_fills_in_only_missing_occurrences() {
        let fx = Fixture::new();
        add_rule(&fx, rent(&fx));
        let service = GenerationService::new(&fx.storage, &fx.settings);
        service.generate(fx.family.id, 2024, 3, &fx.alice).unwrap();

        add_rule(&fx, gym(&fx));
        assert_eq!(service.generate(fx.family.id, 2024, 3, &fx.alice).unwrap(), 4);
    }

    #[test]
    fn test_zero_rules_still_creates_budget() {
        let fx = Fixture::new();
        let service = GenerationService::new(&fx.storage, &fx.settings);

        assert_eq!(service.generate(fx.family.id, 2024, 7, &fx.alice).unwrap(), 0);
        let budget = fx
            .storage
            .budgets
            .find(fx.family.id, BudgetMonth::new(2024, 7).unwrap())
            .unwrap()
            .unwrap();
        assert!(budget.planned_amount.is_zero());
    }

    #[test]
    fn test_rules_outside_window_generate_nothing() {
        let fx = Fixture::new();
        add_rule(&fx, gym(&fx).with_end_date(date(2024, 3, 31)));
        let mut future = rent(&fx);
        future.start_date = date(2024, 5, 1);
        add_rule(&fx, future);
        let service = GenerationService::new(&fx.storage, &fx.settings);

        assert_eq!(service.generate(fx.family.id, 2024, 4, &fx.alice).unwrap(), 0);
    }

    #[test]
    fn test_other_family_rules_are_ignored() {
        let fx = Fixture::new();
        let other = fx.other_family();
        let mut foreign = rent(&fx);
        foreign.family_id = other.id;
        add_rule(&fx, foreign);
        let service = GenerationService::new(&fx.storage, &fx.settings);

        assert_eq!(service.generate(fx.family.id, 2024, 2, &fx.alice).unwrap(), 0);
    }

    #[test]
    fn test_invalid_month_and_unauthorized_user() {
        let fx = Fixture::new();
        let service = GenerationService::new(&fx.storage, &fx.settings);

        for (year, month) in [(2024, 0), (2024, 13), (0, 5), (10_000, 1)] {
            let err = service.generate(fx.family.id, year, month, &fx.alice).unwrap_err();
            assert!(matches!(err, BudgetError::InvalidMonth { .. }));
        }

        let err = service
            .generate(fx.family.id, 2024, 3, &UserId::new("eve"))
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(fx.storage.budgets.count().unwrap(), 0);
    }

    #[test]
    fn test_failure_rolls_back_everything() {
        let fx = Fixture::new();
        add_rule(&fx, gym(&fx));
        let mut broken = RecurringRule::new(rent(&fx), fx.alice.clone());
        broken.day_of_month = None;
        // Created later so it is expanded after the valid rule
        broken.created_at = broken.created_at + chrono::Duration::seconds(5);
        fx.storage.rules.upsert(broken).unwrap();
        let service = GenerationService::new(&fx.storage, &fx.settings);

        let err = service.generate(fx.family.id, 2024, 3, &fx.alice).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(fx.storage.expenses.count().unwrap(), 0);
        assert_eq!(fx.storage.budgets.count().unwrap(), 0);
        assert!(fx.storage.audit().read_all().unwrap().iter().all(|e| {
            e.entity_type != crate::audit::EntityType::Expense
        }));

        let reopened = Storage::open(fx.storage.paths().clone()).unwrap();
        assert_eq!(reopened.budgets.count().unwrap(), 0);
    }

    #[test]
    fn test_epoch_anchor_setting() {
        let mut fx = Fixture::new();
        fx.settings.anchor_mode = AnchorMode::Epoch;
        let mut fields = gym(&fx);
        fields.kind = crate::models::RecurrenceKind::Biweekly;
        fields.start_date = date(2024, 1, 1);
        fields.day_of_week = Some(0);
        add_rule(&fx, fields);
        let service = GenerationService::new(&fx.storage, &fx.settings);

        service.generate(fx.family.id, 2024, 1, &fx.alice).unwrap();
        assert_eq!(dates_in(&fx, 2024, 1), vec![date(2024, 1, 8), date(2024, 1, 22)]);
    }

    #[test]
    fn test_generated_expenses_are_audited() {
        let fx = Fixture::new();
        add_rule(&fx, gym(&fx));
        let service = GenerationService::new(&fx.storage, &fx.settings);
        service.generate(fx.family.id, 2024, 3, &fx.alice).unwrap();

        let entries = fx.storage.audit().read_all().unwrap();
        let expenses = entries
            .iter()
            .filter(|e| e.entity_type == crate::audit::EntityType::Expense)
            .count();
        assert_eq!(expenses, 4);
        assert!(entries.iter().all(|e| e.actor == fx.alice));
    }
}
