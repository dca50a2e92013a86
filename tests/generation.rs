//! End-to-end generation through the public library API

use chrono::NaiveDate;
use tempfile::TempDir;

use family_budget::config::{paths::BudgetPaths, settings::Settings};
use family_budget::models::{BudgetMonth, Family, FamilyId, Money, NewRule, UserId};
use family_budget::services::{
    CategoryService, ExpenseService, FamilyService, GenerationService, ManualExpense,
    Membership, RuleService,
};
use family_budget::storage::Storage;
use family_budget::BudgetResult;

struct Household {
    _temp_dir: TempDir,
    paths: BudgetPaths,
    storage: Storage,
    settings: Settings,
    user: UserId,
    family: Family,
    rent: NewRule,
    gym: NewRule,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn household() -> Household {
    let temp_dir = TempDir::new().unwrap();
    let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
    let storage = Storage::open(paths.clone()).unwrap();
    let user = UserId::new("alice");

    let family = FamilyService::new(&storage).create("Smith", &user).unwrap();
    let categories = CategoryService::new(&storage);
    let housing = categories.create_category(family.id, "Housing", &user).unwrap();
    let health = categories.create_category(family.id, "Health", &user).unwrap();
    let card = categories
        .create_payment_type(family.id, "Card", &user)
        .unwrap();

    let rent = NewRule::monthly(
        family.id,
        housing.id,
        card.id,
        "Rent",
        Money::from_cents(150_000),
        date(2024, 1, 1),
        31,
    );
    let gym = NewRule::weekly(
        family.id,
        health.id,
        card.id,
        "Gym",
        Money::from_cents(1_500),
        date(2024, 3, 1),
        2,
    );

    Household {
        _temp_dir: temp_dir,
        paths,
        storage,
        settings: Settings::default(),
        user,
        family,
        rent,
        gym,
    }
}

fn expense_dates(storage: &Storage, family: FamilyId, y: i32, m: u32) -> Vec<NaiveDate> {
    let month = BudgetMonth::new(y, m).unwrap();
    let budget = storage.budgets.find(family, month).unwrap().unwrap();
    storage
        .expenses
        .get_by_budget(budget.id)
        .unwrap()
        .into_iter()
        .map(|e| e.date)
        .collect()
}

#[test]
fn leap_february_and_weekly_march() {
    let h = household();
    let rules = RuleService::new(&h.storage);
    rules.create(h.rent.clone(), &h.user).unwrap();
    rules.create(h.gym.clone(), &h.user).unwrap();
    let generation = GenerationService::new(&h.storage, &h.settings);

    assert_eq!(generation.generate(h.family.id, 2024, 2, &h.user).unwrap(), 1);
    assert_eq!(
        expense_dates(&h.storage, h.family.id, 2024, 2),
        vec![date(2024, 2, 29)]
    );

    assert_eq!(generation.generate(h.family.id, 2024, 3, &h.user).unwrap(), 5);
    assert_eq!(
        expense_dates(&h.storage, h.family.id, 2024, 3),
        vec![
            date(2024, 3, 6),
            date(2024, 3, 13),
            date(2024, 3, 20),
            date(2024, 3, 27),
            date(2024, 3, 31)
        ]
    );
}

#[test]
fn generation_survives_reload_and_stays_idempotent() {
    let h = household();
    RuleService::new(&h.storage)
        .create(h.gym.clone(), &h.user)
        .unwrap();
    GenerationService::new(&h.storage, &h.settings)
        .generate(h.family.id, 2024, 3, &h.user)
        .unwrap();

    let reopened = Storage::open(h.paths.clone()).unwrap();
    let again = GenerationService::new(&reopened, &h.settings)
        .generate(h.family.id, 2024, 3, &h.user)
        .unwrap();
    assert_eq!(again, 0);
    assert_eq!(reopened.expenses.count().unwrap(), 4);
}

#[test]
fn manual_entry_and_generation_share_the_budget() {
    let h = household();
    let categories = CategoryService::new(&h.storage);
    let housing = categories
        .find_category(h.family.id, "Housing", None)
        .unwrap()
        .unwrap();
    let card = categories
        .find_payment_type(h.family.id, "Card")
        .unwrap()
        .unwrap();

    ExpenseService::new(&h.storage)
        .add(
            ManualExpense {
                family_id: h.family.id,
                category_id: housing.id,
                subcategory_id: None,
                payment_type_id: card.id,
                description: "Plumber".into(),
                amount: Money::from_cents(9_000),
                date: date(2024, 2, 10),
            },
            &h.user,
        )
        .unwrap();

    RuleService::new(&h.storage)
        .create(h.rent.clone(), &h.user)
        .unwrap();
    GenerationService::new(&h.storage, &h.settings)
        .generate(h.family.id, 2024, 2, &h.user)
        .unwrap();

    assert_eq!(h.storage.budgets.count().unwrap(), 1);
    assert_eq!(
        expense_dates(&h.storage, h.family.id, 2024, 2),
        vec![date(2024, 2, 10), date(2024, 2, 29)]
    );
}

/// Grants access to everyone, standing in for an external authorization service
struct OpenDoor;

impl Membership for OpenDoor {
    fn is_member(&self, _family_id: FamilyId, _user: &UserId) -> BudgetResult<bool> {
        Ok(true)
    }
}

#[test]
fn membership_can_be_supplied_externally() {
    let h = household();
    let outsider = UserId::new("service-account");
    let generation = GenerationService::new(&h.storage, &h.settings);
    assert!(generation
        .generate(h.family.id, 2024, 3, &outsider)
        .unwrap_err()
        .is_unauthorized());

    let open = OpenDoor;
    let generation = GenerationService::new(&h.storage, &h.settings).with_membership(&open);
    assert_eq!(generation.generate(h.family.id, 2024, 3, &outsider).unwrap(), 0);
}

#[test]
fn second_handle_sees_first_handles_generation() {
    let h = household();
    let other = Storage::open(h.paths.clone()).unwrap();

    RuleService::new(&h.storage)
        .create(h.gym.clone(), &h.user)
        .unwrap();
    let categories = CategoryService::new(&h.storage);
    let housing = categories
        .find_category(h.family.id, "Housing", None)
        .unwrap()
        .unwrap();
    let card = categories
        .find_payment_type(h.family.id, "Card")
        .unwrap()
        .unwrap();
    ExpenseService::new(&h.storage)
        .add(
            ManualExpense {
                family_id: h.family.id,
                category_id: housing.id,
                subcategory_id: None,
                payment_type_id: card.id,
                description: "Plumber".into(),
                amount: Money::from_cents(9_000),
                date: date(2024, 3, 2),
            },
            &h.user,
        )
        .unwrap();

    let first = GenerationService::new(&h.storage, &h.settings)
        .generate(h.family.id, 2024, 3, &h.user)
        .unwrap();
    let second = GenerationService::new(&other, &h.settings)
        .generate(h.family.id, 2024, 3, &h.user)
        .unwrap();
    assert_eq!((first, second), (4, 0));

    let reopened = Storage::open(h.paths.clone()).unwrap();
    assert_eq!(reopened.budgets.count().unwrap(), 1);
    assert_eq!(reopened.expenses.count().unwrap(), 5);
    assert_eq!(expense_dates(&reopened, h.family.id, 2024, 3).len(), 5);
}

#[test]
fn concurrent_generation_from_two_handles_creates_one_set() {
    let h = household();
    RuleService::new(&h.storage)
        .create(h.gym.clone(), &h.user)
        .unwrap();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let paths = h.paths.clone();
            let settings = h.settings.clone();
            let user = h.user.clone();
            let family_id = h.family.id;
            std::thread::spawn(move || {
                let storage = Storage::open(paths).unwrap();
                GenerationService::new(&storage, &settings)
                    .generate(family_id, 2024, 3, &user)
                    .unwrap()
            })
        })
        .collect();
    let mut counts: Vec<usize> = handles.into_iter().map(|t| t.join().unwrap()).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![0, 4]);

    let reopened = Storage::open(h.paths.clone()).unwrap();
    assert_eq!(reopened.budgets.count().unwrap(), 1);
    assert_eq!(reopened.expenses.count().unwrap(), 4);
}
