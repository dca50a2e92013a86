//! Expense, credit and budget display formatting

use crate::models::{Credit, Expense, Money};
use crate::services::BudgetSummary;

/// Format a month's expenses as a table with a total row
pub fn format_expense_list(expenses: &[Expense], currency: &str) -> String {
    if expenses.is_empty() {
        return "No expenses found.\n".to_string();
    }

    let desc_width = expenses
        .iter()
        .map(|e| e.description.len())
        .max()
        .unwrap_or(11)
        .max(11);

    let mut output = format!(
        "{:<10}  {:<desc_width$}  {:>12}  {}\n",
        "Date",
        "Description",
        "Amount",
        "Source",
        desc_width = desc_width,
    );
    output.push_str(&format!(
        "{:-<10}  {:-<desc_width$}  {:->12}  {:-<9}\n",
        "",
        "",
        "",
        "",
        desc_width = desc_width,
    ));

    for expense in expenses {
        output.push_str(&format!(
            "{:<10}  {:<desc_width$}  {:>12}  {}\n",
            expense.date.format("%Y-%m-%d").to_string(),
            expense.description,
            expense.amount.format_with_symbol(currency),
            if expense.is_generated() { "recurring" } else { "manual" },
            desc_width = desc_width,
        ));
    }

    let total: Money = expenses.iter().map(|e| e.amount).sum();
    output.push_str(&format!(
        "{:<10}  {:<desc_width$}  {:>12}\n",
        "",
        "Total",
        total.format_with_symbol(currency),
        desc_width = desc_width,
    ));
    output
}

pub fn format_credit_list(credits: &[Credit], currency: &str) -> String {
    if credits.is_empty() {
        return "No credits.\n".to_string();
    }

    let desc_width = credits
        .iter()
        .map(|c| c.description.len())
        .max()
        .unwrap_or(0)
        .max("Description".len());

    let mut output = format!(
        "{:<10}  {:<desc_width$}  {:>12}\n",
        "Date",
        "Description",
        "Amount",
        desc_width = desc_width,
    );
    for credit in credits {
        output.push_str(&format!(
            "{:<10}  {:<desc_width$}  {:>12}\n",
            credit.date.to_string(),
            credit.description,
            credit.amount.format_with_symbol(currency),
            desc_width = desc_width,
        ));
    }
    output
}

pub fn format_budget_summary(summary: &BudgetSummary, currency: &str) -> String {
    let mut output = format!("Budget {}\n", summary.budget.month);
    output.push_str(&format!(
        "  Planned:   {:>12}\n",
        summary.budget.planned_amount.format_with_symbol(currency)
    ));
    output.push_str(&format!(
        "  Spent:     {:>12}\n",
        summary.spent.format_with_symbol(currency)
    ));
    if summary.credits > 0 {
        output.push_str(&format!(
            "  Credited:  {:>12}\n",
            summary.credited.format_with_symbol(currency)
        ));
    }
    output.push_str(&format!(
        "  Remaining: {:>12}\n",
        summary.remaining.format_with_symbol(currency)
    ));
    output.push_str(&format!(
        "  Expenses:  {} recurring, {} manual\n",
        summary.generated, summary.manual
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetId, CategoryId, PaymentTypeId, UserId};
    use chrono::NaiveDate;

    #[test]
    fn test_expense_list_total() {
        let budget = BudgetId::new();
        let date = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let mut a = Expense::new(
            budget,
            CategoryId::new(),
            PaymentTypeId::new(),
            Money::from_cents(1_500),
            date,
            UserId::new("alice"),
        );
        a.description = "Groceries".into();
        let b = Expense::new(
            budget,
            CategoryId::new(),
            PaymentTypeId::new(),
            Money::from_cents(2_500),
            date,
            UserId::new("alice"),
        );

        let output = format_expense_list(&[a, b], "€");
        assert!(output.contains("Groceries"));
        assert!(output.contains("manual"));
        assert!(output.lines().last().unwrap().contains("€40.00"));
    }

    #[test]
    fn test_credit_list() {
        assert_eq!(format_credit_list(&[], "$"), "No credits.\n");

        let credit = Credit::new(
            BudgetId::new(),
            "Refund",
            Money::from_cents(1_250),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            UserId::new("alice"),
        );
        let output = format_credit_list(&[credit], "$");
        assert_eq!(output.lines().count(), 2);
        assert!(output.contains("2024-03-09"));
        assert!(output.contains("$12.50"));
    }
}
