//! Recurring rule display formatting

use crate::models::{RecurrenceKind, RecurringRule};

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// "every Wed", "every other Fri", "monthly on day 31"
pub fn describe_schedule(rule: &RecurringRule) -> String {
    let weekday = rule
        .day_of_week
        .and_then(|d| WEEKDAYS.get(usize::from(d)))
        .copied()
        .unwrap_or("?");
    match rule.kind {
        RecurrenceKind::Weekly => format!("every {}", weekday),
        RecurrenceKind::Biweekly => format!("every other {}", weekday),
        RecurrenceKind::Monthly => match rule.day_of_month {
            Some(day) => format!("monthly on day {}", day),
            None => "monthly".to_string(),
        },
    }
}

fn describe_window(rule: &RecurringRule) -> String {
    match rule.end_date {
        Some(end) => format!("{} to {}", rule.start_date, end),
        None => format!("from {}", rule.start_date),
    }
}

/// Format rules as a table
pub fn format_rule_list(rules: &[RecurringRule], currency: &str) -> String {
    if rules.is_empty() {
        return "No recurring rules found.\n".to_string();
    }

    let desc_width = rules
        .iter()
        .map(|r| r.description.len())
        .max()
        .unwrap_or(11)
        .max(11);

    let mut output = format!(
        "{:<desc_width$}  {:>12}  {:<20}  {:<26}  {}\n",
        "Description",
        "Amount",
        "Schedule",
        "Active",
        "ID",
        desc_width = desc_width,
    );
    output.push_str(&format!(
        "{:-<desc_width$}  {:->12}  {:-<20}  {:-<26}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        desc_width = desc_width,
    ));

    for rule in rules {
        output.push_str(&format!(
            "{:<desc_width$}  {:>12}  {:<20}  {:<26}  {}\n",
            rule.description,
            rule.amount.format_with_symbol(currency),
            describe_schedule(rule),
            describe_window(rule),
            rule.id,
            desc_width = desc_width,
        ));
    }

    output
}

/// Format a single rule with all of its fields
pub fn format_rule_details(rule: &RecurringRule, currency: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("Rule:        {}\n", rule.description));
    output.push_str(&format!("ID:          {}\n", rule.id));
    output.push_str(&format!("Amount:      {}\n", rule.amount.format_with_symbol(currency)));
    output.push_str(&format!("Schedule:    {}\n", describe_schedule(rule)));
    output.push_str(&format!("Active:      {}\n", describe_window(rule)));
    output.push_str(&format!("Category:    {}\n", rule.category_id));
    if let Some(sub) = rule.subcategory_id {
        output.push_str(&format!("Subcategory: {}\n", sub));
    }
    output.push_str(&format!("Payment:     {}\n", rule.payment_type_id));
    output.push_str(&format!(
        "Created:     {} by {}\n",
        rule.created_at.format("%Y-%m-%d %H:%M"),
        rule.created_by
    ));
    if rule.updated_at != rule.created_at {
        output.push_str(&format!(
            "Updated:     {} by {}\n",
            rule.updated_at.format("%Y-%m-%d %H:%M"),
            rule.updated_by
        ));
    }
    output
}
