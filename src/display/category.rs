//! Category display formatting

use crate::models::{Category, PaymentType};

/// Top-level categories with their subcategories indented underneath
pub fn format_category_tree(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.\n".to_string();
    }

    let mut output = String::new();
    for parent in categories.iter().filter(|c| c.parent_id.is_none()) {
        output.push_str(&format!("{}  ({})\n", parent.name, parent.id));
        for child in categories.iter().filter(|c| c.is_child_of(parent.id)) {
            output.push_str(&format!("  - {}  ({})\n", child.name, child.id));
        }
    }
    output
}

pub fn format_payment_types(payment_types: &[PaymentType]) -> String {
    if payment_types.is_empty() {
        return "No payment types found.\n".to_string();
    }

    payment_types
        .iter()
        .map(|p| format!("{}  ({})\n", p.name, p.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FamilyId;

    #[test]
    fn test_tree_nests_children() {
        let family = FamilyId::new();
        let food = Category::new(family, "Food");
        let groceries = Category::subcategory(family, "Groceries", food.id);
        let output = format_category_tree(&[food, groceries]);

        let lines: Vec<_> = output.lines().collect();
        assert!(lines[0].starts_with("Food"));
        assert!(lines[1].starts_with("  - Groceries"));
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(format_category_tree(&[]), "No categories found.\n");
        assert_eq!(format_payment_types(&[]), "No payment types found.\n");
    }
}
