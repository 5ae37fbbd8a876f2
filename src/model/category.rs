//! Core category domain types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// Identifier for a category, assigned by the data source.
pub type CategoryId = String;

/// The reserved category id whose true display label lives on the
/// transaction itself rather than in the category table.
///
/// Transactions referencing this id are "custom" categories: their effective
/// label is the transaction's own free-text label. The row with this id is a
/// valid reference target but is hidden from picker lists.
pub const OTHER_CATEGORY_ID: &str = "other";

/// A spending category with a display name and hex display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Opaque identifier, assigned by the data source.
    pub id: CategoryId,
    /// Display name, e.g. "Food & Dining".
    pub name: String,
    /// Display color as a hex string, e.g. "#10b981".
    pub color: String,
}

impl Category {
    /// Build a typed category from an untyped data source row.
    ///
    /// # Errors
    ///
    /// Returns [Error::MalformedRow] when a required field is missing, of the
    /// wrong shape, or empty.
    pub fn from_row(row: &Value) -> Result<Self, Error> {
        let category: Category = serde_json::from_value(row.clone())
            .map_err(|error| Error::MalformedRow(error.to_string()))?;

        if category.id.is_empty() || category.name.is_empty() {
            return Err(Error::MalformedRow(
                "category id and name cannot be empty".to_owned(),
            ));
        }

        Ok(category)
    }

    /// The category set a fresh install starts with, including the reserved
    /// "Other" row.
    pub fn defaults() -> Vec<Category> {
        [
            ("food", "Food & Dining", "#10b981"),
            ("bills", "Bills & Utilities", "#3b82f6"),
            ("entertainment", "Entertainment", "#8b5cf6"),
            ("transportation", "Transportation", "#f59e0b"),
            ("shopping", "Shopping", "#ec4899"),
            ("health", "Health & Medical", "#ef4444"),
            ("travel", "Travel", "#06b6d4"),
            (OTHER_CATEGORY_ID, "Other", "#6b7280"),
        ]
        .into_iter()
        .map(|(id, name, color)| Category {
            id: id.to_owned(),
            name: name.to_owned(),
            color: color.to_owned(),
        })
        .collect()
    }
}

/// The categories shown by pickers: every category except the reserved
/// [OTHER_CATEGORY_ID] row, in the order given.
pub fn picker_categories(categories: &[Category]) -> Vec<Category> {
    categories
        .iter()
        .filter(|category| category.id != OTHER_CATEGORY_ID)
        .cloned()
        .collect()
}

#[cfg(test)]
mod category_tests {
    use serde_json::json;

    use super::{Category, OTHER_CATEGORY_ID, picker_categories};
    use crate::Error;

    #[test]
    fn from_row_builds_category() {
        let row = json!({"id": "food", "name": "Food & Dining", "color": "#10b981"});

        let category = Category::from_row(&row).unwrap();

        assert_eq!(category.id, "food");
        assert_eq!(category.name, "Food & Dining");
        assert_eq!(category.color, "#10b981");
    }

    #[test]
    fn from_row_rejects_missing_name() {
        let row = json!({"id": "food", "color": "#10b981"});

        let result = Category::from_row(&row);

        assert!(matches!(result, Err(Error::MalformedRow(_))));
    }

    #[test]
    fn from_row_rejects_empty_id() {
        let row = json!({"id": "", "name": "Food", "color": "#10b981"});

        let result = Category::from_row(&row);

        assert!(matches!(result, Err(Error::MalformedRow(_))));
    }

    #[test]
    fn defaults_include_reserved_other_row() {
        let defaults = Category::defaults();

        assert!(defaults.iter().any(|category| {
            category.id == OTHER_CATEGORY_ID && category.name == "Other"
        }));
    }

    #[test]
    fn picker_excludes_reserved_other_row() {
        let categories = Category::defaults();

        let picker = picker_categories(&categories);

        assert_eq!(picker.len(), categories.len() - 1);
        assert!(picker.iter().all(|category| category.id != OTHER_CATEGORY_ID));
    }
}
