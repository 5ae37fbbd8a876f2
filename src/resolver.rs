//! Maps a transaction's category reference to a display name and color.
//!
//! The reserved "Other" category is special: its true label is a free-text
//! field on the transaction, not a row in the category table. Everything that
//! needs to answer "is this a custom category" goes through [CategoryResolver]
//! so the answer is derived exactly one way.

use std::collections::HashMap;

use crate::model::{Category, OTHER_CATEGORY_ID, Transaction};

/// Fallback label for dangling or absent category references.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Neutral placeholder color for unresolvable references.
pub const UNKNOWN_COLOR: &str = "#94a3b8";

/// Fixed palette for custom categories, assigned in first-seen order of
/// distinct custom names within one resolver instance.
const CUSTOM_PALETTE: [&str; 8] = [
    "#10b981", "#3b82f6", "#8b5cf6", "#f59e0b", "#ec4899", "#ef4444", "#06b6d4", "#6b7280",
];

/// A transaction's category as it should be displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCategory {
    /// Effective display label.
    pub name: String,
    /// Hex display color.
    pub color: String,
    /// Whether the label came from the transaction's own free-text field
    /// (a reserved-"Other" reference) rather than the category table.
    pub is_custom: bool,
}

/// Resolves category references against the current category set.
///
/// Custom-category colors are presentation-only and keyed by first-seen
/// order, so create a fresh resolver for each aggregation pass; reusing one
/// across passes would leak color assignments between unrelated recomputes.
pub struct CategoryResolver<'a> {
    by_id: HashMap<&'a str, &'a Category>,
    custom_colors: HashMap<String, &'static str>,
}

impl<'a> CategoryResolver<'a> {
    /// Create a resolver over the current category set.
    pub fn new(categories: &'a [Category]) -> Self {
        Self {
            by_id: categories
                .iter()
                .map(|category| (category.id.as_str(), category))
                .collect(),
            custom_colors: HashMap::new(),
        }
    }

    /// Resolve a transaction's effective category.
    ///
    /// Never fails: a reference to a category that has since been deleted, or
    /// a transaction with no category at all, falls back to [UNKNOWN_LABEL]
    /// with a neutral color.
    pub fn resolve(&mut self, transaction: &Transaction) -> ResolvedCategory {
        match transaction.category_id.as_deref() {
            Some(OTHER_CATEGORY_ID) => {
                let name = transaction
                    .custom_label
                    .as_deref()
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .unwrap_or("Other")
                    .to_owned();
                let color = self.custom_color_for(&name).to_owned();

                ResolvedCategory {
                    name,
                    color,
                    is_custom: true,
                }
            }
            Some(id) => match self.by_id.get(id) {
                Some(category) => ResolvedCategory {
                    name: category.name.clone(),
                    color: category.color.clone(),
                    is_custom: false,
                },
                None => ResolvedCategory {
                    name: UNKNOWN_LABEL.to_owned(),
                    color: UNKNOWN_COLOR.to_owned(),
                    is_custom: false,
                },
            },
            // Incomes carry no category reference.
            None => ResolvedCategory {
                name: UNKNOWN_LABEL.to_owned(),
                color: UNKNOWN_COLOR.to_owned(),
                is_custom: false,
            },
        }
    }

    fn custom_color_for(&mut self, name: &str) -> &'static str {
        if let Some(color) = self.custom_colors.get(name) {
            return color;
        }

        let color = CUSTOM_PALETTE[self.custom_colors.len() % CUSTOM_PALETTE.len()];
        self.custom_colors.insert(name.to_owned(), color);
        color
    }
}
