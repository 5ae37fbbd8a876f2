//! Category breakdown slices for pie and bar charts.

use std::{cmp::Ordering, collections::HashMap};

use crate::{
    aggregate::valid_amounts,
    model::{Category, Transaction},
    resolver::CategoryResolver,
};

/// An aggregate total attributed to one effective category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySlice {
    /// Effective category label.
    pub name: String,
    /// Hex display color.
    pub color: String,
    /// Sum of the amounts attributed to this category.
    pub total: f64,
    /// Whether this slice came from a custom ("Other"-derived) category.
    pub is_custom: bool,
}

/// Group transactions by their effective category label.
///
/// Custom categories are tracked separately from standard ones even when the
/// labels collide. Standard slices sort before custom slices; within each
/// group, descending by total, with ties kept in first-encounter order.
///
/// The sum of all slice totals equals the sum of all (valid) transaction
/// amounts: every transaction lands in exactly one slice.
pub fn category_slices(
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<CategorySlice> {
    let mut resolver = CategoryResolver::new(categories);
    let mut slices: Vec<CategorySlice> = Vec::new();
    let mut index_by_key: HashMap<(String, bool), usize> = HashMap::new();

    for transaction in valid_amounts(transactions) {
        let resolved = resolver.resolve(transaction);
        let key = (resolved.name.clone(), resolved.is_custom);

        match index_by_key.get(&key) {
            Some(&index) => slices[index].total += transaction.amount,
            None => {
                index_by_key.insert(key, slices.len());
                slices.push(CategorySlice {
                    name: resolved.name,
                    color: resolved.color,
                    total: transaction.amount,
                    is_custom: resolved.is_custom,
                });
            }
        }
    }

    // Stable sort keeps encounter order for equal totals.
    slices.sort_by(|a, b| {
        a.is_custom.cmp(&b.is_custom).then(
            b.total
                .partial_cmp(&a.total)
                .unwrap_or(Ordering::Equal),
        )
    });

    slices
}

/// The largest slice, standard categories taking precedence over custom
/// ones. `None` when the collection is empty.
pub fn top_category(
    transactions: &[Transaction],
    categories: &[Category],
) -> Option<CategorySlice> {
    category_slices(transactions, categories).into_iter().next()
}
