//! Category and date-range filtering over a transaction collection.

use time::Date;

use crate::model::{CategoryId, Transaction};

/// Filter criteria for a transaction collection.
///
/// Every field is optional; the default filter matches everything. Criteria
/// compose with logical AND and the date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Keep only transactions referencing this category.
    pub category_id: Option<CategoryId>,
    /// Keep only transactions on or after this date.
    pub date_from: Option<Date>,
    /// Keep only transactions on or before this date.
    pub date_to: Option<Date>,
}

impl TransactionFilter {
    /// Whether `transaction` satisfies every criterion.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        let matches_category = match &self.category_id {
            Some(category_id) => transaction.category_id.as_ref() == Some(category_id),
            None => true,
        };
        let after_from = self
            .date_from
            .is_none_or(|from| transaction.date >= from);
        let before_to = self.date_to.is_none_or(|to| transaction.date <= to);

        matches_category && after_from && before_to
    }
}

/// Apply `filter` to `transactions`, preserving their relative order.
///
/// Pure and cheap enough to call on every recompute; the fetch layer already
/// delivers transactions sorted by date descending and that order survives
/// filtering.
pub fn filter_transactions(
    transactions: &[Transaction],
    filter: &TransactionFilter,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| filter.matches(transaction))
        .cloned()
        .collect()
}
