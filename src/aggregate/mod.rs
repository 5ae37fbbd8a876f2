//! Pure projections over a transaction collection: totals, category slices,
//! trailing-month buckets, and trend deltas.
//!
//! Every function here treats an empty collection as valid input and returns
//! the zero value for its metric. Malformed amounts that slip past upstream
//! validation are skipped rather than summed, so one bad row can never
//! corrupt a total. Nothing in this module holds state, so callers may
//! recompute from any trigger without coordination.

mod months;
mod slices;
mod trend;

pub use months::{
    COMPARISON_WINDOW_MONTHS, DASHBOARD_WINDOW_MONTHS, MonthBucket, MonthlyComparison,
    monthly_comparison, monthly_totals,
};
pub use slices::{CategorySlice, category_slices, top_category};
pub use trend::{TrendDelta, TrendDirection, trend_delta};

use crate::model::Transaction;

/// The transactions whose amounts are safe to fold into a sum.
///
/// Entry-time validation lives in the form layer and the fetch-boundary
/// transform, but neither can be fully trusted, so aggregation re-checks.
pub(crate) fn valid_amounts(transactions: &[Transaction]) -> impl Iterator<Item = &Transaction> {
    transactions.iter().filter(|transaction| {
        let valid = transaction.amount.is_finite() && transaction.amount > 0.0;

        if !valid {
            tracing::warn!(
                "skipping transaction {} with invalid amount {}",
                transaction.id,
                transaction.amount
            );
        }

        valid
    })
}

/// Sum of all transaction amounts. Zero for an empty collection.
pub fn total_amount(transactions: &[Transaction]) -> f64 {
    valid_amounts(transactions)
        .map(|transaction| transaction.amount)
        .sum()
}

/// Mean amount per transaction. Zero for an empty collection; never divides
/// by zero.
pub fn average_amount(transactions: &[Transaction]) -> f64 {
    let (count, total) = valid_amounts(transactions).fold((0usize, 0.0), |(count, total), t| {
        (count + 1, total + t.amount)
    });

    if count == 0 { 0.0 } else { total / count as f64 }
}
