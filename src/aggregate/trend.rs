//! Period-over-period spending trend.

use crate::{aggregate::valid_amounts, model::Transaction};

/// How many transactions make up each comparison window.
const TREND_SAMPLE_SIZE: usize = 5;

/// Direction of the spending trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    /// Recent transactions average higher than the preceding window.
    Increasing,
    /// Recent transactions average lower than the preceding window.
    Decreasing,
    /// No change, or not enough data to compare.
    Flat,
}

/// Percentage change between the most recent transactions and the preceding
/// window. Negative percent means spending is decreasing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendDelta {
    /// Signed percentage change.
    pub percent: f64,
    /// Sign of the change.
    pub direction: TrendDirection,
}

impl TrendDelta {
    /// A zero delta: no data, or no preceding window to compare against.
    pub fn flat() -> Self {
        Self {
            percent: 0.0,
            direction: TrendDirection::Flat,
        }
    }
}

/// Compare the average of the five most recent transactions (by date,
/// descending) against the average of the preceding five.
///
/// Fewer than two transactions, or an empty preceding window, yields a flat
/// delta. The division is guarded so no input can produce NaN or infinity.
pub fn trend_delta(transactions: &[Transaction]) -> TrendDelta {
    let mut by_date: Vec<&Transaction> = valid_amounts(transactions).collect();

    if by_date.len() < 2 {
        return TrendDelta::flat();
    }

    by_date.sort_by(|a, b| b.date.cmp(&a.date));

    let recent = &by_date[..TREND_SAMPLE_SIZE.min(by_date.len())];
    let previous = &by_date[recent.len()..(TREND_SAMPLE_SIZE * 2).min(by_date.len())];

    if previous.is_empty() {
        return TrendDelta::flat();
    }

    let recent_average =
        recent.iter().map(|t| t.amount).sum::<f64>() / recent.len() as f64;
    let previous_average =
        previous.iter().map(|t| t.amount).sum::<f64>() / previous.len() as f64;

    // Cannot be zero once invalid amounts are filtered out, but the guard
    // keeps the contract airtight.
    if previous_average == 0.0 {
        return TrendDelta::flat();
    }

    let percent = (recent_average - previous_average) / previous_average * 100.0;
    let direction = if percent > 0.0 {
        TrendDirection::Increasing
    } else if percent < 0.0 {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Flat
    };

    TrendDelta { percent, direction }
}

#[cfg(test)]
mod trend_tests {
    use time::{Date, Duration, macros::date};

    use super::{TrendDelta, TrendDirection, trend_delta};
    use crate::model::Transaction;

    fn transaction(id: &str, amount: f64, date: Date) -> Transaction {
        Transaction::new(id.to_owned(), "Test", amount, date, None, None).unwrap()
    }

    /// `amounts[0]` is the most recent transaction.
    fn descending_series(amounts: &[f64]) -> Vec<Transaction> {
        let newest = date!(2024 - 06 - 30);

        amounts
            .iter()
            .enumerate()
            .map(|(index, &amount)| {
                transaction(
                    &format!("t{index}"),
                    amount,
                    newest - Duration::days(index as i64),
                )
            })
            .collect()
    }

    #[test]
    fn empty_collection_is_flat() {
        assert_eq!(trend_delta(&[]), TrendDelta::flat());
    }

    #[test]
    fn single_transaction_is_flat() {
        let transactions = descending_series(&[100.0]);

        assert_eq!(trend_delta(&transactions), TrendDelta::flat());
    }

    #[test]
    fn five_or_fewer_transactions_have_no_preceding_window() {
        let transactions = descending_series(&[10.0, 20.0, 30.0, 40.0, 50.0]);

        assert_eq!(trend_delta(&transactions), TrendDelta::flat());
    }

    #[test]
    fn rising_spend_reports_positive_percent() {
        // Recent five average 200, preceding five average 100.
        let transactions =
            descending_series(&[200.0; 5].iter().chain(&[100.0; 5]).copied().collect::<Vec<_>>());

        let delta = trend_delta(&transactions);

        assert_eq!(delta.percent, 100.0);
        assert_eq!(delta.direction, TrendDirection::Increasing);
    }

    #[test]
    fn falling_spend_preserves_the_negative_sign() {
        let transactions =
            descending_series(&[50.0; 5].iter().chain(&[100.0; 5]).copied().collect::<Vec<_>>());

        let delta = trend_delta(&transactions);

        assert_eq!(delta.percent, -50.0);
        assert_eq!(delta.direction, TrendDirection::Decreasing);
    }

    #[test]
    fn short_preceding_window_still_compares() {
        // Six transactions: recent five vs a preceding window of one.
        let transactions = descending_series(&[120.0, 120.0, 120.0, 120.0, 120.0, 100.0]);

        let delta = trend_delta(&transactions);

        assert_eq!(delta.percent, 20.0);
        assert_eq!(delta.direction, TrendDirection::Increasing);
    }
}
