//! Trailing calendar-month windows and the buckets that accumulate into
//! them.
//!
//! A window always has exactly N consecutive months ending at the anchor
//! month. Months with no transactions report zero rather than being omitted,
//! so chart x-axes stay fixed regardless of data sparsity.

use time::{Date, Month};

use crate::{aggregate::valid_amounts, model::Transaction};

/// Number of trailing months on single-view dashboard charts.
pub const DASHBOARD_WINDOW_MONTHS: usize = 6;

/// Number of trailing months on the income/expense comparison view.
pub const COMPARISON_WINDOW_MONTHS: usize = 12;

/// A calendar-month accumulation bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    /// Three-letter month label, e.g. "Jan".
    pub label: String,
    /// Sum of the amounts dated within this month.
    pub total: f64,
}

/// Per-month income and expense totals with the derived profit.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyComparison {
    /// Month label with a two-digit year, e.g. "Jan 24".
    pub label: String,
    /// Income total for the month.
    pub income: f64,
    /// Expense total for the month.
    pub expense: f64,
    /// income − expense for the month.
    pub profit: f64,
}

/// Totals per month over the trailing `window` months ending at `anchor`'s
/// month.
///
/// Always returns exactly `window` buckets in chronological order.
/// Transactions dated outside the window are ignored, not an error.
pub fn monthly_totals(
    transactions: &[Transaction],
    anchor: Date,
    window: usize,
) -> Vec<MonthBucket> {
    let months = trailing_month_firsts(anchor, window);
    let totals = accumulate_by_month(transactions, &months);

    months
        .iter()
        .zip(totals)
        .map(|(month, total)| MonthBucket {
            label: month_abbrev(month.month()).to_owned(),
            total,
        })
        .collect()
}

/// Income and expense totals folded onto one shared twelve-month window,
/// with per-month profit derived as income − expense.
///
/// Both collections are keyed by the same (year, month) scheme, so identical
/// calendar months merge correctly even when only one collection has entries
/// for a month.
pub fn monthly_comparison(
    incomes: &[Transaction],
    expenses: &[Transaction],
    anchor: Date,
) -> Vec<MonthlyComparison> {
    let months = trailing_month_firsts(anchor, COMPARISON_WINDOW_MONTHS);
    let income_totals = accumulate_by_month(incomes, &months);
    let expense_totals = accumulate_by_month(expenses, &months);

    months
        .iter()
        .enumerate()
        .map(|(index, month)| MonthlyComparison {
            label: format!(
                "{} {:02}",
                month_abbrev(month.month()),
                month.year().rem_euclid(100)
            ),
            income: income_totals[index],
            expense: expense_totals[index],
            profit: income_totals[index] - expense_totals[index],
        })
        .collect()
}

/// Sum amounts into the bucket matching each transaction's (year, month).
fn accumulate_by_month(transactions: &[Transaction], months: &[Date]) -> Vec<f64> {
    let mut totals = vec![0.0; months.len()];

    for transaction in valid_amounts(transactions) {
        let month_first = first_of_month(transaction.date);

        if let Some(index) = months.iter().position(|&month| month == month_first) {
            totals[index] += transaction.amount;
        }
    }

    totals
}

/// The first days of the `window` consecutive months ending at `anchor`'s
/// month, in chronological order.
fn trailing_month_firsts(anchor: Date, window: usize) -> Vec<Date> {
    if window == 0 {
        return Vec::new();
    }

    let mut month_first = first_of_month(anchor);
    let mut months = vec![month_first];

    for _ in 1..window {
        month_first = previous_month_first(month_first);
        months.push(month_first);
    }

    months.reverse();
    months
}

fn first_of_month(date: Date) -> Date {
    date.replace_day(1)
        .expect("the first of a month is always a valid date")
}

fn previous_month_first(month_first: Date) -> Date {
    let year = match month_first.month() {
        Month::January => month_first.year() - 1,
        _ => month_first.year(),
    };

    Date::from_calendar_date(year, month_first.month().previous(), 1)
        .expect("the first of a month is always a valid date")
}

fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
