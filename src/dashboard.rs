//! Read-side snapshots composing the aggregates over the live collections.

use time::{Date, OffsetDateTime};

use crate::{
    aggregate::{
        CategorySlice, DASHBOARD_WINDOW_MONTHS, MonthBucket, MonthlyComparison, TrendDelta,
        average_amount, category_slices, monthly_comparison, monthly_totals, total_amount,
        trend_delta,
    },
    filter::{TransactionFilter, filter_transactions},
    model::{Category, Transaction, picker_categories},
    sync::{DataSource, SyncCoordinator},
};

/// Everything the spending overview displays, derived from one consistent
/// read of the expense and category collections.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    /// The expenses that passed the filter, most recent first.
    pub transactions: Vec<Transaction>,
    /// The categories offered by pickers.
    pub categories: Vec<Category>,
    /// Sum of the filtered expenses.
    pub total: f64,
    /// Mean of the filtered expenses, zero when none match.
    pub average: f64,
    /// Per-category totals, largest first.
    pub slices: Vec<CategorySlice>,
    /// The largest slice, if any expense matched.
    pub top_category: Option<CategorySlice>,
    /// Trailing six months of totals, oldest first.
    pub monthly: Vec<MonthBucket>,
    /// Recent-versus-previous spending movement.
    pub trend: TrendDelta,
    /// Whether any backing collection has a fetch in flight.
    pub loading: bool,
    /// The first fetch error across the backing collections, if any.
    pub error: Option<String>,
}

/// Twelve months of income against expense, derived from one consistent read
/// of both transaction collections.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSnapshot {
    /// Trailing twelve months, oldest first.
    pub monthly: Vec<MonthlyComparison>,
    /// Income total across the window.
    pub total_income: f64,
    /// Expense total across the window.
    pub total_expense: f64,
    /// Income minus expense.
    pub net_profit: f64,
    /// Whether either backing collection has a fetch in flight.
    pub loading: bool,
    /// The first fetch error across the backing collections, if any.
    pub error: Option<String>,
}

/// Build the spending overview for `expenses` as of `today`.
///
/// Every derived figure is computed from the same filtered set, so the
/// displayed total always equals the sum of the displayed transactions.
pub fn build_dashboard_snapshot(
    expenses: &[Transaction],
    categories: &[Category],
    filter: &TransactionFilter,
    today: Date,
) -> DashboardSnapshot {
    let filtered = filter_transactions(expenses, filter);
    let slices = category_slices(&filtered, categories);

    DashboardSnapshot {
        categories: picker_categories(categories),
        total: total_amount(&filtered),
        average: average_amount(&filtered),
        top_category: slices.first().cloned(),
        slices,
        monthly: monthly_totals(&filtered, today, DASHBOARD_WINDOW_MONTHS),
        trend: trend_delta(&filtered),
        loading: false,
        error: None,
        transactions: filtered,
    }
}

/// Build the income-versus-expense comparison as of `today`.
pub fn build_comparison_snapshot(
    incomes: &[Transaction],
    expenses: &[Transaction],
    today: Date,
) -> ComparisonSnapshot {
    let monthly = monthly_comparison(incomes, expenses, today);
    let total_income: f64 = monthly.iter().map(|month| month.income).sum();
    let total_expense: f64 = monthly.iter().map(|month| month.expense).sum();

    ComparisonSnapshot {
        monthly,
        total_income,
        total_expense,
        net_profit: total_income - total_expense,
        loading: false,
        error: None,
    }
}

/// The live read side: snapshots over the collections a [SyncCoordinator]
/// keeps fresh.
pub struct Dashboard {
    coordinator: SyncCoordinator,
}

impl Dashboard {
    /// Wrap `coordinator`, taking ownership of its watcher tasks.
    pub fn new(coordinator: SyncCoordinator) -> Self {
        Self { coordinator }
    }

    /// Start watchers on `source` and wrap them.
    pub fn start<S: DataSource>(source: &S) -> Self {
        Self::new(SyncCoordinator::start(source))
    }

    /// The spending overview over the current collections.
    pub fn snapshot(&self, filter: &TransactionFilter, today: Date) -> DashboardSnapshot {
        let expenses_receiver = self.coordinator.expenses();
        let categories_receiver = self.coordinator.categories();
        let expenses = expenses_receiver.borrow().clone();
        let categories = categories_receiver.borrow().clone();

        let mut snapshot =
            build_dashboard_snapshot(&expenses.rows, &categories.rows, filter, today);
        snapshot.loading = expenses.is_loading() || categories.is_loading();
        snapshot.error = expenses.last_error.or(categories.last_error);

        snapshot
    }

    /// The income-versus-expense comparison over the current collections.
    pub fn comparison(&self, today: Date) -> ComparisonSnapshot {
        let incomes_receiver = self.coordinator.incomes();
        let expenses_receiver = self.coordinator.expenses();
        let incomes = incomes_receiver.borrow().clone();
        let expenses = expenses_receiver.borrow().clone();

        let mut snapshot = build_comparison_snapshot(&incomes.rows, &expenses.rows, today);
        snapshot.loading = incomes.is_loading() || expenses.is_loading();
        snapshot.error = incomes.last_error.or(expenses.last_error);

        snapshot
    }

    /// The underlying coordinator, for waiting on collection changes.
    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    /// Stop the watcher tasks.
    pub fn shutdown(&mut self) {
        self.coordinator.shutdown();
    }
}

/// Today's date in UTC, the default snapshot anchor.
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}
