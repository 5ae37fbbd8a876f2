//! Keeps the in-memory collections consistent with a remote store that
//! pushes change notifications.
//!
//! One watcher task per table owns that table's collection. A notification
//! carries no diff, so a watcher always refetches the whole table and swaps
//! the collection atomically; consumers can never observe a partial read.
//! Notifications that arrive while a fetch is in flight collapse into a
//! single follow-up fetch, so an update landing mid-fetch is never lost and
//! a burst of notifications never fans out into a burst of fetches.

mod memory;

pub use memory::MemoryDataSource;

use std::{
    fmt::{self, Display},
    future::Future,
    sync::Arc,
};

use serde_json::Value;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};

use crate::{
    Error,
    model::{Category, Transaction},
};

/// Buffer size for change-notification channels. Overflow is harmless: a
/// lagged receiver refetches everything anyway.
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// A watched table in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Expense transactions.
    Expenses,
    /// Income transactions.
    Incomes,
    /// Spending categories.
    Categories,
}

impl Table {
    /// The table's name in the remote store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expenses => "expenses",
            Self::Incomes => "incomes",
            Self::Categories => "categories",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payload-free signal that something in a table changed.
///
/// The remote store guarantees nothing beyond "something changed", so
/// receivers must treat every notification as "refetch everything", never as
/// a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeNotification;

/// The remote store the engine synchronises against.
///
/// Injected at construction time rather than reached through a process-wide
/// singleton, so tests can substitute a deterministic fake.
pub trait DataSource: Clone + Send + Sync + 'static {
    /// Fetch every row of `table`, ordered the way that table's consumers
    /// expect (transactions by date descending, categories by name).
    ///
    /// Rows are untyped at this boundary by design; the coordinator applies
    /// the validating transform before anything downstream sees them.
    fn fetch_all(
        &self,
        table: Table,
    ) -> impl Future<Output = Result<Vec<Value>, Error>> + Send;

    /// Subscribe to change notifications for `table`.
    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeNotification>;
}

/// Fetch state of one watched collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No fetch in flight; the rows are the latest successful snapshot.
    Idle,
    /// A fetch is in flight; the rows are the previous snapshot.
    Fetching,
    /// The last fetch failed; the rows are stale but retained. The next
    /// change notification retries.
    Error,
}

/// One collection's rows and fetch state.
///
/// Published through a watch channel and swapped as a whole, so a consumer
/// either sees the old snapshot or the new one, never a mix.
#[derive(Debug, Clone)]
pub struct CollectionState<T> {
    /// The most recently fetched snapshot. Replaced wholesale on every
    /// successful fetch, never patched.
    pub rows: Arc<Vec<T>>,
    /// Whether a fetch is in flight or the last one failed.
    pub status: SyncStatus,
    /// Human-readable reason for the last failed fetch, cleared on success.
    pub last_error: Option<String>,
}

impl<T> CollectionState<T> {
    fn initial() -> Self {
        Self {
            rows: Arc::new(Vec::new()),
            status: SyncStatus::Fetching,
            last_error: None,
        }
    }

    /// Whether a fetch is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.status == SyncStatus::Fetching
    }

    /// Whether the most recent fetch failed.
    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }
}

/// Owns one watcher task per table and publishes each collection through a
/// watch channel.
pub struct SyncCoordinator {
    expenses: watch::Receiver<CollectionState<Transaction>>,
    incomes: watch::Receiver<CollectionState<Transaction>>,
    categories: watch::Receiver<CollectionState<Category>>,
    watchers: Vec<JoinHandle<()>>,
}

impl SyncCoordinator {
    /// Start watching the expense, income, and category tables of `source`.
    ///
    /// Each table gets an initial fetch immediately; after that, fetches are
    /// driven solely by the source's change notifications.
    pub fn start<S: DataSource>(source: &S) -> Self {
        let (expenses, expenses_task) =
            spawn_watcher(source.clone(), Table::Expenses, Transaction::from_row);
        let (incomes, incomes_task) =
            spawn_watcher(source.clone(), Table::Incomes, Transaction::from_row);
        let (categories, categories_task) =
            spawn_watcher(source.clone(), Table::Categories, Category::from_row);

        Self {
            expenses,
            incomes,
            categories,
            watchers: vec![expenses_task, incomes_task, categories_task],
        }
    }

    /// Receiver for the expense collection.
    ///
    /// Cheap to clone; `changed()` wakes on every state transition, including
    /// loading and error flags.
    pub fn expenses(&self) -> watch::Receiver<CollectionState<Transaction>> {
        self.expenses.clone()
    }

    /// Receiver for the income collection.
    pub fn incomes(&self) -> watch::Receiver<CollectionState<Transaction>> {
        self.incomes.clone()
    }

    /// Receiver for the category collection.
    pub fn categories(&self) -> watch::Receiver<CollectionState<Category>> {
        self.categories.clone()
    }

    /// Stop the watcher tasks and release the change subscriptions.
    ///
    /// A fetch still in flight is cancelled at its next suspension point, so
    /// its late result is never applied.
    pub fn shutdown(&mut self) {
        for watcher in self.watchers.drain(..) {
            watcher.abort();
        }
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn the watcher task owning `table`'s collection.
fn spawn_watcher<S, T, F>(
    source: S,
    table: Table,
    parse: F,
) -> (watch::Receiver<CollectionState<T>>, JoinHandle<()>)
where
    S: DataSource,
    T: Send + Sync + 'static,
    F: Fn(&Value) -> Result<T, Error> + Send + Sync + 'static,
{
    let (state_tx, state_rx) = watch::channel(CollectionState::initial());

    let task = tokio::spawn(async move {
        let mut notifications = source.subscribe(table);
        refresh(&source, table, &parse, &state_tx).await;

        loop {
            match notifications.recv().await {
                Ok(ChangeNotification) => {}
                // Overflow means we missed some notifications; a full
                // refetch covers them all.
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }

            // Notifications that piled up while the previous fetch was in
            // flight collapse into this one follow-up fetch.
            while notifications.try_recv().is_ok() {}

            refresh(&source, table, &parse, &state_tx).await;
        }
    });

    (state_rx, task)
}

/// Fetch `table` and replace the published collection.
async fn refresh<S, T, F>(
    source: &S,
    table: Table,
    parse: &F,
    state: &watch::Sender<CollectionState<T>>,
) where
    S: DataSource,
    F: Fn(&Value) -> Result<T, Error>,
{
    state.send_modify(|collection| {
        collection.status = SyncStatus::Fetching;
    });

    match source.fetch_all(table).await {
        Ok(rows) => {
            let mut parsed = Vec::with_capacity(rows.len());

            for row in &rows {
                match parse(row) {
                    Ok(entity) => parsed.push(entity),
                    Err(error) => tracing::warn!(%table, %error, "skipping malformed row"),
                }
            }

            tracing::debug!(%table, rows = parsed.len(), "collection replaced");
            state.send_modify(|collection| {
                collection.rows = Arc::new(parsed);
                collection.status = SyncStatus::Idle;
                collection.last_error = None;
            });
        }
        Err(error) => {
            tracing::error!(%table, %error, "fetch failed, keeping stale rows");
            state.send_modify(|collection| {
                collection.status = SyncStatus::Error;
                collection.last_error = Some(error.to_string());
            });
        }
    }
}
