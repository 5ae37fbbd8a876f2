//! Spendview is the data core of a personal-finance dashboard.
//!
//! It turns raw persisted expense and income rows into category breakdowns,
//! trailing-month trend buckets, and filtered views, and it keeps those
//! in-memory collections consistent with a remote store that pushes
//! asynchronous change notifications.
//!
//! The crate is a library-level contract: the surrounding application
//! (forms, routing, auth, chart rendering) lives elsewhere and talks to this
//! crate through the [DataSource] trait on one side and the
//! [Dashboard] snapshot surface on the other.

#![warn(missing_docs)]

pub mod aggregate;
mod dashboard;
mod filter;
mod logging;
mod model;
mod resolver;
mod store;
mod sync;
mod timezone;

pub use dashboard::{
    ComparisonSnapshot, Dashboard, DashboardSnapshot, build_comparison_snapshot,
    build_dashboard_snapshot, today_utc,
};
pub use filter::{TransactionFilter, filter_transactions};
pub use logging::init_logging;
pub use model::{
    Category, CategoryId, NewTransaction, OTHER_CATEGORY_ID, Transaction, TransactionId,
    picker_categories,
};
pub use resolver::{CategoryResolver, ResolvedCategory, UNKNOWN_COLOR, UNKNOWN_LABEL};
pub use store::SqliteDataSource;
pub use sync::{
    ChangeNotification, CollectionState, DataSource, MemoryDataSource, SyncCoordinator,
    SyncStatus, Table,
};
pub use timezone::local_date_in;

/// The errors that may occur in the engine.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A fetch or subscription against the remote store failed.
    ///
    /// Recoverable: the sync coordinator keeps the previous rows and retries
    /// on the next change notification.
    #[error("could not fetch {table} from the data source: {reason}")]
    DataSource {
        /// The table the failed operation targeted.
        table: sync::Table,
        /// Human-readable reason supplied by the data source.
        reason: String,
    },

    /// An empty string was used as a transaction description.
    #[error("transaction description cannot be empty")]
    EmptyDescription,

    /// An empty string was used as a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// A non-positive or non-finite amount was used to create a transaction.
    ///
    /// Transactions record money that moved, so zero and negative amounts are
    /// rejected at entry time. Expense or income polarity comes from the
    /// collection a transaction belongs to, not from the sign.
    #[error("{0} is not a valid transaction amount, amounts must be positive")]
    InvalidAmount(f64),

    /// A row's date column could not be parsed as a calendar date.
    #[error("could not parse {0:?} as a calendar date")]
    InvalidDate(String),

    /// A data source row was missing a required field or had one of the wrong
    /// shape. The row is rejected at the fetch boundary rather than being let
    /// through untyped.
    #[error("malformed row: {0}")]
    MalformedRow(String),

    /// A canonical timezone string did not name a known timezone.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The requested row could not be found.
    #[error("the requested row could not be found")]
    NotFound,

    /// Tried to update a row that does not exist.
    #[error("tried to update a row that is not in the database")]
    UpdateMissingRow,

    /// Tried to delete a row that does not exist.
    #[error("tried to delete a row that is not in the database")]
    DeleteMissingRow,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    Sql(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {error}");
                Error::Sql(error)
            }
        }
    }
}
