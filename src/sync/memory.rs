//! An in-memory [DataSource] for demos and tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde_json::Value;
use tokio::sync::broadcast;

use crate::{
    Error,
    sync::{CHANGE_CHANNEL_CAPACITY, ChangeNotification, DataSource, Table},
};

const TABLES: [Table; 3] = [Table::Expenses, Table::Incomes, Table::Categories];

/// A [DataSource] backed by plain in-memory vectors.
///
/// Mutations never touch the published collections directly; like a real
/// backend, they only update the source's own rows and emit a change
/// notification, leaving the refetch to the watchers.
#[derive(Clone)]
pub struct MemoryDataSource {
    rows: Arc<Mutex<HashMap<Table, Vec<Value>>>>,
    channels: Arc<HashMap<Table, broadcast::Sender<ChangeNotification>>>,
}

impl MemoryDataSource {
    /// Create a source with all three tables empty.
    pub fn new() -> Self {
        let rows = TABLES.map(|table| (table, Vec::new())).into_iter().collect();
        let channels = TABLES
            .map(|table| (table, broadcast::channel(CHANGE_CHANNEL_CAPACITY).0))
            .into_iter()
            .collect();

        Self {
            rows: Arc::new(Mutex::new(rows)),
            channels: Arc::new(channels),
        }
    }

    /// Replace `table`'s rows and notify subscribers.
    pub fn set_rows(&self, table: Table, rows: Vec<Value>) {
        *self.rows.lock().unwrap().get_mut(&table).unwrap() = rows;
        self.notify(table);
    }

    /// Append a row to `table` and notify subscribers.
    pub fn push_row(&self, table: Table, row: Value) {
        self.rows.lock().unwrap().get_mut(&table).unwrap().push(row);
        self.notify(table);
    }

    /// Emit a change notification for `table`.
    pub fn notify(&self, table: Table) {
        // A send error just means nobody is subscribed yet.
        let _ = self.channels[&table].send(ChangeNotification);
    }
}

impl Default for MemoryDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSource for MemoryDataSource {
    async fn fetch_all(&self, table: Table) -> Result<Vec<Value>, Error> {
        Ok(self.rows.lock().unwrap()[&table].clone())
    }

    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeNotification> {
        self.channels[&table].subscribe()
    }
}
