//! A SQLite backed [DataSource] with the write-side API.
//!
//! Writes never touch the published collections: they update the database and
//! emit a change notification, and the watchers refetch. This keeps a single
//! code path for "data changed" regardless of who changed it.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, params};
use serde_json::{Value, json};
use tokio::sync::broadcast;

use crate::{
    Error,
    model::{Category, NewTransaction, Transaction, TransactionId},
    sync::{CHANGE_CHANNEL_CAPACITY, ChangeNotification, DataSource, Table},
};

const TABLES: [Table; 3] = [Table::Expenses, Table::Incomes, Table::Categories];

/// Stores transactions and categories in a SQLite database.
#[derive(Clone)]
pub struct SqliteDataSource {
    connection: Arc<Mutex<Connection>>,
    channels: Arc<HashMap<Table, broadcast::Sender<ChangeNotification>>>,
}

impl SqliteDataSource {
    /// Create a data source for `connection`, creating the tables and seeding
    /// the default categories if the category table is empty.
    ///
    /// # Errors
    ///
    /// Returns [Error::Sql] if the schema cannot be created.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        connection.execute_batch(
            "CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
                name TEXT NOT NULL,
                color TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS expenses (
                id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                category_id TEXT,
                custom_category TEXT,
                date TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS incomes (
                id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                category_id TEXT,
                custom_category TEXT,
                date TEXT NOT NULL
            );",
        )?;

        let category_count: i64 =
            connection.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;

        if category_count == 0 {
            for category in Category::defaults() {
                connection.execute(
                    "INSERT INTO categories (id, name, color) VALUES (?1, ?2, ?3)",
                    params![category.id, category.name, category.color],
                )?;
            }
        }

        let channels = TABLES
            .map(|table| (table, broadcast::channel(CHANGE_CHANNEL_CAPACITY).0))
            .into_iter()
            .collect();

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            channels: Arc::new(channels),
        })
    }

    /// Open or create the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [Error::Sql] if the file cannot be opened or the schema cannot
    /// be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::new(Connection::open(path)?)
    }

    /// Create a data source backed by an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [Error::Sql] if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, Error> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Create an expense.
    ///
    /// # Errors
    ///
    /// Returns the validation errors of [NewTransaction::validated], or
    /// [Error::Sql] on a SQL error.
    pub fn insert_expense(&self, new: NewTransaction) -> Result<Transaction, Error> {
        self.insert_transaction(Table::Expenses, new)
    }

    /// Create an income.
    ///
    /// # Errors
    ///
    /// Returns the validation errors of [NewTransaction::validated], or
    /// [Error::Sql] on a SQL error.
    pub fn insert_income(&self, new: NewTransaction) -> Result<Transaction, Error> {
        self.insert_transaction(Table::Incomes, new)
    }

    /// Replace the expense with `id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::UpdateMissingRow] if `id` does not refer to an
    /// existing expense, the validation errors of
    /// [NewTransaction::validated], or [Error::Sql] on a SQL error.
    pub fn update_expense(&self, id: &TransactionId, new: NewTransaction) -> Result<(), Error> {
        self.update_transaction(Table::Expenses, id, new)
    }

    /// Replace the income with `id`.
    ///
    /// # Errors
    ///
    /// See [SqliteDataSource::update_expense].
    pub fn update_income(&self, id: &TransactionId, new: NewTransaction) -> Result<(), Error> {
        self.update_transaction(Table::Incomes, id, new)
    }

    /// Delete the expense with `id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::DeleteMissingRow] if `id` does not refer to an
    /// existing expense, or [Error::Sql] on a SQL error.
    pub fn delete_expense(&self, id: &TransactionId) -> Result<(), Error> {
        self.delete_transaction(Table::Expenses, id)
    }

    /// Delete the income with `id`.
    ///
    /// # Errors
    ///
    /// See [SqliteDataSource::delete_expense].
    pub fn delete_income(&self, id: &TransactionId) -> Result<(), Error> {
        self.delete_transaction(Table::Incomes, id)
    }

    /// Create a category with a generated id.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyCategoryName] if `name` is empty after trimming,
    /// or [Error::Sql] on a SQL error.
    pub fn insert_category(&self, name: &str, color: &str) -> Result<Category, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::EmptyCategoryName);
        }

        let category = {
            let connection = self.connection.lock().unwrap();

            connection
                .prepare(
                    "INSERT INTO categories (name, color) VALUES (?1, ?2)
                     RETURNING id, name, color",
                )?
                .query_row(params![name, color], |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        color: row.get(2)?,
                    })
                })?
        };

        self.notify(Table::Categories);

        Ok(category)
    }

    /// Delete the category with `id`.
    ///
    /// Transactions referencing the deleted category keep their reference and
    /// resolve to the unknown fallback from then on.
    ///
    /// # Errors
    ///
    /// Returns [Error::DeleteMissingRow] if `id` does not refer to an
    /// existing category, or [Error::Sql] on a SQL error.
    pub fn delete_category(&self, id: &str) -> Result<(), Error> {
        let affected = {
            let connection = self.connection.lock().unwrap();

            connection.execute("DELETE FROM categories WHERE id = ?1", params![id])?
        };

        if affected == 0 {
            return Err(Error::DeleteMissingRow);
        }

        self.notify(Table::Categories);

        Ok(())
    }

    fn insert_transaction(&self, table: Table, new: NewTransaction) -> Result<Transaction, Error> {
        let new = new.validated()?;

        let id: TransactionId = {
            let connection = self.connection.lock().unwrap();

            connection
                .prepare(&format!(
                    "INSERT INTO {} (description, amount, category_id, custom_category, date)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     RETURNING id",
                    table.as_str()
                ))?
                .query_row(
                    params![
                        new.description,
                        new.amount,
                        new.category_id,
                        new.custom_label,
                        new.date
                    ],
                    |row| row.get(0),
                )?
        };

        self.notify(table);

        Ok(Transaction {
            id,
            description: new.description,
            amount: new.amount,
            date: new.date,
            category_id: new.category_id,
            custom_label: new.custom_label,
        })
    }

    fn update_transaction(
        &self,
        table: Table,
        id: &TransactionId,
        new: NewTransaction,
    ) -> Result<(), Error> {
        let new = new.validated()?;

        let affected = {
            let connection = self.connection.lock().unwrap();

            connection.execute(
                &format!(
                    "UPDATE {}
                     SET description = ?1, amount = ?2, category_id = ?3,
                         custom_category = ?4, date = ?5
                     WHERE id = ?6",
                    table.as_str()
                ),
                params![
                    new.description,
                    new.amount,
                    new.category_id,
                    new.custom_label,
                    new.date,
                    id
                ],
            )?
        };

        if affected == 0 {
            return Err(Error::UpdateMissingRow);
        }

        self.notify(table);

        Ok(())
    }

    fn delete_transaction(&self, table: Table, id: &TransactionId) -> Result<(), Error> {
        let affected = {
            let connection = self.connection.lock().unwrap();

            connection.execute(
                &format!("DELETE FROM {} WHERE id = ?1", table.as_str()),
                params![id],
            )?
        };

        if affected == 0 {
            return Err(Error::DeleteMissingRow);
        }

        self.notify(table);

        Ok(())
    }

    // Called after the connection lock is released so a subscriber's refetch
    // never contends with the write that triggered it.
    fn notify(&self, table: Table) {
        let _ = self.channels[&table].send(ChangeNotification);
    }

    fn fetch_rows(&self, table: Table) -> Result<Vec<Value>, rusqlite::Error> {
        let connection = self.connection.lock().unwrap();

        match table {
            Table::Categories => connection
                .prepare("SELECT id, name, color FROM categories ORDER BY name")?
                .query_map([], |row| {
                    Ok(json!({
                        "id": row.get::<_, String>(0)?,
                        "name": row.get::<_, String>(1)?,
                        "color": row.get::<_, String>(2)?,
                    }))
                })?
                .collect(),
            Table::Expenses | Table::Incomes => connection
                .prepare(&format!(
                    "SELECT id, description, amount, category_id, custom_category, date
                     FROM {} ORDER BY date DESC",
                    table.as_str()
                ))?
                .query_map([], |row| {
                    Ok(json!({
                        "id": row.get::<_, String>(0)?,
                        "description": row.get::<_, String>(1)?,
                        "amount": row.get::<_, f64>(2)?,
                        "category_id": row.get::<_, Option<String>>(3)?,
                        "custom_category": row.get::<_, Option<String>>(4)?,
                        "date": row.get::<_, String>(5)?,
                    }))
                })?
                .collect(),
        }
    }
}

impl DataSource for SqliteDataSource {
    async fn fetch_all(&self, table: Table) -> Result<Vec<Value>, Error> {
        self.fetch_rows(table).map_err(|error| Error::DataSource {
            table,
            reason: error.to_string(),
        })
    }

    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeNotification> {
        self.channels[&table].subscribe()
    }
}

#[cfg(test)]
mod store_tests {
    use time::macros::date;

    use super::SqliteDataSource;
    use crate::{
        Error,
        model::{NewTransaction, Transaction},
        sync::{DataSource, Table},
    };

    fn store() -> SqliteDataSource {
        SqliteDataSource::open_in_memory().unwrap()
    }

    fn groceries() -> NewTransaction {
        NewTransaction {
            description: "Groceries".to_owned(),
            amount: 100.0,
            date: date!(2024 - 01 - 10),
            category_id: Some("food".to_owned()),
            custom_label: None,
        }
    }

    #[test]
    fn new_seeds_default_categories() {
        let store = store();

        let rows = store.fetch_rows(Table::Categories).unwrap();

        assert_eq!(rows.len(), 8);
        assert!(rows.iter().any(|row| row["id"] == "other"));
    }

    #[test]
    fn insert_expense_assigns_id_and_round_trips() {
        let store = store();

        let created = store.insert_expense(groceries()).unwrap();
        assert!(!created.id.is_empty());

        let rows = store.fetch_rows(Table::Expenses).unwrap();
        assert_eq!(rows.len(), 1);

        let fetched = Transaction::from_row(&rows[0]).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn insert_expense_rejects_invalid_amount() {
        let store = store();
        let mut new = groceries();
        new.amount = 0.0;

        assert_eq!(store.insert_expense(new), Err(Error::InvalidAmount(0.0)));
    }

    #[test]
    fn transactions_come_back_date_descending() {
        let store = store();
        let mut older = groceries();
        older.date = date!(2024 - 01 - 05);
        let newer = groceries();

        store.insert_expense(older).unwrap();
        store.insert_expense(newer).unwrap();

        let rows = store.fetch_rows(Table::Expenses).unwrap();
        assert_eq!(rows[0]["date"], "2024-01-10");
        assert_eq!(rows[1]["date"], "2024-01-05");
    }

    #[test]
    fn update_expense_replaces_the_row() {
        let store = store();
        let created = store.insert_expense(groceries()).unwrap();

        let mut replacement = groceries();
        replacement.amount = 42.0;
        store.update_expense(&created.id, replacement).unwrap();

        let rows = store.fetch_rows(Table::Expenses).unwrap();
        assert_eq!(rows[0]["amount"], 42.0);
    }

    #[test]
    fn update_missing_expense_errors() {
        let store = store();

        let result = store.update_expense(&"missing".to_owned(), groceries());

        assert_eq!(result, Err(Error::UpdateMissingRow));
    }

    #[test]
    fn delete_expense_removes_the_row() {
        let store = store();
        let created = store.insert_expense(groceries()).unwrap();

        store.delete_expense(&created.id).unwrap();

        assert!(store.fetch_rows(Table::Expenses).unwrap().is_empty());
    }

    #[test]
    fn delete_missing_expense_errors() {
        let store = store();

        assert_eq!(
            store.delete_expense(&"missing".to_owned()),
            Err(Error::DeleteMissingRow)
        );
    }

    #[test]
    fn insert_category_rejects_blank_name() {
        let store = store();

        assert_eq!(
            store.insert_category("  ", "#123456"),
            Err(Error::EmptyCategoryName)
        );
    }

    #[test]
    fn writes_notify_subscribers() {
        let store = store();
        let mut expenses = store.subscribe(Table::Expenses);
        let mut categories = store.subscribe(Table::Categories);

        store.insert_expense(groceries()).unwrap();
        store.insert_category("Gifts", "#123456").unwrap();

        assert!(expenses.try_recv().is_ok());
        assert!(categories.try_recv().is_ok());
    }
}
