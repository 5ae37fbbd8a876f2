//! Core transaction domain type and the validating fetch-boundary transform.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use time::{Date, macros::format_description};

use crate::{Error, model::CategoryId};

/// Identifier for a transaction, assigned by the data source.
pub type TransactionId = String;

/// An expense or income record.
///
/// Immutable once fetched: edits and deletes happen through the data source,
/// which replaces the whole row and triggers a refetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Opaque identifier, assigned by the data source.
    pub id: TransactionId,
    /// What the money was spent on or earned from. Never empty.
    pub description: String,
    /// The amount of money that moved. Always positive and finite; expense or
    /// income polarity comes from the collection the transaction belongs to.
    pub amount: f64,
    /// The calendar date the transaction occurred on. No time-of-day
    /// semantics.
    pub date: Date,
    /// The referenced category: a real category id, the reserved "other"
    /// sentinel, or `None` for transactions that carry no category (incomes).
    pub category_id: Option<CategoryId>,
    /// Free-text category label, meaningful only when [Transaction::category_id]
    /// is the reserved "other" sentinel.
    pub custom_label: Option<String>,
}

/// Fields for a transaction about to be created; the data source assigns the
/// id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// What the money was spent on or earned from.
    pub description: String,
    /// The amount of money that moved. Must be positive and finite.
    pub amount: f64,
    /// The calendar date the transaction occurred on.
    pub date: Date,
    /// The referenced category, if any.
    pub category_id: Option<CategoryId>,
    /// Free-text label for the reserved "other" category.
    pub custom_label: Option<String>,
}

impl NewTransaction {
    /// Validate the entry-time invariants (non-empty description, positive
    /// finite amount), trimming the description.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyDescription] or [Error::InvalidAmount].
    pub fn validated(mut self) -> Result<Self, Error> {
        self.description = validate_description(&self.description)?;
        validate_amount(self.amount)?;
        self.custom_label = normalize_label(self.custom_label);
        Ok(self)
    }
}

impl Transaction {
    /// Create a validated transaction.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyDescription] if `description` is empty after
    /// trimming, or [Error::InvalidAmount] if `amount` is not a positive
    /// finite number.
    pub fn new(
        id: TransactionId,
        description: &str,
        amount: f64,
        date: Date,
        category_id: Option<CategoryId>,
        custom_label: Option<String>,
    ) -> Result<Self, Error> {
        let description = validate_description(description)?;
        validate_amount(amount)?;

        Ok(Self {
            id,
            description,
            amount,
            date,
            category_id,
            custom_label: normalize_label(custom_label),
        })
    }

    /// Build a typed transaction from an untyped data source row.
    ///
    /// Validation happens upstream in the form layer, but rows cannot be
    /// fully trusted, so the same entry-time invariants are re-checked here
    /// and rows that fail them are rejected.
    ///
    /// # Errors
    ///
    /// Returns [Error::MalformedRow] when a required field is missing or of
    /// the wrong shape, [Error::InvalidDate] when the date column does not
    /// hold a calendar date, or the validation errors of [Transaction::new].
    pub fn from_row(row: &Value) -> Result<Self, Error> {
        let raw: RawTransactionRow = serde_json::from_value(row.clone())
            .map_err(|error| Error::MalformedRow(error.to_string()))?;
        let date = parse_row_date(&raw.date)?;

        Transaction::new(
            raw.id,
            &raw.description,
            raw.amount,
            date,
            raw.category_id,
            raw.custom_category,
        )
    }
}

/// The shape of a transaction row as it comes off the wire, before
/// validation.
#[derive(Deserialize)]
struct RawTransactionRow {
    id: String,
    description: String,
    #[serde(deserialize_with = "amount_from_row")]
    amount: f64,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    custom_category: Option<String>,
    date: String,
}

/// Numeric columns arrive as JSON numbers from some backends and as decimal
/// strings from others, so accept both.
fn amount_from_row<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Date columns hold `YYYY-MM-DD`, sometimes with a trailing time component
/// which carries no meaning here and is dropped.
fn parse_row_date(text: &str) -> Result<Date, Error> {
    let format = format_description!("[year]-[month]-[day]");
    let date_part = text.get(..10).unwrap_or(text);

    Date::parse(date_part, &format).map_err(|_| Error::InvalidDate(text.to_owned()))
}

fn validate_description(description: &str) -> Result<String, Error> {
    let description = description.trim();

    if description.is_empty() {
        Err(Error::EmptyDescription)
    } else {
        Ok(description.to_owned())
    }
}

fn validate_amount(amount: f64) -> Result<(), Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

fn normalize_label(label: Option<String>) -> Option<String> {
    label
        .map(|label| label.trim().to_owned())
        .filter(|label| !label.is_empty())
}

#[cfg(test)]
mod transaction_tests {
    use serde_json::json;
    use time::macros::date;

    use super::{NewTransaction, Transaction};
    use crate::Error;

    #[test]
    fn new_rejects_empty_description() {
        let result = Transaction::new(
            "t1".to_owned(),
            "   ",
            12.5,
            date!(2024 - 01 - 10),
            None,
            None,
        );

        assert_eq!(result, Err(Error::EmptyDescription));
    }

    #[test]
    fn new_rejects_non_positive_amount() {
        let result = Transaction::new(
            "t1".to_owned(),
            "Lunch",
            -4.0,
            date!(2024 - 01 - 10),
            None,
            None,
        );

        assert_eq!(result, Err(Error::InvalidAmount(-4.0)));
    }

    #[test]
    fn new_drops_blank_custom_label() {
        let transaction = Transaction::new(
            "t1".to_owned(),
            "Lunch",
            4.0,
            date!(2024 - 01 - 10),
            Some("other".to_owned()),
            Some("   ".to_owned()),
        )
        .unwrap();

        assert_eq!(transaction.custom_label, None);
    }

    #[test]
    fn from_row_builds_transaction() {
        let row = json!({
            "id": "abc123",
            "description": "Groceries",
            "amount": 100.0,
            "category_id": "food",
            "date": "2024-01-10",
        });

        let transaction = Transaction::from_row(&row).unwrap();

        assert_eq!(transaction.id, "abc123");
        assert_eq!(transaction.description, "Groceries");
        assert_eq!(transaction.amount, 100.0);
        assert_eq!(transaction.date, date!(2024 - 01 - 10));
        assert_eq!(transaction.category_id.as_deref(), Some("food"));
        assert_eq!(transaction.custom_label, None);
    }

    #[test]
    fn from_row_accepts_decimal_string_amount() {
        let row = json!({
            "id": "abc123",
            "description": "Groceries",
            "amount": "99.50",
            "date": "2024-01-10",
        });

        let transaction = Transaction::from_row(&row).unwrap();

        assert_eq!(transaction.amount, 99.5);
    }

    #[test]
    fn from_row_drops_time_component() {
        let row = json!({
            "id": "abc123",
            "description": "Groceries",
            "amount": 10.0,
            "date": "2024-01-10T14:30:00+05:45",
        });

        let transaction = Transaction::from_row(&row).unwrap();

        assert_eq!(transaction.date, date!(2024 - 01 - 10));
    }

    #[test]
    fn from_row_rejects_missing_description() {
        let row = json!({
            "id": "abc123",
            "amount": 10.0,
            "date": "2024-01-10",
        });

        assert!(matches!(
            Transaction::from_row(&row),
            Err(Error::MalformedRow(_))
        ));
    }

    #[test]
    fn from_row_rejects_garbage_date() {
        let row = json!({
            "id": "abc123",
            "description": "Groceries",
            "amount": 10.0,
            "date": "next tuesday",
        });

        assert_eq!(
            Transaction::from_row(&row),
            Err(Error::InvalidDate("next tuesday".to_owned()))
        );
    }

    #[test]
    fn validated_trims_description() {
        let new = NewTransaction {
            description: "  Coffee  ".to_owned(),
            amount: 3.5,
            date: date!(2024 - 01 - 10),
            category_id: None,
            custom_label: None,
        };

        let validated = new.validated().unwrap();

        assert_eq!(validated.description, "Coffee");
    }
}
