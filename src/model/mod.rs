//! Domain types: transactions, categories, and the validating transform that
//! turns untyped data source rows into them.

mod category;
mod transaction;

pub use category::{Category, CategoryId, OTHER_CATEGORY_ID, picker_categories};
pub use transaction::{NewTransaction, Transaction, TransactionId};
