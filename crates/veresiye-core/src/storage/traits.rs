//! Storage engine trait definition.
//!
//! The `StorageEngine` trait is the seam between the ledger/query/backup
//! components and the durable store. `SqliteStorage` is the production
//! implementation; everything above it is written against this trait.

use std::path::Path;

use super::types::{
    Customer, CustomerFilter, QuickEntry, Settings, Transaction, TransactionFilter,
};
use crate::error::Result;

/// Durable CRUD over customers, transactions, quick entries and settings.
///
/// All implementations must ensure:
/// - Soft-deleted rows are invisible to `get_*` and default `list_*` calls
/// - `save_*` inserts when the id is `0` and updates otherwise
/// - `replace_ledger` is all-or-nothing
pub trait StorageEngine: Send + Sync {
    /// Path of the live data file.
    fn path(&self) -> &Path;

    /// Re-run schema initialization and migrations on the open handle.
    fn refresh_schema(&self) -> Result<()>;

    // --- Customer operations ---

    /// Get a non-deleted customer by id.
    fn get_customer(&self, id: i64) -> Result<Option<Customer>>;

    /// List customers in id order.
    fn list_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>>;

    /// Insert or update a customer, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Validation` if:
    /// - The name is empty or longer than 100 characters
    /// - The phone number is not up to 10 digits
    /// - Another non-deleted customer has the same name under the Turkish fold
    ///
    /// Returns `LedgerError::NotFound` when updating a missing customer.
    fn save_customer(&self, customer: &Customer) -> Result<i64>;

    /// Flag a customer as deleted, then flag each of its live transactions.
    ///
    /// The two steps are separate writes. Returns the number of transactions
    /// flagged by the cascade.
    fn soft_delete_customer(&self, id: i64) -> Result<usize>;

    // --- Transaction operations ---

    fn get_transaction(&self, id: i64) -> Result<Option<Transaction>>;

    /// List transactions, newest first.
    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    /// Insert or update a transaction, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Validation` for a non-positive amount, a missing
    /// customer reference, or an over-long description.
    fn save_transaction(&self, transaction: &Transaction) -> Result<i64>;

    fn soft_delete_transaction(&self, id: i64) -> Result<()>;

    // --- Quick entry operations ---

    fn get_quick_entry(&self, id: i64) -> Result<Option<QuickEntry>>;

    /// List quick entries, newest first.
    fn list_quick_entries(&self) -> Result<Vec<QuickEntry>>;

    /// Quick entries whose name or national id contains `term`.
    fn search_quick_entries(&self, term: &str) -> Result<Vec<QuickEntry>>;

    fn save_quick_entry(&self, entry: &QuickEntry) -> Result<i64>;

    fn soft_delete_quick_entry(&self, id: i64) -> Result<()>;

    // --- Settings ---

    fn settings(&self) -> Result<Option<Settings>>;

    fn save_settings(&self, settings: &Settings) -> Result<()>;

    // --- Bulk operations ---

    /// Replace every customer and transaction row in one atomic step.
    ///
    /// Ids are preserved. Settings and quick entries are left untouched.
    fn replace_ledger(&self, customers: &[Customer], transactions: &[Transaction]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_is_object_safe() {
        fn _accepts_dyn(_engine: &dyn StorageEngine) {}
    }
}
