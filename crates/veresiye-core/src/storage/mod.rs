//! Storage abstraction for Veresiye.
//!
//! This module defines the `StorageEngine` trait and the record types the
//! rest of the crate works with.
//!
//! ## Architecture
//!
//! - `traits`: the `StorageEngine` seam
//! - `types`: customers, transactions, quick entries, settings, filters
//! - `sqlite`: the single-file SQLite backend, its migrations and the
//!   read-only snapshot loader used by restore and import
//!
//! Records are never physically removed. Every row carries an `is_deleted`
//! tombstone and the only cascade is customer to transactions.

pub mod sqlite;
pub mod traits;
pub mod types;

// Re-export public types
pub use sqlite::migrations::MigrationReport;
pub use sqlite::snapshot::LedgerSnapshot;
pub use sqlite::SqliteStorage;
pub use traits::StorageEngine;
pub use types::{
    Currency, Customer, CustomerFilter, Direction, QuickEntry, Settings, Transaction,
    TransactionFilter,
};
