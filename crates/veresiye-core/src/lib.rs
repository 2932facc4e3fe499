//! # Veresiye Core
//!
//! Core library for Veresiye - a multi-currency customer credit ledger for a
//! jewellery business, kept in one local SQLite file.
//!
//! This crate provides the domain logic, storage abstractions and data
//! models independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **collation**: Turkish case folding and alphabetical ordering
//! - **storage**: Storage engine trait, SQLite backend and schema migrations
//! - **ledger**: Per-currency balances and global aggregates
//! - **query**: Filtering, sorting, pagination and neighbor navigation
//! - **backup**: Snapshot capture, retention and atomic restore
//! - **import**: Read-only access to a store file from another device
//! - **export**: Statements, price lists and Turkish number formatting

pub mod backup;
pub mod collation;
pub mod error;
pub mod export;
pub mod fs;
pub mod import;
pub mod ledger;
pub mod query;
pub mod storage;

pub use backup::{BackupConfig, BackupCoordinator, BackupReport, RestoreReport};
pub use error::{LedgerError, Result};
pub use ledger::{BalanceOptions, CurrencyBalance, CurrencySummary, Ledger};
pub use query::{Page, QueryEngine};
pub use storage::{SqliteStorage, StorageEngine};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
