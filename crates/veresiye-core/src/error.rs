//! Error types for Veresiye core operations.
//!
//! Errors are descriptive at the core level; the backup coordinator and the
//! CLI layer map these to user-facing messages.

use thiserror::Error;

/// Result type alias for Veresiye operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Core error type for ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Data validation error (non-positive amount, name too long, bad id)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested row does not exist or is soft-deleted
    #[error("Not found: {0}")]
    NotFound(String),

    /// A file lacks the tables or columns of a store file
    #[error("Format error: {0}")]
    Format(String),

    /// The data file is held by another handle
    #[error("File busy: {0}")]
    Busy(String),

    /// Storage backend error (row decoding, poisoned lock)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite-specific storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl LedgerError {
    /// Whether the error was caused by caller input rather than the environment.
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }
}
