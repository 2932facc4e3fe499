//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells, and clap usage errors)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (store file, customer, transaction, backup).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// The store or a backup file is held by another process.
    pub const BUSY: i32 = 5;

    /// Backup or restore did not complete.
    pub const BACKUP_FAILED: i32 = 6;
}

/// Default page size for list commands.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Customers shown in the summary's activity ranking.
pub const DEFAULT_TOP_CUSTOMERS: usize = 5;
