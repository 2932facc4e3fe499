//! CLI error types for structured error handling.
//!
//! Typed errors map to specific exit codes so scripts can tell a missing
//! customer from a rejected amount.

use std::fmt;

use veresiye_core::LedgerError;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (store, customer, transaction, backup file)
    NotFound { message: String, hint: String },

    /// Invalid user input
    InvalidInput(String),

    /// The data file is locked by another handle
    Busy(String),

    /// Backup or restore reported failure
    BackupFailed(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                if hint.is_empty() {
                    write!(f, "{}", message)
                } else {
                    write!(f, "{}\nHint: {}", message, hint)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
            CliError::Busy(message) => write!(f, "{}", message),
            CliError::BackupFailed(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    pub fn backup_failed(message: impl Into<String>) -> Self {
        CliError::BackupFailed(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use super::constants::exit_codes;
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::Busy(_) => exit_codes::BUSY,
            CliError::BackupFailed(_) => exit_codes::BACKUP_FAILED,
        }
    }
}

impl From<LedgerError> for CliError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(what) => {
                CliError::not_found(format!("{} not found", what), "")
            }
            LedgerError::Validation(message) => CliError::InvalidInput(message),
            LedgerError::Format(message) => {
                CliError::InvalidInput(format!("Not a Veresiye store: {}", message))
            }
            LedgerError::Busy(message) => CliError::Busy(format!(
                "{}\nHint: Close other programs using the file and retry.",
                message
            )),
            other => CliError::InvalidInput(other.to_string()),
        }
    }
}

/// Exit code for an error bubbling out of a command handler.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    if let Some(ledger_err) = err.downcast_ref::<LedgerError>() {
        return match ledger_err {
            LedgerError::NotFound(_) => super::constants::exit_codes::NOT_FOUND,
            LedgerError::Validation(_) | LedgerError::Format(_) => {
                super::constants::exit_codes::INVALID_INPUT
            }
            LedgerError::Busy(_) => super::constants::exit_codes::BUSY,
            _ => 1,
        };
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::exit_codes;

    #[test]
    fn test_ledger_errors_map_to_exit_codes() {
        let not_found: CliError = LedgerError::NotFound("Customer 9".to_string()).into();
        assert_eq!(not_found.exit_code(), exit_codes::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Customer 9 not found");

        let invalid: CliError = LedgerError::Validation("Amount must be positive".to_string()).into();
        assert_eq!(invalid.exit_code(), exit_codes::INVALID_INPUT);

        let busy: CliError = LedgerError::Busy("veresiye.db".to_string()).into();
        assert_eq!(busy.exit_code(), exit_codes::BUSY);
    }

    #[test]
    fn test_exit_code_for_anyhow_chain() {
        let err = anyhow::Error::new(LedgerError::NotFound("Transaction 4".to_string()));
        assert_eq!(exit_code_for(&err), exit_codes::NOT_FOUND);

        let err = anyhow::Error::new(CliError::backup_failed("Backup failed"));
        assert_eq!(exit_code_for(&err), exit_codes::BACKUP_FAILED);

        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn test_not_found_display_includes_hint() {
        let err = CliError::not_found("No store at /tmp/x.db", "Run `veresiye customer add` first.");
        assert_eq!(
            err.to_string(),
            "No store at /tmp/x.db\nHint: Run `veresiye customer add` first."
        );
    }
}
