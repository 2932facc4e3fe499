//! Read-only loading of a whole store file.
//!
//! Used by restore and by the import reader. Files written by older builds
//! may lack the flag columns or the transactions table entirely; missing
//! columns read as `false` and a missing table reads as empty.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::error::{LedgerError, Result};
use crate::storage::types::{Customer, Transaction};

use super::configure_connection;
use super::migrations::{table_columns, table_exists};
use super::row::{CustomerRow, TransactionRow};

/// Every customer and transaction row of a store file, tombstones included.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub customers: Vec<Customer>,
    pub transactions: Vec<Transaction>,
}

impl LedgerSnapshot {
    /// Validate `path` as a store file and load it without writing to it.
    ///
    /// # Errors
    ///
    /// - `LedgerError::Io` if the file does not exist
    /// - `LedgerError::Format` if it is not SQLite or has no customers table
    /// - `LedgerError::Storage` if a row cannot be decoded
    pub fn load(path: &Path) -> Result<Self> {
        let conn = open_read_only(path)?;

        let customers = load_customers(&conn)?;
        let transactions = if table_exists(&conn, "transactions")? {
            load_transactions(&conn)?
        } else {
            tracing::debug!(path = %path.display(), "No transactions table, treating as empty");
            Vec::new()
        };

        Ok(Self {
            customers,
            transactions,
        })
    }

    /// Customers without a tombstone.
    pub fn live_customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.iter().filter(|c| !c.is_deleted)
    }

    /// Transactions without a tombstone.
    pub fn live_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|t| !t.is_deleted)
    }
}

/// Open a candidate store file read-only and check its shape.
pub fn open_read_only(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        return Err(LedgerError::Io {
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Store file not found: {}", path.display()),
            ),
        });
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| LedgerError::Format(format!("Cannot open {}: {}", path.display(), e)))?;
    configure_connection(&conn)?;

    let has_customers = table_exists(&conn, "customers").map_err(|e| {
        LedgerError::Format(format!("{} is not a store file: {}", path.display(), e))
    })?;
    if !has_customers {
        return Err(LedgerError::Format(format!(
            "{} has no customers table",
            path.display()
        )));
    }
    Ok(conn)
}

/// Build a select list that substitutes `0` for flag columns the file lacks.
fn select_list(conn: &Connection, table: &str, wanted: &[&str]) -> Result<String> {
    let present = table_columns(conn, table)?;
    let mut parts = Vec::with_capacity(wanted.len());
    for column in wanted {
        if present.iter().any(|c| c.eq_ignore_ascii_case(column)) {
            parts.push((*column).to_string());
        } else if column.starts_with("is_") {
            parts.push(format!("0 AS {}", column));
        } else if *column == "currency" {
            parts.push("0 AS currency".to_string());
        } else if matches!(*column, "phone" | "description") {
            parts.push(format!("NULL AS {}", column));
        } else {
            return Err(LedgerError::Format(format!(
                "{} table is missing required column {}",
                table, column
            )));
        }
    }
    Ok(parts.join(", "))
}

fn load_customers(conn: &Connection) -> Result<Vec<Customer>> {
    let columns = select_list(conn, "customers", &["id", "name", "phone", "is_deleted"])?;
    let mut stmt = conn.prepare(&format!("SELECT {} FROM customers ORDER BY id", columns))?;
    let rows = stmt.query_map([], CustomerRow::read)?;
    let mut customers = Vec::new();
    for row in rows {
        customers.push(row?.into());
    }
    Ok(customers)
}

fn load_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let columns = select_list(
        conn,
        "transactions",
        &[
            "id",
            "customer_id",
            "amount",
            "direction",
            "currency",
            "date",
            "description",
            "is_deleted",
            "is_deposit",
            "is_hidden",
        ],
    )?;
    let mut stmt = conn.prepare(&format!("SELECT {} FROM transactions ORDER BY id", columns))?;
    let rows = stmt.query_map([], TransactionRow::read)?;
    let mut transactions = Vec::new();
    for row in rows {
        transactions.push(row?.try_into()?);
    }
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = LedgerSnapshot::load(&dir.path().join("nope.db")).unwrap_err();
        assert!(matches!(err, LedgerError::Io { .. }));
    }

    #[test]
    fn test_non_sqlite_file_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.db");
        std::fs::write(&path, b"this is definitely not a database file").unwrap();

        let err = LedgerSnapshot::load(&path).unwrap_err();
        assert!(matches!(err, LedgerError::Format(_)), "got {:?}", err);
    }

    #[test]
    fn test_database_without_customers_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);")
            .unwrap();
        drop(conn);

        let err = LedgerSnapshot::load(&path).unwrap_err();
        assert!(matches!(err, LedgerError::Format(_)));
    }

    #[test]
    fn test_oldest_layout_loads_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, phone TEXT);
             INSERT INTO customers VALUES (3, 'Ayşe', NULL);",
        )
        .unwrap();
        drop(conn);

        let snapshot = LedgerSnapshot::load(&path).unwrap();
        assert_eq!(snapshot.customers.len(), 1);
        assert_eq!(snapshot.customers[0].id, 3);
        assert!(!snapshot.customers[0].is_deleted);
        assert!(snapshot.transactions.is_empty());
    }
}
