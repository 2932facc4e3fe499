//! SQLite storage backend.
//!
//! One file on disk, one connection guarded by a mutex. Opening the store
//! registers the Turkish collation and runs the migration manager; after
//! that the schema only changes through [`StorageEngine::refresh_schema`].

pub mod migrations;
mod row;
pub mod snapshot;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use crate::collation;
use crate::error::{LedgerError, Result};
use crate::storage::traits::StorageEngine;
use crate::storage::types::{
    Customer, CustomerFilter, QuickEntry, Settings, Transaction, TransactionFilter,
};

use migrations::MigrationReport;
use row::{
    format_timestamp, CustomerRow, QuickEntryRow, TransactionRow, CUSTOMER_COLUMNS,
    QUICK_ENTRY_COLUMNS, TRANSACTION_COLUMNS,
};

/// Name under which the Turkish collation is registered on every connection.
pub const COLLATION_NAME: &str = "TURKISH_NOCASE";

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Prepare a freshly opened connection for use with store files.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.create_collation(COLLATION_NAME, collation::compare)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

/// SQLite-backed storage engine.
pub struct SqliteStorage {
    path: PathBuf,
    conn: Mutex<Connection>,
    migration_report: MigrationReport,
}

impl SqliteStorage {
    /// Open (creating if needed) the store at `path` and migrate its schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(path.to_path_buf(), conn)
    }

    /// A private in-memory store; nothing is written to disk.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(PathBuf::from(":memory:"), conn)
    }

    fn with_connection(path: PathBuf, mut conn: Connection) -> Result<Self> {
        configure_connection(&conn)?;
        let migration_report = migrations::run(&mut conn)?;
        tracing::debug!(
            path = %path.display(),
            from = migration_report.from_version,
            to = migration_report.to_version,
            "Store opened"
        );
        Ok(Self {
            path,
            conn: Mutex::new(conn),
            migration_report,
        })
    }

    /// Schema changes applied when this handle was opened.
    pub fn migration_report(&self) -> &MigrationReport {
        &self.migration_report
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Storage("SQLite connection poisoned".to_string()))
    }

    fn ensure_unique_name(conn: &Connection, customer: &Customer) -> Result<()> {
        // The name column carries the Turkish collation, so `=` is fold-equality.
        let clash: Option<i64> = conn
            .query_row(
                "SELECT id FROM customers WHERE name = ?1 AND is_deleted = 0 AND id <> ?2 LIMIT 1",
                params![customer.name, customer.id],
                |row| row.get(0),
            )
            .optional()?;
        match clash {
            Some(other) => Err(LedgerError::Validation(format!(
                "A customer named {} already exists (id {})",
                customer.name, other
            ))),
            None => Ok(()),
        }
    }

    fn ensure_live_customer(conn: &Connection, customer_id: i64) -> Result<()> {
        let live: Option<i64> = conn
            .query_row(
                "SELECT id FROM customers WHERE id = ?1 AND is_deleted = 0",
                [customer_id],
                |row| row.get(0),
            )
            .optional()?;
        if live.is_none() {
            return Err(LedgerError::Validation(format!(
                "Customer {} does not exist",
                customer_id
            )));
        }
        Ok(())
    }

    fn insert_transaction(conn: &Connection, tx: &Transaction, keep_id: bool) -> Result<i64> {
        let id: Option<i64> = keep_id.then_some(tx.id);
        conn.execute(
            "INSERT INTO transactions (id, customer_id, amount, direction, currency, date, description, is_deleted, is_deposit, is_hidden)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                tx.customer_id,
                tx.amount.to_string(),
                tx.direction.code(),
                tx.currency.code(),
                format_timestamp(&tx.date),
                tx.description,
                tx.is_deleted,
                tx.is_deposit,
                tx.is_hidden,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl StorageEngine for SqliteStorage {
    fn path(&self) -> &Path {
        &self.path
    }

    fn refresh_schema(&self) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let report = migrations::run(&mut conn)?;
        if report.is_noop() {
            tracing::debug!("Schema already current");
        }
        Ok(())
    }

    fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM customers WHERE id = ?1 AND is_deleted = 0",
                    CUSTOMER_COLUMNS
                ),
                [id],
                CustomerRow::read,
            )
            .optional()?;
        Ok(row.map(Customer::from))
    }

    fn list_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>> {
        let conn = self.lock_conn()?;

        let mut query = format!("SELECT {} FROM customers", CUSTOMER_COLUMNS);
        if !filter.include_deleted {
            query.push_str(" WHERE is_deleted = 0");
        }
        query.push_str(" ORDER BY id");

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], CustomerRow::read)?;
        let mut customers = Vec::new();
        for row in rows {
            customers.push(row?.into());
        }
        Ok(customers)
    }

    fn save_customer(&self, customer: &Customer) -> Result<i64> {
        let customer = customer.validated()?;
        let conn = self.lock_conn()?;
        Self::ensure_unique_name(&conn, &customer)?;

        if customer.id == 0 {
            conn.execute(
                "INSERT INTO customers (name, phone, is_deleted) VALUES (?1, ?2, 0)",
                params![customer.name, customer.phone],
            )?;
            let id = conn.last_insert_rowid();
            tracing::debug!(id, "Customer created");
            return Ok(id);
        }

        let updated = conn.execute(
            "UPDATE customers SET name = ?1, phone = ?2 WHERE id = ?3 AND is_deleted = 0",
            params![customer.name, customer.phone, customer.id],
        )?;
        if updated == 0 {
            return Err(LedgerError::NotFound(format!("Customer {}", customer.id)));
        }
        Ok(customer.id)
    }

    fn soft_delete_customer(&self, id: i64) -> Result<usize> {
        let conn = self.lock_conn()?;

        let flagged = conn.execute(
            "UPDATE customers SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0",
            [id],
        )?;
        if flagged == 0 {
            return Err(LedgerError::NotFound(format!("Customer {}", id)));
        }

        // Separate write; a failure here leaves the customer flagged.
        let cascaded = conn.execute(
            "UPDATE transactions SET is_deleted = 1 WHERE customer_id = ?1 AND is_deleted = 0",
            [id],
        )?;
        tracing::debug!(customer_id = id, cascaded, "Customer soft-deleted");
        Ok(cascaded)
    }

    fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM transactions WHERE id = ?1 AND is_deleted = 0",
                    TRANSACTION_COLUMNS
                ),
                [id],
                TransactionRow::read,
            )
            .optional()?;
        row.map(Transaction::try_from).transpose()
    }

    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let conn = self.lock_conn()?;

        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if !filter.include_deleted {
            conditions.push("is_deleted = 0".to_string());
        }

        if let Some(customer_id) = filter.customer_id {
            conditions.push("customer_id = ?".to_string());
            params.push(Box::new(customer_id));
        }

        if let Some(currency) = filter.currency {
            conditions.push("currency = ?".to_string());
            params.push(Box::new(currency.code()));
        }

        let mut query = format!("SELECT {} FROM transactions", TRANSACTION_COLUMNS);
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), TransactionRow::read)?;

        let mut transactions: Vec<Transaction> = Vec::new();
        for row in rows {
            transactions.push(row?.try_into()?);
        }
        // Legacy rows store dates in other text layouts, so order by the decoded value.
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(transactions)
    }

    fn save_transaction(&self, transaction: &Transaction) -> Result<i64> {
        let tx = transaction.validated()?;
        let conn = self.lock_conn()?;
        Self::ensure_live_customer(&conn, tx.customer_id)?;

        if tx.id == 0 {
            let id = Self::insert_transaction(&conn, &tx, false)?;
            tracing::debug!(id, customer_id = tx.customer_id, "Transaction created");
            return Ok(id);
        }

        let updated = conn.execute(
            "UPDATE transactions
             SET customer_id = ?1, amount = ?2, direction = ?3, currency = ?4, date = ?5,
                 description = ?6, is_deposit = ?7, is_hidden = ?8
             WHERE id = ?9 AND is_deleted = 0",
            params![
                tx.customer_id,
                tx.amount.to_string(),
                tx.direction.code(),
                tx.currency.code(),
                format_timestamp(&tx.date),
                tx.description,
                tx.is_deposit,
                tx.is_hidden,
                tx.id,
            ],
        )?;
        if updated == 0 {
            return Err(LedgerError::NotFound(format!("Transaction {}", tx.id)));
        }
        Ok(tx.id)
    }

    fn soft_delete_transaction(&self, id: i64) -> Result<()> {
        let conn = self.lock_conn()?;
        let flagged = conn.execute(
            "UPDATE transactions SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0",
            [id],
        )?;
        if flagged == 0 {
            return Err(LedgerError::NotFound(format!("Transaction {}", id)));
        }
        Ok(())
    }

    fn get_quick_entry(&self, id: i64) -> Result<Option<QuickEntry>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM quick_entries WHERE id = ?1 AND is_deleted = 0",
                    QUICK_ENTRY_COLUMNS
                ),
                [id],
                QuickEntryRow::read,
            )
            .optional()?;
        row.map(QuickEntry::try_from).transpose()
    }

    fn list_quick_entries(&self) -> Result<Vec<QuickEntry>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM quick_entries WHERE is_deleted = 0",
            QUICK_ENTRY_COLUMNS
        ))?;
        let rows = stmt.query_map([], QuickEntryRow::read)?;
        let mut entries: Vec<QuickEntry> = Vec::new();
        for row in rows {
            entries.push(row?.try_into()?);
        }
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    fn search_quick_entries(&self, term: &str) -> Result<Vec<QuickEntry>> {
        let term = term.trim();
        let entries = self.list_quick_entries()?;
        if term.is_empty() {
            return Ok(entries);
        }
        Ok(entries
            .into_iter()
            .filter(|e| {
                collation::contains(&e.full_name, term)
                    || e.national_id.as_deref().is_some_and(|n| n.contains(term))
            })
            .collect())
    }

    fn save_quick_entry(&self, entry: &QuickEntry) -> Result<i64> {
        let entry = entry.validated()?;
        let conn = self.lock_conn()?;

        if entry.id == 0 {
            conn.execute(
                "INSERT INTO quick_entries (full_name, national_id, created_at, amount, is_processed, is_deleted)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![
                    entry.full_name,
                    entry.national_id,
                    format_timestamp(&entry.created_at),
                    entry.amount.to_string(),
                    entry.is_processed,
                ],
            )?;
            return Ok(conn.last_insert_rowid());
        }

        let updated = conn.execute(
            "UPDATE quick_entries
             SET full_name = ?1, national_id = ?2, created_at = ?3, amount = ?4, is_processed = ?5
             WHERE id = ?6 AND is_deleted = 0",
            params![
                entry.full_name,
                entry.national_id,
                format_timestamp(&entry.created_at),
                entry.amount.to_string(),
                entry.is_processed,
                entry.id,
            ],
        )?;
        if updated == 0 {
            return Err(LedgerError::NotFound(format!("Quick entry {}", entry.id)));
        }
        Ok(entry.id)
    }

    fn soft_delete_quick_entry(&self, id: i64) -> Result<()> {
        let conn = self.lock_conn()?;
        let flagged = conn.execute(
            "UPDATE quick_entries SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0",
            [id],
        )?;
        if flagged == 0 {
            return Err(LedgerError::NotFound(format!("Quick entry {}", id)));
        }
        Ok(())
    }

    fn settings(&self) -> Result<Option<Settings>> {
        let conn = self.lock_conn()?;
        let settings = conn
            .query_row(
                "SELECT business_name, cloud_client_id, cloud_client_secret, setup_completed
                 FROM settings WHERE id = 1",
                [],
                |row| {
                    Ok(Settings {
                        business_name: row.get(0)?,
                        cloud_client_id: row.get(1)?,
                        cloud_client_secret: row.get(2)?,
                        setup_completed: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(settings)
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO settings (id, business_name, cloud_client_id, cloud_client_secret, setup_completed)
             VALUES (1, ?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                business_name = excluded.business_name,
                cloud_client_id = excluded.cloud_client_id,
                cloud_client_secret = excluded.cloud_client_secret,
                setup_completed = excluded.setup_completed",
            params![
                settings.business_name.trim(),
                settings.cloud_client_id.trim(),
                settings.cloud_client_secret.trim(),
                settings.setup_completed,
            ],
        )?;
        Ok(())
    }

    fn replace_ledger(&self, customers: &[Customer], transactions: &[Transaction]) -> Result<()> {
        let mut customers_checked = Vec::with_capacity(customers.len());
        for customer in customers {
            if customer.id <= 0 {
                return Err(LedgerError::Validation(format!(
                    "Customer {:?} has no id",
                    customer.name
                )));
            }
            customers_checked.push(customer.validated()?);
        }
        let mut transactions_checked = Vec::with_capacity(transactions.len());
        for tx in transactions {
            if tx.id <= 0 {
                return Err(LedgerError::Validation("Transaction has no id".to_string()));
            }
            transactions_checked.push(tx.validated()?);
        }

        let mut conn = self.lock_conn()?;
        let db_tx = conn.transaction()?;
        db_tx.execute("DELETE FROM transactions", [])?;
        db_tx.execute("DELETE FROM customers", [])?;

        for customer in &customers_checked {
            db_tx.execute(
                "INSERT INTO customers (id, name, phone, is_deleted) VALUES (?1, ?2, ?3, ?4)",
                params![customer.id, customer.name, customer.phone, customer.is_deleted],
            )?;
        }
        for tx in &transactions_checked {
            Self::insert_transaction(&db_tx, tx, true)?;
        }
        db_tx.commit()?;

        tracing::debug!(
            customers = customers_checked.len(),
            transactions = transactions_checked.len(),
            "Ledger replaced"
        );
        Ok(())
    }
}
