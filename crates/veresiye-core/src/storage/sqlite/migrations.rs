//! Schema creation and versioned migrations.
//!
//! Every open runs [`run`]. Each step checks the live schema before acting,
//! so running the whole sequence again on an up-to-date file changes nothing.
//!
//! | version | step                                                      |
//! |---------|-----------------------------------------------------------|
//! | 1       | create tables and indexes if absent                       |
//! | 2       | add soft-delete, deposit and hidden flag columns          |
//! | 3       | rebuild `customers` with `name COLLATE TURKISH_NOCASE`    |

use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;

use super::COLLATION_NAME;

/// Schema version written by this build.
pub const SCHEMA_VERSION: i64 = 3;

const CUSTOMERS_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS {table} (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL COLLATE TURKISH_NOCASE,
        phone TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0
    );
"#;

const BASE_SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        direction INTEGER NOT NULL,
        currency INTEGER NOT NULL DEFAULT 0,
        date TEXT NOT NULL,
        description TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        is_deposit INTEGER NOT NULL DEFAULT 0,
        is_hidden INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_transactions_customer_id
    ON transactions(customer_id);

    CREATE TABLE IF NOT EXISTS quick_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        full_name TEXT NOT NULL,
        national_id TEXT,
        created_at TEXT NOT NULL,
        amount TEXT NOT NULL,
        is_processed INTEGER NOT NULL DEFAULT 0,
        is_deleted INTEGER NOT NULL DEFAULT 0
    );

    -- Singleton row, never touched by restore
    CREATE TABLE IF NOT EXISTS settings (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        business_name TEXT NOT NULL DEFAULT '',
        cloud_client_id TEXT NOT NULL DEFAULT '',
        cloud_client_secret TEXT NOT NULL DEFAULT '',
        setup_completed INTEGER NOT NULL DEFAULT 0
    );
"#;

/// Flag columns added after the first release.
const FLAG_COLUMNS: [(&str, &str); 4] = [
    ("customers", "is_deleted"),
    ("transactions", "is_deleted"),
    ("transactions", "is_deposit"),
    ("transactions", "is_hidden"),
];

/// What a migration run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version recorded in the file before this run (0 for a fresh or legacy file)
    pub from_version: i64,
    /// Version recorded after this run
    pub to_version: i64,
    /// Human-readable description of each step that changed the schema
    pub applied: Vec<String>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Bring the schema of an open connection up to [`SCHEMA_VERSION`].
///
/// The connection must already have the Turkish collation registered.
pub fn run(conn: &mut Connection) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();

    let had_customers = table_exists(conn, "customers")?;
    conn.execute_batch(BASE_SCHEMA_SQL)?;
    report.from_version = schema_version(conn)?;
    if !had_customers {
        conn.execute_batch(&CUSTOMERS_TABLE_SQL.replace("{table}", "customers"))?;
        report.applied.push("created customers table".to_string());
    }

    for (table, column) in FLAG_COLUMNS {
        if !column_exists(conn, table, column)? {
            conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {} INTEGER NOT NULL DEFAULT 0",
                table, column
            ))?;
            report.applied.push(format!("added {}.{}", table, column));
        }
    }

    if !customers_have_collation(conn)? {
        let copied = rebuild_customers_with_collation(conn)?;
        report.applied.push(format!(
            "rebuilt customers with {} collation ({} rows)",
            COLLATION_NAME, copied
        ));
    }

    if report.from_version != SCHEMA_VERSION {
        conn.execute(
            "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [SCHEMA_VERSION.to_string()],
        )?;
    }
    report.to_version = SCHEMA_VERSION;

    for step in &report.applied {
        tracing::info!(step = %step, "Schema migration applied");
    }
    Ok(report)
}

/// Version recorded in `meta`, or 0 when absent.
pub fn schema_version(conn: &Connection) -> Result<i64> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut columns = Vec::new();
    for row in rows {
        columns.push(row?);
    }
    Ok(columns)
}

pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    Ok(table_columns(conn, table)?
        .iter()
        .any(|c| c.eq_ignore_ascii_case(column)))
}

fn customers_have_collation(conn: &Connection) -> Result<bool> {
    let sql: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'customers'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(sql
        .map(|s| s.to_ascii_uppercase().contains(COLLATION_NAME))
        .unwrap_or(false))
}

/// Shadow-table swap in one SQLite transaction: create, copy, drop, rename.
///
/// An interruption anywhere rolls back to the original table.
fn rebuild_customers_with_collation(conn: &mut Connection) -> Result<usize> {
    let columns: Vec<String> = table_columns(conn, "customers")?
        .into_iter()
        .filter(|c| ["id", "name", "phone", "is_deleted"].contains(&c.to_ascii_lowercase().as_str()))
        .collect();
    let column_list = columns.join(", ");

    let tx = conn.transaction()?;
    tx.execute_batch("DROP TABLE IF EXISTS customers_shadow;")?;
    tx.execute_batch(&CUSTOMERS_TABLE_SQL.replace("{table}", "customers_shadow"))?;
    let copied = tx.execute(
        &format!(
            "INSERT INTO customers_shadow ({cols}) SELECT {cols} FROM customers",
            cols = column_list
        ),
        [],
    )?;
    tx.execute_batch(
        "DROP TABLE customers;
         ALTER TABLE customers_shadow RENAME TO customers;",
    )?;
    tx.commit()?;
    Ok(copied)
}
