//! Row types for database queries.
//!
//! Rows are read into raw structs first and parsed into domain types
//! separately, so decoding failures carry a storage error instead of a
//! SQLite column-type error.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::storage::types::{Currency, Customer, Direction, QuickEntry, Transaction};

pub const CUSTOMER_COLUMNS: &str = "id, name, phone, is_deleted";

pub const TRANSACTION_COLUMNS: &str =
    "id, customer_id, amount, direction, currency, date, description, is_deleted, is_deposit, is_hidden";

pub const QUICK_ENTRY_COLUMNS: &str =
    "id, full_name, national_id, created_at, amount, is_processed, is_deleted";

/// Timestamps are stored with full precision so they survive a round trip.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(LedgerError::Storage(format!("Invalid timestamp: {}", raw)))
}

/// Amounts are TEXT in current files; older files may carry numbers.
pub fn decimal_from_value(value: Value) -> Result<Decimal> {
    match value {
        Value::Text(text) => Decimal::from_str(text.trim())
            .map_err(|e| LedgerError::Storage(format!("Invalid amount {:?}: {}", text, e))),
        Value::Integer(int) => Ok(Decimal::from(int)),
        Value::Real(real) => Decimal::from_f64(real)
            .ok_or_else(|| LedgerError::Storage(format!("Invalid amount: {}", real))),
        other => Err(LedgerError::Storage(format!(
            "Invalid amount column type: {:?}",
            other.data_type()
        ))),
    }
}

/// Raw row data from the customers table.
#[derive(Debug)]
pub struct CustomerRow {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub is_deleted: bool,
}

impl CustomerRow {
    /// Read a row selected with [`CUSTOMER_COLUMNS`] order.
    pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            phone: row.get(2)?,
            is_deleted: row.get(3)?,
        })
    }
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone.filter(|p| !p.is_empty()),
            is_deleted: row.is_deleted,
        }
    }
}

/// Raw row data from the transactions table.
#[derive(Debug)]
pub struct TransactionRow {
    pub id: i64,
    pub customer_id: i64,
    pub amount: Value,
    pub direction: i64,
    pub currency: i64,
    pub date: String,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub is_deposit: bool,
    pub is_hidden: bool,
}

impl TransactionRow {
    /// Read a row selected with [`TRANSACTION_COLUMNS`] order.
    pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            customer_id: row.get(1)?,
            amount: row.get(2)?,
            direction: row.get(3)?,
            currency: row.get(4)?,
            date: row.get(5)?,
            description: row.get(6)?,
            is_deleted: row.get(7)?,
            is_deposit: row.get(8)?,
            is_hidden: row.get(9)?,
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = LedgerError;

    fn try_from(row: TransactionRow) -> Result<Self> {
        let amount = decimal_from_value(row.amount)?;
        let direction = Direction::from_code(row.direction)
            .map_err(|e| LedgerError::Storage(format!("Transaction {}: {}", row.id, e)))?;
        let currency = Currency::from_code(row.currency)
            .map_err(|e| LedgerError::Storage(format!("Transaction {}: {}", row.id, e)))?;
        let date = parse_timestamp(&row.date)?;

        Ok(Transaction {
            id: row.id,
            customer_id: row.customer_id,
            amount,
            direction,
            currency,
            date,
            description: row.description.filter(|d| !d.is_empty()),
            is_deleted: row.is_deleted,
            is_deposit: row.is_deposit,
            is_hidden: row.is_hidden,
        })
    }
}

/// Raw row data from the quick_entries table.
#[derive(Debug)]
pub struct QuickEntryRow {
    pub id: i64,
    pub full_name: String,
    pub national_id: Option<String>,
    pub created_at: String,
    pub amount: Value,
    pub is_processed: bool,
    pub is_deleted: bool,
}

impl QuickEntryRow {
    pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            full_name: row.get(1)?,
            national_id: row.get(2)?,
            created_at: row.get(3)?,
            amount: row.get(4)?,
            is_processed: row.get(5)?,
            is_deleted: row.get(6)?,
        })
    }
}

impl TryFrom<QuickEntryRow> for QuickEntry {
    type Error = LedgerError;

    fn try_from(row: QuickEntryRow) -> Result<Self> {
        Ok(QuickEntry {
            id: row.id,
            full_name: row.full_name,
            national_id: row.national_id.filter(|n| !n.is_empty()),
            created_at: parse_timestamp(&row.created_at)?,
            amount: decimal_from_value(row.amount)?,
            is_processed: row.is_processed,
            is_deleted: row.is_deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_timestamp_round_trip_keeps_nanoseconds() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(&ts)).unwrap(), ts);
    }

    #[test]
    fn test_parse_timestamp_accepts_naive_sqlite_format() {
        let parsed = parse_timestamp("2024-03-01 14:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_decimal_from_value() {
        assert_eq!(decimal_from_value(Value::Text("12.50".into())).unwrap(), dec!(12.50));
        assert_eq!(decimal_from_value(Value::Integer(7)).unwrap(), dec!(7));
        assert_eq!(decimal_from_value(Value::Real(0.25)).unwrap(), dec!(0.25));
        assert!(decimal_from_value(Value::Null).is_err());
        assert!(decimal_from_value(Value::Text("abc".into())).is_err());
    }
}
