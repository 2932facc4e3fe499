//! JSON output formatting.

use std::collections::HashMap;

use serde::Serialize;
use veresiye_core::storage::Transaction;

use super::text::customer_name;

/// Pretty-print any serializable value to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A transaction with its customer's display name attached.
pub fn transaction_json(tx: &Transaction, names: &HashMap<i64, String>) -> serde_json::Value {
    serde_json::json!({
        "id": tx.id,
        "customer_id": tx.customer_id,
        "customer_name": customer_name(names, tx.customer_id),
        "amount": tx.amount,
        "direction": tx.direction,
        "currency": tx.currency.slug(),
        "date": tx.date,
        "description": tx.description,
        "is_deposit": tx.is_deposit,
        "is_hidden": tx.is_hidden,
    })
}

pub fn transactions_json(
    transactions: &[Transaction],
    names: &HashMap<i64, String>,
) -> Vec<serde_json::Value> {
    transactions
        .iter()
        .map(|tx| transaction_json(tx, names))
        .collect()
}
