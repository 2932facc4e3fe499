//! Table rows and labels for text output.

use std::collections::HashMap;

use chrono::{DateTime, Local, Utc};
use veresiye_core::export::{format_phone, format_with_unit};
use veresiye_core::ledger::{CurrencyBalance, UNKNOWN_CUSTOMER};
use veresiye_core::storage::{Customer, CustomerFilter, Direction, StorageEngine, Transaction};

/// Map customer id -> name for display, including deleted customers.
pub fn customer_name_map<S: StorageEngine + ?Sized>(
    storage: &S,
) -> anyhow::Result<HashMap<i64, String>> {
    let customers = storage.list_customers(&CustomerFilter::new().include_deleted())?;
    Ok(customers.into_iter().map(|c| (c.id, c.name)).collect())
}

pub fn customer_name(names: &HashMap<i64, String>, id: i64) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string())
}

pub fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::CustomerOwesStore => "Borç",
        Direction::StoreOwesCustomer => "Alacak",
    }
}

/// `dd.MM.yyyy HH:mm` in local time.
pub fn short_date(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string()
}

pub fn customer_rows(customers: &[Customer]) -> Vec<Vec<String>> {
    customers
        .iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                c.name.clone(),
                c.phone.as_deref().map(format_phone).unwrap_or_default(),
            ]
        })
        .collect()
}

pub fn transaction_rows(
    transactions: &[Transaction],
    names: &HashMap<i64, String>,
) -> Vec<Vec<String>> {
    transactions
        .iter()
        .map(|tx| {
            let mut flags = Vec::new();
            if tx.is_deposit {
                flags.push("emanet");
            }
            if tx.is_hidden {
                flags.push("gizli");
            }
            vec![
                tx.id.to_string(),
                short_date(&tx.date),
                customer_name(names, tx.customer_id),
                direction_label(tx.direction).to_string(),
                format_with_unit(tx.amount, tx.currency),
                tx.description.clone().unwrap_or_default(),
                flags.join(","),
            ]
        })
        .collect()
}

pub fn balance_rows(balances: &[CurrencyBalance]) -> Vec<Vec<String>> {
    balances
        .iter()
        .map(|b| {
            vec![
                b.currency.display_name().to_string(),
                format_with_unit(b.outgoing, b.currency),
                format_with_unit(b.incoming, b.currency),
                format_with_unit(b.net, b.currency),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use veresiye_core::storage::Currency;

    #[test]
    fn test_unknown_customer_fallback() {
        let names = HashMap::from([(1, "Ayşe".to_string())]);
        assert_eq!(customer_name(&names, 1), "Ayşe");
        assert_eq!(customer_name(&names, 2), UNKNOWN_CUSTOMER);
    }

    #[test]
    fn test_transaction_rows_show_units_and_flags() {
        let names = HashMap::from([(1, "Ayşe".to_string())]);
        let tx = Transaction::new(
            1,
            dec!(2.5),
            Direction::StoreOwesCustomer,
            Currency::Gold22K,
            Utc.with_ymd_and_hms(2024, 2, 3, 12, 0, 0).unwrap(),
        )
        .deposit();
        let rows = transaction_rows(&[tx], &names);
        assert_eq!(rows[0][2], "Ayşe");
        assert_eq!(rows[0][3], "Alacak");
        assert_eq!(rows[0][4], "2,50 gr");
        assert_eq!(rows[0][6], "emanet");
    }

    #[test]
    fn test_customer_rows_format_phone() {
        let customer = Customer::new("Derya").with_phone("5321234567");
        assert_eq!(customer_rows(&[customer])[0][2], "(532) 123 45 67");
    }
}
