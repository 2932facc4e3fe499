use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use rust_decimal_macros::dec;
use tempfile::tempdir;

use veresiye_core::ledger::{indebted_customer_count, BalanceOptions, Ledger};
use veresiye_core::query::{CustomerQuery, QueryEngine, TransactionQuery};
use veresiye_core::storage::{
    Currency, Customer, CustomerFilter, Direction, SqliteStorage, StorageEngine, Transaction,
    TransactionFilter,
};
use veresiye_core::LedgerError;

fn owes(customer_id: i64, amount: rust_decimal::Decimal, currency: Currency) -> Transaction {
    Transaction::new(customer_id, amount, Direction::CustomerOwesStore, currency, Utc::now())
}

#[test]
fn test_records_survive_reopen() {
    let dir = tempdir().expect("tempdir should be created");
    let path = dir.path().join("data").join("veresiye.db");

    let date = Utc.with_ymd_and_hms(2024, 4, 2, 11, 30, 15).unwrap() + chrono::Duration::microseconds(250);
    let (customer_id, tx_id) = {
        let storage = SqliteStorage::open(&path).expect("open should succeed");
        let customer_id = storage
            .save_customer(&Customer::new("Gülşen Aydın").with_phone("5321112233"))
            .expect("save customer should succeed");
        let tx = Transaction::new(
            customer_id,
            dec!(1250.75),
            Direction::CustomerOwesStore,
            Currency::Gold22K,
            date,
        )
        .with_description("Bilezik 22 ayar");
        let tx_id = storage.save_transaction(&tx).expect("save transaction should succeed");
        (customer_id, tx_id)
    };

    let storage = SqliteStorage::open(&path).expect("reopen should succeed");
    assert!(storage.migration_report().is_noop());

    let customer = storage
        .get_customer(customer_id)
        .expect("get should succeed")
        .expect("customer should exist");
    assert_eq!(customer.name, "Gülşen Aydın");
    assert_eq!(customer.phone.as_deref(), Some("5321112233"));

    let tx = storage
        .get_transaction(tx_id)
        .expect("get should succeed")
        .expect("transaction should exist");
    assert_eq!(tx.amount, dec!(1250.75));
    assert_eq!(tx.currency, Currency::Gold22K);
    assert_eq!(tx.date, date);
    assert_eq!(tx.description.as_deref(), Some("Bilezik 22 ayar"));
}

#[test]
fn test_customer_delete_cascades_to_transactions() {
    let storage = SqliteStorage::open_in_memory().expect("open should succeed");
    let doomed = storage.save_customer(&Customer::new("Kemal")).unwrap();
    let kept = storage.save_customer(&Customer::new("Leyla")).unwrap();

    for _ in 0..3 {
        storage.save_transaction(&owes(doomed, dec!(10), Currency::TurkishLira)).unwrap();
    }
    let kept_tx = storage.save_transaction(&owes(kept, dec!(7), Currency::Euro)).unwrap();

    let cascaded = storage.soft_delete_customer(doomed).expect("delete should succeed");
    assert_eq!(cascaded, 3);

    assert!(storage.get_customer(doomed).unwrap().is_none());
    let live = storage.list_transactions(&TransactionFilter::new()).unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].id, kept_tx);

    let everything = storage
        .list_transactions(&TransactionFilter::new().include_deleted())
        .unwrap();
    assert_eq!(everything.len(), 4);
    assert!(everything
        .iter()
        .filter(|t| t.customer_id == doomed)
        .all(|t| t.is_deleted));

    let customers = storage.list_customers(&CustomerFilter::new()).unwrap();
    assert_eq!(customers.len(), 1);

    assert!(matches!(
        storage.soft_delete_customer(doomed),
        Err(LedgerError::NotFound(_))
    ));
}

#[test]
fn test_deleted_records_drop_out_of_queries_and_balances() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let a = storage.save_customer(&Customer::new("Ali")).unwrap();
    let b = storage.save_customer(&Customer::new("Berk")).unwrap();

    storage.save_transaction(&owes(a, dec!(100), Currency::TurkishLira)).unwrap();
    storage.save_transaction(&owes(a, dec!(3), Currency::Gold14K)).unwrap();
    let b_tx = storage.save_transaction(&owes(b, dec!(50), Currency::TurkishLira)).unwrap();

    let txs = storage.list_transactions(&TransactionFilter::new()).unwrap();
    assert_eq!(indebted_customer_count(&txs).unwrap(), 2);

    storage.soft_delete_transaction(b_tx).unwrap();
    let txs = storage.list_transactions(&TransactionFilter::new()).unwrap();
    assert_eq!(indebted_customer_count(&txs).unwrap(), 1);

    let engine = QueryEngine::new(&storage);
    assert_eq!(engine.transaction_count(&TransactionQuery::new()).unwrap(), 2);
    assert_eq!(engine.customer_count(&CustomerQuery::new()).unwrap(), 2);

    let ledger = Ledger::new(&storage);
    assert_eq!(
        ledger
            .net_balance(b, Currency::TurkishLira, BalanceOptions::all())
            .unwrap(),
        dec!(0)
    );
    let summary = ledger.summary(BalanceOptions::all(), 5).unwrap();
    assert_eq!(summary.transaction_count, 2);
    assert_eq!(summary.currencies[Currency::TurkishLira as usize].owed_to_business, dec!(100));
}

#[test]
fn test_out_of_range_balances_fail_without_panicking() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let id = storage.save_customer(&Customer::new("Kuyumcu Emre")).unwrap();
    for _ in 0..2 {
        storage
            .save_transaction(&owes(id, rust_decimal::Decimal::MAX, Currency::TurkishLira))
            .unwrap();
    }

    let ledger = Ledger::new(&storage);
    assert!(matches!(
        ledger.balances(id, BalanceOptions::all()),
        Err(LedgerError::Validation(_))
    ));
    assert!(matches!(
        ledger.summary(BalanceOptions::all(), 5),
        Err(LedgerError::Validation(_))
    ));
    assert!(matches!(
        ledger.statement(id, BalanceOptions::all()),
        Err(LedgerError::Validation(_))
    ));
}

#[test]
fn test_statement_for_missing_customer_is_not_found() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let ledger = Ledger::new(&storage);
    assert!(matches!(
        ledger.statement(77, BalanceOptions::all()),
        Err(LedgerError::NotFound(_))
    ));
}

#[test]
fn test_legacy_file_is_migrated_on_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE customers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL COLLATE NOCASE,
                phone TEXT
            );
            CREATE TABLE transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id INTEGER NOT NULL,
                amount TEXT NOT NULL,
                direction INTEGER NOT NULL,
                currency INTEGER NOT NULL DEFAULT 0,
                date TEXT NOT NULL,
                description TEXT
            );
            INSERT INTO customers (id, name, phone) VALUES (2, 'Şeyma', '5059998877');
            INSERT INTO transactions (customer_id, amount, direction, currency, date)
            VALUES (2, '40', 1, 10, '2023-12-31 18:00:00');
            "#,
        )
        .unwrap();
    }

    let storage = SqliteStorage::open(&path).expect("legacy open should succeed");
    let report = storage.migration_report();
    assert_eq!(report.from_version, 0);
    assert!(report.applied.iter().any(|s| s.contains("rebuilt customers")));

    let customer = storage.get_customer(2).unwrap().expect("row should survive");
    assert_eq!(customer.name, "Şeyma");

    let txs = storage.list_transactions(&TransactionFilter::new().customer(2)).unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].currency, Currency::Ziynet);
    assert_eq!(txs[0].direction, Direction::StoreOwesCustomer);
    assert!(!txs[0].is_deposit);

    // Name uniqueness now follows the Turkish fold.
    let err = storage.save_customer(&Customer::new("ŞEYMA")).unwrap_err();
    assert!(err.is_validation());

    storage.refresh_schema().expect("refresh should succeed");
}
