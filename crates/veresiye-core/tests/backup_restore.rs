use std::fs;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::Connection;
use rust_decimal_macros::dec;
use tempfile::tempdir;

use veresiye_core::backup::{BackupConfig, BackupCoordinator};
use veresiye_core::storage::{
    Currency, Customer, CustomerFilter, Direction, Settings, SqliteStorage, StorageEngine,
    Transaction, TransactionFilter,
};

fn stamp(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn seed(storage: &SqliteStorage) -> (i64, i64) {
    let a = storage.save_customer(&Customer::new("Orhan")).unwrap();
    let b = storage.save_customer(&Customer::new("Pınar")).unwrap();
    storage
        .save_transaction(&Transaction::new(
            a,
            dec!(120.5),
            Direction::CustomerOwesStore,
            Currency::TurkishLira,
            Utc::now(),
        ))
        .unwrap();
    storage
        .save_transaction(
            &Transaction::new(b, dec!(2), Direction::StoreOwesCustomer, Currency::HalfGold, Utc::now())
                .deposit(),
        )
        .unwrap();
    (a, b)
}

#[test]
fn test_backup_then_restore_round_trip() {
    let dir = tempdir().expect("tempdir should be created");
    let storage = SqliteStorage::open(&dir.path().join("live.db")).expect("open should succeed");
    let (a, _) = seed(&storage);
    let settings = Settings {
        business_name: "Altın Sarayı".to_string(),
        ..Settings::default()
    };
    storage.save_settings(&settings).unwrap();

    let coordinator = BackupCoordinator::new(&storage, BackupConfig::in_directory(dir.path().join("backups")));
    let report = coordinator.backup_at(stamp(1));
    assert!(report.success, "{}", report.message);
    let backup_path = report.path.expect("backup path should be set");
    assert!(backup_path.ends_with("veresiye_backup_20240501_090000.db"));
    assert_eq!(
        fs::read(&backup_path).unwrap(),
        fs::read(storage.path()).unwrap()
    );

    let before_customers = storage.list_customers(&CustomerFilter::new()).unwrap();
    let before_txs = storage.list_transactions(&TransactionFilter::new()).unwrap();

    // Diverge after the backup.
    storage.soft_delete_customer(a).unwrap();
    storage.save_customer(&Customer::new("Sonradan")).unwrap();
    storage
        .save_settings(&Settings {
            business_name: "Changed".to_string(),
            ..Settings::default()
        })
        .unwrap();

    let restored = coordinator.restore(&backup_path);
    assert!(restored.success, "{}", restored.message);
    assert_eq!(restored.customers, 2);
    assert_eq!(restored.transactions, 2);

    assert_eq!(storage.list_customers(&CustomerFilter::new()).unwrap(), before_customers);
    assert_eq!(storage.list_transactions(&TransactionFilter::new()).unwrap(), before_txs);
    assert_eq!(storage.settings().unwrap().unwrap().business_name, "Changed");

    // Ids continue above the restored rows.
    let next = storage.save_customer(&Customer::new("Yeni Müşteri")).unwrap();
    assert!(next > before_customers.iter().map(|c| c.id).max().unwrap());
}

#[test]
fn test_failed_restore_leaves_live_data_intact() {
    let dir = tempdir().unwrap();
    let storage = SqliteStorage::open(&dir.path().join("live.db")).unwrap();
    seed(&storage);
    let before = storage.list_transactions(&TransactionFilter::new()).unwrap();
    let coordinator = BackupCoordinator::new(&storage, BackupConfig::in_directory(dir.path()));

    let missing = coordinator.restore(&dir.path().join("missing.db"));
    assert!(!missing.success);

    let garbage = dir.path().join("garbage.db");
    fs::write(&garbage, vec![b'x'; 4096]).unwrap();
    let report = coordinator.restore(&garbage);
    assert!(!report.success);
    assert!(report.message.starts_with("Restore failed"));

    let no_customers = dir.path().join("empty.db");
    Connection::open(&no_customers)
        .unwrap()
        .execute_batch("CREATE TABLE other (id INTEGER);")
        .unwrap();
    assert!(!coordinator.restore(&no_customers).success);

    let bad_rows = dir.path().join("bad_rows.db");
    Connection::open(&bad_rows)
        .unwrap()
        .execute_batch(
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, phone TEXT);
             CREATE TABLE transactions (id INTEGER PRIMARY KEY, customer_id INTEGER, amount TEXT,
                 direction INTEGER, currency INTEGER, date TEXT, description TEXT);
             INSERT INTO customers VALUES (1, 'Tuba', NULL);
             INSERT INTO transactions VALUES (1, 1, '-5', 0, 0, '2024-01-01T00:00:00Z', NULL);",
        )
        .unwrap();
    assert!(!coordinator.restore(&bad_rows).success);

    let unknown_currency = dir.path().join("unknown_currency.db");
    Connection::open(&unknown_currency)
        .unwrap()
        .execute_batch(
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, phone TEXT);
             CREATE TABLE transactions (id INTEGER PRIMARY KEY, customer_id INTEGER, amount TEXT,
                 direction INTEGER, currency INTEGER, date TEXT, description TEXT);
             INSERT INTO customers VALUES (1, 'Tuba', NULL);
             INSERT INTO transactions VALUES (1, 1, '5', 0, 42, '2024-01-01T00:00:00Z', NULL);",
        )
        .unwrap();
    assert!(!coordinator.restore(&unknown_currency).success);

    assert_eq!(storage.list_transactions(&TransactionFilter::new()).unwrap(), before);
}

#[test]
fn test_restore_from_file_without_transactions_table() {
    let dir = tempdir().unwrap();
    let storage = SqliteStorage::open(&dir.path().join("live.db")).unwrap();
    seed(&storage);

    let old = dir.path().join("old.db");
    Connection::open(&old)
        .unwrap()
        .execute_batch(
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, phone TEXT);
             INSERT INTO customers VALUES (5, 'Umut', '5051234567');",
        )
        .unwrap();

    let coordinator = BackupCoordinator::new(&storage, BackupConfig::in_directory(dir.path()));
    let report = coordinator.restore(&old);
    assert!(report.success, "{}", report.message);
    assert_eq!(report.customers, 1);
    assert_eq!(report.transactions, 0);
    assert!(storage.list_transactions(&TransactionFilter::new()).unwrap().is_empty());
    assert_eq!(storage.get_customer(5).unwrap().unwrap().name, "Umut");
}

#[test]
fn test_list_and_prune_backups() {
    let dir = tempdir().unwrap();
    let storage = SqliteStorage::open(&dir.path().join("live.db")).unwrap();
    let config = BackupConfig {
        retention_days: 10,
        ..BackupConfig::in_directory(dir.path().join("backups"))
    };
    let coordinator = BackupCoordinator::new(&storage, config);

    for day in [1, 15, 20] {
        assert!(coordinator.backup_at(stamp(day)).success);
    }
    fs::write(dir.path().join("backups").join("readme.txt"), b"not a backup").unwrap();

    let listed = coordinator.list_backups().unwrap();
    let days: Vec<NaiveDateTime> = listed.iter().map(|b| b.created_at).collect();
    assert_eq!(days, vec![stamp(20), stamp(15), stamp(1)]);

    let removed = coordinator.prune_before(stamp(21)).unwrap();
    assert_eq!(removed.len(), 1);
    assert!(removed[0].ends_with("veresiye_backup_20240501_090000.db"));
    assert_eq!(coordinator.list_backups().unwrap().len(), 2);
    assert!(dir.path().join("backups").join("readme.txt").exists());
}

#[test]
fn test_backup_of_missing_live_file_reports_failure() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let dir = tempdir().unwrap();
    let coordinator = BackupCoordinator::new(&storage, BackupConfig::in_directory(dir.path()));

    let report = coordinator.backup();
    assert!(!report.success);
    assert!(report.path.is_none());
    assert!(coordinator.list_backups().unwrap().is_empty());
}

#[test]
fn test_upload_artifact_matches_live_file() {
    let dir = tempdir().unwrap();
    let storage = SqliteStorage::open(&dir.path().join("live.db")).unwrap();
    seed(&storage);
    let coordinator = BackupCoordinator::new(&storage, BackupConfig::default());

    let temp = dir.path().join("upload");
    let artifact = coordinator
        .create_upload_artifact(&temp)
        .expect("artifact should be created");
    assert_eq!(artifact.bytes, fs::read(storage.path()).unwrap());
    assert!(artifact.file_name().starts_with("veresiye_backup_"));

    let path = artifact.path.clone();
    assert!(path.exists());
    artifact.discard();
    assert!(!path.exists());
}

#[test]
fn test_restore_keeps_a_copy_of_the_replaced_data() {
    let dir = tempdir().unwrap();
    let storage = SqliteStorage::open(&dir.path().join("live.db")).unwrap();
    seed(&storage);
    let coordinator = BackupCoordinator::new(&storage, BackupConfig::in_directory(dir.path().join("backups")));
    let backup_path = coordinator.backup_at(stamp(1)).path.expect("backup path should be set");

    storage.save_customer(&Customer::new("Sonradan")).unwrap();
    let live_bytes = fs::read(storage.path()).unwrap();

    let report = coordinator.restore_at(&backup_path, stamp(2));
    assert!(report.success, "{}", report.message);
    let copy = report.before_restore.expect("copy path should be set");
    assert!(copy.ends_with("before_restore_20240502_090000.db"));
    assert_eq!(fs::read(&copy).unwrap(), live_bytes);

    let kept = SqliteStorage::open(&copy).unwrap();
    let names: Vec<String> = kept
        .list_customers(&CustomerFilter::new())
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert!(names.contains(&"Sonradan".to_string()));

    // The copy is not a regular backup.
    assert_eq!(coordinator.list_backups().unwrap().len(), 1);
}

#[test]
fn test_restore_aborts_when_the_copy_cannot_be_written() {
    let dir = tempdir().unwrap();
    let storage = SqliteStorage::open(&dir.path().join("live.db")).unwrap();
    seed(&storage);
    let good = BackupCoordinator::new(&storage, BackupConfig::in_directory(dir.path().join("backups")));
    let backup_path = good.backup_at(stamp(1)).path.unwrap();
    storage.save_customer(&Customer::new("Sonradan")).unwrap();
    let before = storage.list_customers(&CustomerFilter::new()).unwrap();

    let blocked = dir.path().join("not_a_directory");
    fs::write(&blocked, b"file").unwrap();
    let coordinator = BackupCoordinator::new(&storage, BackupConfig::in_directory(&blocked));

    let report = coordinator.restore(&backup_path);
    assert!(!report.success);
    assert!(report.before_restore.is_none());
    assert!(report.message.contains("Could not save the current data"));
    assert_eq!(storage.list_customers(&CustomerFilter::new()).unwrap(), before);
}

#[test]
fn test_prune_with_huge_retention_removes_nothing() {
    let dir = tempdir().unwrap();
    let storage = SqliteStorage::open(&dir.path().join("live.db")).unwrap();
    let config = BackupConfig {
        retention_days: u32::MAX,
        ..BackupConfig::in_directory(dir.path().join("backups"))
    };
    let coordinator = BackupCoordinator::new(&storage, config);
    assert!(coordinator.backup_at(stamp(1)).success);

    assert!(coordinator.prune().unwrap().is_empty());
    assert!(coordinator.prune_before(stamp(3)).unwrap().is_empty());
    assert_eq!(coordinator.list_backups().unwrap().len(), 1);
}
