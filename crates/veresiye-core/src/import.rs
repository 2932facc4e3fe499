//! Read-only view of a store file picked from another device.
//!
//! The file is validated and loaded once; nothing is ever written back and
//! the live store is not involved.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::ledger::{customer_balances, BalanceOptions, CurrencyBalance};
use crate::query::{sort_customers, CustomerSortField, SortDirection};
use crate::storage::sqlite::snapshot::LedgerSnapshot;
use crate::storage::types::{Customer, Transaction};

/// Live customers and transactions of a foreign store file.
#[derive(Debug, Clone)]
pub struct ImportedLedger {
    path: PathBuf,
    customers: Vec<Customer>,
    transactions: Vec<Transaction>,
}

impl ImportedLedger {
    /// Validate and load `path`.
    ///
    /// Fails with `Io` for a missing file and `Format` for a file that is
    /// not a store.
    pub fn open(path: &Path) -> Result<Self> {
        let snapshot = LedgerSnapshot::load(path)?;

        let mut customers: Vec<Customer> = snapshot.live_customers().cloned().collect();
        sort_customers(&mut customers, CustomerSortField::Name, SortDirection::Ascending);

        let mut transactions: Vec<Transaction> = snapshot.live_transactions().cloned().collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

        tracing::info!(
            path = %path.display(),
            customers = customers.len(),
            transactions = transactions.len(),
            "Imported store opened"
        );
        Ok(Self {
            path: path.to_path_buf(),
            customers,
            transactions,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Customers in Turkish name order.
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Transactions, newest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn customer(&self, id: i64) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn transactions_by_customer(&self, customer_id: i64) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|tx| tx.customer_id == customer_id)
            .cloned()
            .collect()
    }

    pub fn balances(&self, customer_id: i64, opts: BalanceOptions) -> Result<Vec<CurrencyBalance>> {
        customer_balances(&self.transactions_by_customer(customer_id), opts)
    }
}
