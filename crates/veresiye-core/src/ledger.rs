//! Per-currency balance calculation.
//!
//! The free functions work on transaction slices and never touch storage;
//! [`Ledger`] reads through a [`StorageEngine`] and feeds them.
//!
//! Sign convention: a positive net means the customer owes the business,
//! a negative net means the business owes the customer. Currencies are never
//! mixed and no rounding happens during accumulation.

use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{LedgerError, Result};
use crate::export::CustomerStatement;
use crate::storage::traits::StorageEngine;
use crate::storage::types::{Currency, Customer, Direction, Transaction, TransactionFilter};

/// Name shown for activity rows whose customer record is gone.
pub const UNKNOWN_CUSTOMER: &str = "Bilinmeyen Müşteri";

/// Which transactions count toward a balance.
///
/// Soft-deleted transactions never count. Deposits count unless
/// `exclude_deposits` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceOptions {
    pub exclude_deposits: bool,
}

impl BalanceOptions {
    /// The full ledger, deposits included.
    pub fn all() -> Self {
        Self {
            exclude_deposits: false,
        }
    }

    /// Active debt only, deposits excluded.
    pub fn active() -> Self {
        Self {
            exclude_deposits: true,
        }
    }

    pub fn admits(&self, tx: &Transaction) -> bool {
        !tx.is_deleted && !(self.exclude_deposits && tx.is_deposit)
    }
}

/// One currency bucket of a customer's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyBalance {
    pub currency: Currency,
    /// Sum of amounts the customer took on credit
    pub outgoing: Decimal,
    /// Sum of amounts the business holds for the customer
    pub incoming: Decimal,
    pub net: Decimal,
}

impl CurrencyBalance {
    fn empty(currency: Currency) -> Self {
        Self {
            currency,
            outgoing: Decimal::ZERO,
            incoming: Decimal::ZERO,
            net: Decimal::ZERO,
        }
    }

    fn add(&mut self, tx: &Transaction) -> Result<()> {
        match tx.direction {
            Direction::CustomerOwesStore => self.outgoing = checked_add(self.outgoing, tx.amount)?,
            Direction::StoreOwesCustomer => self.incoming = checked_add(self.incoming, tx.amount)?,
        }
        // Both sides are non-negative, so the difference stays in range.
        self.net = self.outgoing - self.incoming;
        Ok(())
    }

    pub fn is_settled(&self) -> bool {
        self.net.is_zero()
    }
}

/// The currency with the most transactions, and that count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyActivity {
    pub currency: Currency,
    pub count: usize,
}

/// Business-wide totals for one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencySummary {
    pub currency: Currency,
    /// Sum of positive per-customer nets
    pub owed_to_business: Decimal,
    /// Sum of the magnitudes of negative per-customer nets
    pub owed_to_customers: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerActivity {
    pub customer_id: i64,
    pub customer_name: String,
    pub transaction_count: usize,
}

fn checked_add(total: Decimal, amount: Decimal) -> Result<Decimal> {
    total.checked_add(amount).ok_or_else(|| {
        LedgerError::Validation(format!("Balance out of range after adding {}", amount))
    })
}

/// Balances per currency, in enumeration order, for currencies that appear.
///
/// Callers pass one customer's transactions; passing several customers
/// nets them together.
pub fn customer_balances(
    transactions: &[Transaction],
    opts: BalanceOptions,
) -> Result<Vec<CurrencyBalance>> {
    let mut buckets: BTreeMap<Currency, CurrencyBalance> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| opts.admits(tx)) {
        buckets
            .entry(tx.currency)
            .or_insert_with(|| CurrencyBalance::empty(tx.currency))
            .add(tx)?;
    }
    Ok(buckets.into_values().collect())
}

/// Net balance in one currency; zero when the currency never appears.
pub fn net_balance(
    transactions: &[Transaction],
    currency: Currency,
    opts: BalanceOptions,
) -> Result<Decimal> {
    transactions
        .iter()
        .filter(|tx| tx.currency == currency && opts.admits(tx))
        .map(Transaction::signed_amount)
        .try_fold(Decimal::ZERO, checked_add)
}

/// Most used currency over live, non-deposit transactions.
///
/// Ties go to the currency declared first; no transactions yields Turkish
/// lira with a zero count.
pub fn most_active_currency(transactions: &[Transaction]) -> CurrencyActivity {
    let opts = BalanceOptions::active();
    let mut counts = [0usize; Currency::ALL.len()];
    for tx in transactions.iter().filter(|tx| opts.admits(tx)) {
        counts[tx.currency as usize] += 1;
    }

    let mut best = CurrencyActivity {
        currency: Currency::TurkishLira,
        count: 0,
    };
    for (currency, count) in Currency::ALL.iter().zip(counts) {
        if count > best.count {
            best = CurrencyActivity {
                currency: *currency,
                count,
            };
        }
    }
    best
}

fn per_customer_currency(
    transactions: &[Transaction],
    opts: BalanceOptions,
) -> Result<BTreeMap<(i64, Currency), CurrencyBalance>> {
    let mut buckets: BTreeMap<(i64, Currency), CurrencyBalance> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| opts.admits(tx)) {
        buckets
            .entry((tx.customer_id, tx.currency))
            .or_insert_with(|| CurrencyBalance::empty(tx.currency))
            .add(tx)?;
    }
    Ok(buckets)
}

/// Customers that owe the business in at least one currency.
///
/// Deposits are left out; a customer in debt in two currencies counts once.
pub fn indebted_customer_count(transactions: &[Transaction]) -> Result<usize> {
    Ok(per_customer_currency(transactions, BalanceOptions::active())?
        .into_iter()
        .filter(|(_, balance)| balance.outgoing > balance.incoming)
        .map(|((customer_id, _), _)| customer_id)
        .collect::<HashSet<_>>()
        .len())
}

/// One summary per currency, in enumeration order, zeros included.
pub fn currency_summary(
    transactions: &[Transaction],
    opts: BalanceOptions,
) -> Result<Vec<CurrencySummary>> {
    let mut summaries: Vec<CurrencySummary> = Currency::ALL
        .iter()
        .map(|&currency| CurrencySummary {
            currency,
            owed_to_business: Decimal::ZERO,
            owed_to_customers: Decimal::ZERO,
        })
        .collect();

    for ((_, currency), balance) in per_customer_currency(transactions, opts)? {
        let summary = &mut summaries[currency as usize];
        if balance.net > Decimal::ZERO {
            summary.owed_to_business = checked_add(summary.owed_to_business, balance.net)?;
        } else if balance.net < Decimal::ZERO {
            summary.owed_to_customers = checked_add(summary.owed_to_customers, balance.net.abs())?;
        }
    }
    Ok(summaries)
}

/// Customers ranked by live transaction count, busiest first.
///
/// Equal counts are ordered by customer id. Customers without transactions
/// are not listed.
pub fn customer_activity(
    transactions: &[Transaction],
    customers: &[Customer],
    limit: usize,
) -> Vec<CustomerActivity> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for tx in transactions.iter().filter(|tx| !tx.is_deleted) {
        *counts.entry(tx.customer_id).or_default() += 1;
    }
    let names: HashMap<i64, &str> = customers
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    let mut ranked: Vec<CustomerActivity> = counts
        .into_iter()
        .map(|(customer_id, transaction_count)| CustomerActivity {
            customer_id,
            customer_name: names
                .get(&customer_id)
                .copied()
                .unwrap_or(UNKNOWN_CUSTOMER)
                .to_string(),
            transaction_count,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.transaction_count
            .cmp(&a.transaction_count)
            .then(a.customer_id.cmp(&b.customer_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Everything the dashboard shows in one read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub customer_count: usize,
    pub transaction_count: usize,
    pub indebted_customers: usize,
    pub most_active: CurrencyActivity,
    pub currencies: Vec<CurrencySummary>,
    pub top_customers: Vec<CustomerActivity>,
}

/// Balance queries that read through a store.
pub struct Ledger<'a, S: StorageEngine + ?Sized> {
    storage: &'a S,
}

impl<'a, S: StorageEngine + ?Sized> Ledger<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    fn customer_transactions(&self, customer_id: i64) -> Result<Vec<Transaction>> {
        self.storage
            .list_transactions(&TransactionFilter::new().customer(customer_id))
    }

    pub fn balances(&self, customer_id: i64, opts: BalanceOptions) -> Result<Vec<CurrencyBalance>> {
        customer_balances(&self.customer_transactions(customer_id)?, opts)
    }

    pub fn net_balance(
        &self,
        customer_id: i64,
        currency: Currency,
        opts: BalanceOptions,
    ) -> Result<Decimal> {
        let transactions = self
            .storage
            .list_transactions(&TransactionFilter::new().customer(customer_id).currency(currency))?;
        net_balance(&transactions, currency, opts)
    }

    /// Global aggregates over every live customer and transaction.
    pub fn summary(&self, opts: BalanceOptions, top: usize) -> Result<LedgerSummary> {
        let customers = self.storage.list_customers(&Default::default())?;
        let transactions = self.storage.list_transactions(&TransactionFilter::new())?;

        Ok(LedgerSummary {
            customer_count: customers.len(),
            transaction_count: transactions.len(),
            indebted_customers: indebted_customer_count(&transactions)?,
            most_active: most_active_currency(&transactions),
            currencies: currency_summary(&transactions, opts)?,
            top_customers: customer_activity(&transactions, &customers, top),
        })
    }

    /// A customer's transactions grouped by currency, for printing.
    pub fn statement(&self, customer_id: i64, opts: BalanceOptions) -> Result<CustomerStatement> {
        let customer = self
            .storage
            .get_customer(customer_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("Customer {}", customer_id)))?;
        let transactions = self.customer_transactions(customer_id)?;
        CustomerStatement::build(customer, &transactions, opts)
    }
}
