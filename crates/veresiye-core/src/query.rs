//! Filtering, sorting and pagination over live records.
//!
//! Queries load the live rows from the store, then filter, sort and slice in
//! memory, in that order. Count functions share the list predicate, so a
//! count always equals the length of the unpaginated list.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;

use crate::collation;
use crate::error::{LedgerError, Result};
use crate::storage::traits::StorageEngine;
use crate::storage::types::{
    Currency, Customer, CustomerFilter, Direction, Transaction, TransactionFilter,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(LedgerError::Validation(format!(
                "Unknown sort direction: {} (use asc or desc)",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CustomerSortField {
    #[default]
    Name,
    Phone,
}

impl FromStr for CustomerSortField {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(CustomerSortField::Name),
            "phone" => Ok(CustomerSortField::Phone),
            _ => Err(LedgerError::Validation(format!(
                "Unknown customer sort field: {}",
                s
            ))),
        }
    }
}

/// Customer list parameters. The default lists everyone by name, ascending.
#[derive(Debug, Clone, Default)]
pub struct CustomerQuery {
    /// Folded substring matched against name and phone
    pub search: Option<String>,
    pub sort: CustomerSortField,
    pub direction: SortDirection,
}

impl CustomerQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort_by(mut self, field: CustomerSortField, direction: SortDirection) -> Self {
        self.sort = field;
        self.direction = direction;
        self
    }

    pub fn matches(&self, customer: &Customer) -> bool {
        let term = match self.search.as_deref().map(str::trim) {
            None | Some("") => return true,
            Some(term) => term,
        };
        collation::contains(&customer.name, term)
            || customer
                .phone
                .as_deref()
                .is_some_and(|phone| collation::contains(phone, term))
    }
}

/// Transaction sort keys accepted by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionSortField {
    Date,
    Amount,
    Direction,
    Currency,
}

impl TransactionSortField {
    /// Case-insensitive lookup; `None` for names that are not sort keys.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "date" => Some(TransactionSortField::Date),
            "amount" => Some(TransactionSortField::Amount),
            "direction" => Some(TransactionSortField::Direction),
            "currency" => Some(TransactionSortField::Currency),
            _ => None,
        }
    }

    fn compare(self, a: &Transaction, b: &Transaction) -> Ordering {
        match self {
            TransactionSortField::Date => a.date.cmp(&b.date),
            TransactionSortField::Amount => a.amount.cmp(&b.amount),
            TransactionSortField::Direction => a.direction.cmp(&b.direction),
            TransactionSortField::Currency => a.currency.cmp(&b.currency),
        }
    }
}

/// How deposit-flagged transactions are treated by a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DepositFilter {
    #[default]
    Include,
    Exclude,
    Only,
}

impl FromStr for DepositFilter {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "include" => Ok(DepositFilter::Include),
            "exclude" => Ok(DepositFilter::Exclude),
            "only" => Ok(DepositFilter::Only),
            _ => Err(LedgerError::Validation(format!(
                "Unknown deposit filter: {} (use include, exclude or only)",
                s
            ))),
        }
    }
}

/// Transaction list parameters.
///
/// Hidden transactions are left out unless `include_hidden` is set. Without a
/// recognized sort field the list is newest first.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub customer_id: Option<i64>,
    pub currency: Option<Currency>,
    pub direction: Option<Direction>,
    pub include_hidden: bool,
    pub deposits: DepositFilter,
    /// Folded substring matched against the description
    pub search: Option<String>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<SortDirection>,
}

impl TransactionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn include_hidden(mut self) -> Self {
        self.include_hidden = true;
        self
    }

    pub fn deposits(mut self, deposits: DepositFilter) -> Self {
        self.deposits = deposits;
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: Option<SortDirection>) -> Self {
        self.sort_field = Some(field.into());
        self.sort_direction = direction;
        self
    }

    /// The sort actually applied.
    pub fn resolved_sort(&self) -> (TransactionSortField, SortDirection) {
        match self.sort_field.as_deref().and_then(TransactionSortField::parse) {
            Some(field) => (field, self.sort_direction.unwrap_or_default()),
            None => (TransactionSortField::Date, SortDirection::Descending),
        }
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if tx.is_deleted {
            return false;
        }
        if self.customer_id.is_some_and(|id| id != tx.customer_id) {
            return false;
        }
        if self.currency.is_some_and(|c| c != tx.currency) {
            return false;
        }
        if self.direction.is_some_and(|d| d != tx.direction) {
            return false;
        }
        if tx.is_hidden && !self.include_hidden {
            return false;
        }
        let deposit_ok = match self.deposits {
            DepositFilter::Include => true,
            DepositFilter::Exclude => !tx.is_deposit,
            DepositFilter::Only => tx.is_deposit,
        };
        if !deposit_ok {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => tx
                .description
                .as_deref()
                .is_some_and(|d| collation::contains(d, term)),
        }
    }
}

/// One slice of a sorted list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Length of the unpaginated list
    pub total: usize,
    /// Zero-based page index
    pub page: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    /// Slice `page` out of an already filtered and sorted list.
    pub fn slice(all: Vec<T>, page: usize, page_size: usize) -> Self {
        let total = all.len();
        let skip = page.saturating_mul(page_size);
        let items = all.into_iter().skip(skip).take(page_size).collect();
        Self {
            items,
            total,
            page,
            page_size,
        }
    }

    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.page_count()
    }
}

/// Sort customers in place; equal keys fall back to id ascending.
pub fn sort_customers(customers: &mut [Customer], field: CustomerSortField, direction: SortDirection) {
    match field {
        CustomerSortField::Name => {
            let mut keyed: Vec<(Vec<(u8, u32)>, Customer)> = customers
                .iter()
                .map(|c| (collation::sort_key(&c.name), c.clone()))
                .collect();
            keyed.sort_by(|(ka, a), (kb, b)| direction.apply(ka.cmp(kb)).then(a.id.cmp(&b.id)));
            for (slot, (_, customer)) in customers.iter_mut().zip(keyed) {
                *slot = customer;
            }
        }
        CustomerSortField::Phone => {
            customers.sort_by(|a, b| direction.apply(a.phone.cmp(&b.phone)).then(a.id.cmp(&b.id)));
        }
    }
}

/// Sort transactions in place. The sort is stable.
pub fn sort_transactions(
    transactions: &mut [Transaction],
    field: TransactionSortField,
    direction: SortDirection,
) {
    transactions.sort_by(|a, b| direction.apply(field.compare(a, b)));
}

/// Paginated, locale-aware reads through a store.
pub struct QueryEngine<'a, S: StorageEngine + ?Sized> {
    storage: &'a S,
}

impl<'a, S: StorageEngine + ?Sized> QueryEngine<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Every matching customer, sorted.
    pub fn customers(&self, query: &CustomerQuery) -> Result<Vec<Customer>> {
        let mut customers: Vec<Customer> = self
            .storage
            .list_customers(&CustomerFilter::new())?
            .into_iter()
            .filter(|c| query.matches(c))
            .collect();
        sort_customers(&mut customers, query.sort, query.direction);
        Ok(customers)
    }

    pub fn customer_page(
        &self,
        query: &CustomerQuery,
        page: usize,
        page_size: usize,
    ) -> Result<Page<Customer>> {
        Ok(Page::slice(self.customers(query)?, page, page_size))
    }

    pub fn customer_count(&self, query: &CustomerQuery) -> Result<usize> {
        Ok(self
            .storage
            .list_customers(&CustomerFilter::new())?
            .iter()
            .filter(|c| query.matches(c))
            .count())
    }

    fn candidate_transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        let mut filter = TransactionFilter::new();
        filter.customer_id = query.customer_id;
        filter.currency = query.currency;
        self.storage.list_transactions(&filter)
    }

    /// Every matching transaction, sorted.
    pub fn transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self
            .candidate_transactions(query)?
            .into_iter()
            .filter(|tx| query.matches(tx))
            .collect();
        let (field, direction) = query.resolved_sort();
        sort_transactions(&mut transactions, field, direction);
        Ok(transactions)
    }

    pub fn transaction_page(
        &self,
        query: &TransactionQuery,
        page: usize,
        page_size: usize,
    ) -> Result<Page<Transaction>> {
        Ok(Page::slice(self.transactions(query)?, page, page_size))
    }

    pub fn transaction_count(&self, query: &TransactionQuery) -> Result<usize> {
        Ok(self
            .candidate_transactions(query)?
            .iter()
            .filter(|tx| query.matches(tx))
            .count())
    }

    fn neighbor(&self, id: i64, step: isize) -> Result<Option<i64>> {
        let ordered = self.customers(&CustomerQuery::new())?;
        let Some(position) = ordered.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        Ok(position
            .checked_add_signed(step)
            .and_then(|idx| ordered.get(idx))
            .map(|c| c.id))
    }

    /// The customer before `id` in name order, if any.
    pub fn previous_customer_id(&self, id: i64) -> Result<Option<i64>> {
        self.neighbor(id, -1)
    }

    /// The customer after `id` in name order, if any.
    pub fn next_customer_id(&self, id: i64) -> Result<Option<i64>> {
        self.neighbor(id, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn seeded() -> SqliteStorage {
        let storage = SqliteStorage::open_in_memory().unwrap();
        for (name, phone) in [
            ("Zeynep", Some("5550000003")),
            ("Çiğdem", None),
            ("Can", Some("5550000001")),
            ("Irmak", Some("5550000002")),
            ("İlker", None),
        ] {
            let mut customer = Customer::new(name);
            customer.phone = phone.map(str::to_string);
            storage.save_customer(&customer).unwrap();
        }
        storage
    }

    fn names(customers: &[Customer]) -> Vec<&str> {
        customers.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_customers_sorted_in_turkish_order_by_default() {
        let storage = seeded();
        let engine = QueryEngine::new(&storage);
        let all = engine.customers(&CustomerQuery::new()).unwrap();
        assert_eq!(names(&all), vec!["Can", "Çiğdem", "Irmak", "İlker", "Zeynep"]);

        let desc = engine
            .customers(&CustomerQuery::new().sort_by(CustomerSortField::Name, SortDirection::Descending))
            .unwrap();
        assert_eq!(names(&desc), vec!["Zeynep", "İlker", "Irmak", "Çiğdem", "Can"]);
    }

    #[test]
    fn test_customer_search_uses_turkish_fold() {
        let storage = seeded();
        let engine = QueryEngine::new(&storage);

        let hits = engine.customers(&CustomerQuery::new().search("iLK")).unwrap();
        assert_eq!(names(&hits), vec!["İlker"]);

        let by_phone = engine.customers(&CustomerQuery::new().search("0002")).unwrap();
        assert_eq!(names(&by_phone), vec!["Irmak"]);
        assert_eq!(engine.customer_count(&CustomerQuery::new().search("0002")).unwrap(), 1);
    }

    #[test]
    fn test_pagination_matches_full_list() {
        let storage = seeded();
        let engine = QueryEngine::new(&storage);
        let query = CustomerQuery::new();
        let full = engine.customers(&query).unwrap();
        assert_eq!(engine.customer_count(&query).unwrap(), full.len());

        for page in 0..3 {
            let slice = engine.customer_page(&query, page, 2).unwrap();
            let start = (page * 2).min(full.len());
            let end = (page * 2 + 2).min(full.len());
            assert_eq!(slice.items, full[start..end].to_vec());
            assert_eq!(slice.total, full.len());
        }
        let past_end = engine.customer_page(&query, 10, 2).unwrap();
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.page_count(), 3);
    }

    #[test]
    fn test_neighbor_navigation() {
        let storage = seeded();
        let engine = QueryEngine::new(&storage);
        let ordered = engine.customers(&CustomerQuery::new()).unwrap();
        let first = ordered[0].id;
        let second = ordered[1].id;
        let last = ordered[ordered.len() - 1].id;

        assert_eq!(engine.previous_customer_id(first).unwrap(), None);
        assert_eq!(engine.next_customer_id(first).unwrap(), Some(second));
        assert_eq!(engine.previous_customer_id(second).unwrap(), Some(first));
        assert_eq!(engine.next_customer_id(last).unwrap(), None);
        assert_eq!(engine.next_customer_id(9999).unwrap(), None);
    }

    #[test]
    fn test_transaction_sort_field_resolution() {
        assert_eq!(
            TransactionQuery::new().resolved_sort(),
            (TransactionSortField::Date, SortDirection::Descending)
        );
        assert_eq!(
            TransactionQuery::new().sort_by("AMOUNT", None).resolved_sort(),
            (TransactionSortField::Amount, SortDirection::Ascending)
        );
        assert_eq!(
            TransactionQuery::new()
                .sort_by("weight", Some(SortDirection::Ascending))
                .resolved_sort(),
            (TransactionSortField::Date, SortDirection::Descending)
        );
    }

    #[test]
    fn test_transaction_filters() {
        let storage = seeded();
        let cid = storage.list_customers(&CustomerFilter::new()).unwrap()[0].id;
        let at = |day| Utc.with_ymd_and_hms(2024, 2, day, 12, 0, 0).unwrap();

        let plain = Transaction::new(cid, dec!(30), Direction::CustomerOwesStore, Currency::TurkishLira, at(1))
            .with_description("Bilezik");
        let hidden = Transaction::new(cid, dec!(10), Direction::StoreOwesCustomer, Currency::TurkishLira, at(2))
            .hidden();
        let deposit = Transaction::new(cid, dec!(5), Direction::StoreOwesCustomer, Currency::Gold22K, at(3))
            .deposit()
            .with_description("Emanet İNCİ küpe");
        for tx in [&plain, &hidden, &deposit] {
            storage.save_transaction(tx).unwrap();
        }

        let engine = QueryEngine::new(&storage);
        let base = TransactionQuery::new().customer(cid);
        assert_eq!(engine.transaction_count(&base).unwrap(), 2);
        assert_eq!(engine.transaction_count(&base.clone().include_hidden()).unwrap(), 3);
        assert_eq!(
            engine
                .transaction_count(&base.clone().deposits(DepositFilter::Exclude))
                .unwrap(),
            1
        );

        let found = engine.transactions(&base.clone().search("inci")).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].is_deposit);

        let by_amount = engine
            .transactions(&base.clone().include_hidden().sort_by("amount", Some(SortDirection::Descending)))
            .unwrap();
        let amounts: Vec<_> = by_amount.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![dec!(30), dec!(10), dec!(5)]);

        let newest_first = engine.transactions(&base.clone().include_hidden()).unwrap();
        assert_eq!(newest_first[0].currency, Currency::Gold22K);

        let owes = engine
            .transactions(&base.direction(Direction::CustomerOwesStore))
            .unwrap();
        assert_eq!(owes.len(), 1);
    }

    fn assert_transaction_pages(engine: &QueryEngine<'_, SqliteStorage>, query: &TransactionQuery, size: usize) {
        let full = engine.transactions(query).unwrap();
        assert_eq!(engine.transaction_count(query).unwrap(), full.len());
        for page in 0..=full.len().div_ceil(size) + 1 {
            let slice = engine.transaction_page(query, page, size).unwrap();
            let start = (page * size).min(full.len());
            let end = (page * size + size).min(full.len());
            assert_eq!(slice.items, full[start..end].to_vec(), "page {}", page);
            assert_eq!(slice.total, full.len());
        }
    }

    #[test]
    fn test_filtered_transaction_pages_match_full_list() {
        let storage = seeded();
        let ids: Vec<i64> = storage
            .list_customers(&CustomerFilter::new())
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        let currencies = [Currency::TurkishLira, Currency::Gold22K, Currency::Dollar];
        for n in 0..17u32 {
            let mut tx = Transaction::new(
                ids[n as usize % ids.len()],
                Decimal::from(n + 1),
                if n % 2 == 0 {
                    Direction::CustomerOwesStore
                } else {
                    Direction::StoreOwesCustomer
                },
                currencies[n as usize % currencies.len()],
                Utc.with_ymd_and_hms(2024, 3, n + 1, 8, 0, 0).unwrap(),
            );
            if n % 3 == 0 {
                tx = tx.deposit().with_description("Emanet bilezik");
            }
            if n % 4 == 0 {
                tx = tx.hidden();
            }
            storage.save_transaction(&tx).unwrap();
        }

        let engine = QueryEngine::new(&storage);
        let queries = [
            TransactionQuery::new(),
            TransactionQuery::new().include_hidden(),
            TransactionQuery::new().include_hidden().deposits(DepositFilter::Only),
            TransactionQuery::new().deposits(DepositFilter::Exclude),
            TransactionQuery::new().currency(Currency::Gold22K).include_hidden(),
            TransactionQuery::new().search("EMANET").sort_by("amount", Some(SortDirection::Ascending)),
            TransactionQuery::new().customer(ids[1]).direction(Direction::StoreOwesCustomer),
        ];
        for query in &queries {
            for size in [1, 3, 5] {
                assert_transaction_pages(&engine, query, size);
            }
        }
        assert_eq!(engine.transaction_count(&queries[1]).unwrap(), 17);
        assert!(engine
            .transaction_page(&queries[2], 50, 5)
            .unwrap()
            .items
            .is_empty());
    }

    #[test]
    fn test_searched_customer_pages_match_full_list() {
        let storage = seeded();
        for name in ["Ilgaz", "Işıl", "İpek", "Ilık", "Aslı"] {
            storage.save_customer(&Customer::new(name)).unwrap();
        }
        let engine = QueryEngine::new(&storage);
        let query = CustomerQuery::new()
            .search("ı")
            .sort_by(CustomerSortField::Name, SortDirection::Descending);
        let full = engine.customers(&query).unwrap();
        assert_eq!(engine.customer_count(&query).unwrap(), full.len());
        assert!(full.len() >= 4);

        for size in [1, 2, 3] {
            for page in 0..=full.len().div_ceil(size) + 1 {
                let slice = engine.customer_page(&query, page, size).unwrap();
                let start = (page * size).min(full.len());
                let end = (page * size + size).min(full.len());
                assert_eq!(slice.items, full[start..end].to_vec());
                assert_eq!(slice.total, full.len());
            }
        }
    }
}
