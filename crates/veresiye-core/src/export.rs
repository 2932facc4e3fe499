//! Data handed to printing and image-composition front ends.
//!
//! Layout lives elsewhere; this module only groups, orders and formats.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::collation;
use crate::error::Result;
use crate::ledger::{net_balance, BalanceOptions};
use crate::storage::types::{Currency, Customer, Transaction};

/// One currency section of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyGroup {
    pub currency: Currency,
    /// Newest first
    pub transactions: Vec<Transaction>,
    pub balance: Decimal,
}

/// A customer's account, grouped by currency in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerStatement {
    pub customer: Customer,
    pub groups: Vec<CurrencyGroup>,
}

impl CustomerStatement {
    pub fn build(customer: Customer, transactions: &[Transaction], opts: BalanceOptions) -> Result<Self> {
        let mut by_currency: BTreeMap<Currency, Vec<Transaction>> = BTreeMap::new();
        for tx in transactions
            .iter()
            .filter(|tx| tx.customer_id == customer.id && opts.admits(tx))
        {
            by_currency.entry(tx.currency).or_default().push(tx.clone());
        }

        let groups = by_currency
            .into_iter()
            .map(|(currency, mut transactions)| {
                transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
                let balance = net_balance(&transactions, currency, opts)?;
                Ok(CurrencyGroup {
                    currency,
                    transactions,
                    balance,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { customer, groups })
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Order in which rows appear on the shared price sheet.
pub const PRICE_SHEET_ORDER: [&str; 8] = [
    "24 Ayar", "22 Ayar", "14 Ayar", "Beşli", "Ata", "Yarım", "Çeyrek", "Gram",
];

/// A buy/sell quote for one gold product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub label: String,
    /// Ledger currency the product maps to, when there is one
    pub currency: Option<Currency>,
    pub buy: Decimal,
    pub sell: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new(label: impl Into<String>, buy: Decimal, sell: Decimal, updated_at: DateTime<Utc>) -> Self {
        let label = label.into();
        let currency = currency_for_label(&label);
        Self {
            label,
            currency,
            buy,
            sell,
            updated_at,
        }
    }
}

fn currency_for_label(label: &str) -> Option<Currency> {
    match collation::fold(label.trim()).as_str() {
        "24 ayar" => Some(Currency::Gold24K),
        "22 ayar" => Some(Currency::Gold22K),
        "14 ayar" => Some(Currency::Gold14K),
        "çeyrek" => Some(Currency::QuarterGold),
        "yarım" => Some(Currency::HalfGold),
        "tam" | "ata" => Some(Currency::FullGold),
        _ => None,
    }
}

/// Quotes in sheet order. Labels not on the sheet are dropped.
pub fn price_sheet(quotes: &[PriceQuote]) -> Vec<PriceQuote> {
    PRICE_SHEET_ORDER
        .iter()
        .filter_map(|wanted| quotes.iter().find(|q| collation::eq(q.label.trim(), wanted)))
        .cloned()
        .collect()
}

/// Format an amount with Turkish separators.
///
/// Whole values get no decimals, others get two: `1234.5` → `1.234,50`.
pub fn format_amount(amount: Decimal) -> String {
    let whole = amount.fract().is_zero();
    let mut value = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(if whole { 0 } else { 2 });

    let text = value.to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let mut out = String::new();
    if amount.is_sign_negative() && !amount.is_zero() {
        out.push('-');
    }
    let digits: Vec<char> = int_part.chars().collect();
    for (idx, digit) in digits.iter().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('.');
        }
        out.push(*digit);
    }
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

/// Amount followed by the currency's unit, e.g. `1.500 ₺` or `2,50 gr`.
pub fn format_with_unit(amount: Decimal, currency: Currency) -> String {
    format!("{} {}", format_amount(amount), currency.symbol())
}

/// `(555) 123 45 67` for ten-digit numbers; anything else comes back unchanged.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 10 {
        return phone.to_string();
    }
    format!(
        "({}) {} {} {}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..8],
        &digits[8..10]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::Direction;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(0)), "0");
        assert_eq!(format_amount(dec!(1500)), "1.500");
        assert_eq!(format_amount(dec!(1500.00)), "1.500");
        assert_eq!(format_amount(dec!(1234.5)), "1.234,50");
        assert_eq!(format_amount(dec!(1234567.891)), "1.234.567,89");
        assert_eq!(format_amount(dec!(999)), "999");
        assert_eq!(format_amount(dec!(-2500.75)), "-2.500,75");
        assert_eq!(format_amount(dec!(0.125)), "0,13");
    }

    #[test]
    fn test_format_with_unit() {
        assert_eq!(format_with_unit(dec!(2.5), Currency::Gold22K), "2,50 gr");
        assert_eq!(format_with_unit(dec!(3), Currency::QuarterGold), "3 adet");
        assert_eq!(format_with_unit(dec!(10000), Currency::TurkishLira), "10.000 ₺");
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("5551234567"), "(555) 123 45 67");
        assert_eq!(format_phone("555 123 4567"), "(555) 123 45 67");
        assert_eq!(format_phone("12345"), "12345");
        assert_eq!(format_phone(""), "");
    }

    #[test]
    fn test_statement_groups_in_currency_order() {
        let customer = Customer {
            id: 4,
            ..Customer::new("Hatice")
        };
        let at = |day| Utc.with_ymd_and_hms(2024, 6, day, 10, 0, 0).unwrap();
        let txs = vec![
            Transaction::new(4, dec!(2), Direction::CustomerOwesStore, Currency::QuarterGold, at(1)),
            Transaction::new(4, dec!(500), Direction::CustomerOwesStore, Currency::TurkishLira, at(2)),
            Transaction::new(4, dec!(200), Direction::StoreOwesCustomer, Currency::TurkishLira, at(3)),
            Transaction::new(4, dec!(1), Direction::StoreOwesCustomer, Currency::QuarterGold, at(4)).deposit(),
            Transaction::new(5, dec!(70), Direction::CustomerOwesStore, Currency::Euro, at(5)),
        ];

        let statement = CustomerStatement::build(customer.clone(), &txs, BalanceOptions::all()).unwrap();
        let currencies: Vec<Currency> = statement.groups.iter().map(|g| g.currency).collect();
        assert_eq!(currencies, vec![Currency::TurkishLira, Currency::QuarterGold]);
        assert_eq!(statement.groups[0].balance, dec!(300));
        assert_eq!(statement.groups[0].transactions[0].date, at(3));
        assert_eq!(statement.groups[1].balance, dec!(1));

        let active = CustomerStatement::build(customer, &txs, BalanceOptions::active()).unwrap();
        assert_eq!(active.groups[1].balance, dec!(2));
    }

    #[test]
    fn test_price_sheet_order_and_mapping() {
        let now = Utc::now();
        let quotes = vec![
            PriceQuote::new("Çeyrek", dec!(4100), dec!(4250), now),
            PriceQuote::new("Has Altın", dec!(2900), dec!(2950), now),
            PriceQuote::new("24 ayar", dec!(2880), dec!(2940), now),
        ];
        let sheet = price_sheet(&quotes);
        let labels: Vec<&str> = sheet.iter().map(|q| q.label.as_str()).collect();
        assert_eq!(labels, vec!["24 ayar", "Çeyrek"]);
        assert_eq!(sheet[0].currency, Some(Currency::Gold24K));
        assert_eq!(sheet[1].currency, Some(Currency::QuarterGold));
        assert_eq!(quotes[1].currency, None);
    }
}
