//! Core data types for the storage layer.
//!
//! Ids are SQLite row ids; `0` marks a record that has not been saved yet.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_PHONE_DIGITS: usize = 10;
pub const MAX_DESCRIPTION_CHARS: usize = 255;
pub const NATIONAL_ID_DIGITS: usize = 11;

/// Currencies and gold denominations a transaction can be recorded in.
///
/// Declaration order is significant: it is the persisted code, the order of
/// summaries, and the tie-break order for activity counts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    #[default]
    TurkishLira,
    Dollar,
    Euro,
    Sterling,
    Gold14K,
    Gold22K,
    Gold24K,
    QuarterGold,
    HalfGold,
    FullGold,
    Ziynet,
}

impl Currency {
    pub const ALL: [Currency; 11] = [
        Currency::TurkishLira,
        Currency::Dollar,
        Currency::Euro,
        Currency::Sterling,
        Currency::Gold14K,
        Currency::Gold22K,
        Currency::Gold24K,
        Currency::QuarterGold,
        Currency::HalfGold,
        Currency::FullGold,
        Currency::Ziynet,
    ];

    /// Integer code stored in the `transactions.currency` column.
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Result<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or_else(|| LedgerError::Validation(format!("Unknown currency code: {}", code)))
    }

    /// Short identifier used on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            Currency::TurkishLira => "try",
            Currency::Dollar => "usd",
            Currency::Euro => "eur",
            Currency::Sterling => "gbp",
            Currency::Gold14K => "gold14k",
            Currency::Gold22K => "gold22k",
            Currency::Gold24K => "gold24k",
            Currency::QuarterGold => "quarter",
            Currency::HalfGold => "half",
            Currency::FullGold => "full",
            Currency::Ziynet => "ziynet",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Currency::TurkishLira => "TL",
            Currency::Dollar => "Dolar",
            Currency::Euro => "Euro",
            Currency::Sterling => "Sterlin",
            Currency::Gold14K => "14 Ayar",
            Currency::Gold22K => "22 Ayar",
            Currency::Gold24K => "24 Ayar",
            Currency::QuarterGold => "Çeyrek Altın",
            Currency::HalfGold => "Yarım Altın",
            Currency::FullGold => "Tam Altın",
            Currency::Ziynet => "Ziynet Altın",
        }
    }

    /// Unit shown after an amount: a currency sign, grams, or pieces.
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::TurkishLira => "₺",
            Currency::Dollar => "$",
            Currency::Euro => "€",
            Currency::Sterling => "£",
            Currency::Gold14K | Currency::Gold22K | Currency::Gold24K => "gr",
            Currency::QuarterGold | Currency::HalfGold | Currency::FullGold | Currency::Ziynet => {
                "adet"
            }
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.slug() == wanted)
            .ok_or_else(|| LedgerError::Validation(format!("Unknown currency: {}", s)))
    }
}

/// Which party owes the other as a result of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The customer took goods or cash and owes the business.
    CustomerOwesStore,
    /// The business holds the customer's money or gold.
    StoreOwesCustomer,
}

impl Direction {
    pub fn code(self) -> i64 {
        match self {
            Direction::CustomerOwesStore => 0,
            Direction::StoreOwesCustomer => 1,
        }
    }

    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Direction::CustomerOwesStore),
            1 => Ok(Direction::StoreOwesCustomer),
            other => Err(LedgerError::Validation(format!(
                "Unknown transaction direction code: {}",
                other
            ))),
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Direction::CustomerOwesStore => "owes-store",
            Direction::StoreOwesCustomer => "owes-customer",
        }
    }
}

impl FromStr for Direction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owes-store" | "debt" => Ok(Direction::CustomerOwesStore),
            "owes-customer" | "credit" => Ok(Direction::StoreOwesCustomer),
            _ => Err(LedgerError::Validation(format!(
                "Unknown direction: {} (use owes-store or owes-customer)",
                s
            ))),
        }
    }
}

/// A customer of the business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub is_deleted: bool,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            phone: None,
            is_deleted: false,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Check field constraints and return a normalized copy.
    pub fn validated(&self) -> Result<Customer> {
        validate_id(self.id, "customer")?;
        let name = validate_name(&self.name, "Customer name")?;
        let phone = match self.phone.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                if !raw.chars().all(|c| c.is_ascii_digit()) {
                    return Err(LedgerError::Validation(format!(
                        "Phone number must contain digits only: {}",
                        raw
                    )));
                }
                if raw.len() > MAX_PHONE_DIGITS {
                    return Err(LedgerError::Validation(format!(
                        "Phone number too long (max {} digits)",
                        MAX_PHONE_DIGITS
                    )));
                }
                Some(raw.to_string())
            }
        };
        Ok(Customer {
            id: self.id,
            name,
            phone,
            is_deleted: self.is_deleted,
        })
    }
}

/// One debt or credit movement between the business and a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub customer_id: i64,
    pub amount: Decimal,
    pub direction: Direction,
    pub currency: Currency,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub is_deleted: bool,
    /// Held in trust; excluded from active-debt aggregates.
    pub is_deposit: bool,
    /// Only listed when hidden entries are requested.
    pub is_hidden: bool,
}

impl Transaction {
    pub fn new(
        customer_id: i64,
        amount: Decimal,
        direction: Direction,
        currency: Currency,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            customer_id,
            amount,
            direction,
            currency,
            date,
            description: None,
            is_deleted: false,
            is_deposit: false,
            is_hidden: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn deposit(mut self) -> Self {
        self.is_deposit = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    /// Amount with its sign relative to the customer: positive when the
    /// customer owes.
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::CustomerOwesStore => self.amount,
            Direction::StoreOwesCustomer => -self.amount,
        }
    }

    pub fn validated(&self) -> Result<Transaction> {
        validate_id(self.id, "transaction")?;
        if self.customer_id <= 0 {
            return Err(LedgerError::Validation(format!(
                "Invalid customer id: {}",
                self.customer_id
            )));
        }
        validate_amount(self.amount)?;
        let description = match self.description.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => {
                if text.chars().count() > MAX_DESCRIPTION_CHARS {
                    return Err(LedgerError::Validation(format!(
                        "Description too long (max {} characters)",
                        MAX_DESCRIPTION_CHARS
                    )));
                }
                Some(text.to_string())
            }
        };
        Ok(Transaction {
            description,
            ..self.clone()
        })
    }
}

/// A pending walk-in record that has not been posted to a customer yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickEntry {
    pub id: i64,
    pub full_name: String,
    pub national_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub amount: Decimal,
    pub is_processed: bool,
    pub is_deleted: bool,
}

impl QuickEntry {
    pub fn new(full_name: impl Into<String>, amount: Decimal, created_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            full_name: full_name.into(),
            national_id: None,
            created_at,
            amount,
            is_processed: false,
            is_deleted: false,
        }
    }

    pub fn with_national_id(mut self, national_id: impl Into<String>) -> Self {
        self.national_id = Some(national_id.into());
        self
    }

    pub fn validated(&self) -> Result<QuickEntry> {
        validate_id(self.id, "quick entry")?;
        let full_name = validate_name(&self.full_name, "Full name")?;
        validate_amount(self.amount)?;
        let national_id = match self.national_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                if raw.len() != NATIONAL_ID_DIGITS || !raw.chars().all(|c| c.is_ascii_digit()) {
                    return Err(LedgerError::Validation(format!(
                        "National id must be exactly {} digits",
                        NATIONAL_ID_DIGITS
                    )));
                }
                Some(raw.to_string())
            }
        };
        Ok(QuickEntry {
            full_name,
            national_id,
            ..self.clone()
        })
    }
}

/// Business-wide settings. Exactly one row exists once saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub business_name: String,
    pub cloud_client_id: String,
    pub cloud_client_secret: String,
    pub setup_completed: bool,
}

/// Filter for listing customers.
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    /// Include soft-deleted rows (backup, restore, audits)
    pub include_deleted: bool,
}

impl CustomerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}

/// Filter for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub customer_id: Option<i64>,
    pub currency: Option<Currency>,
    pub include_deleted: bool,
}

impl TransactionFilter {
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

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}

fn validate_id(id: i64, kind: &str) -> Result<()> {
    if id < 0 {
        return Err(LedgerError::Validation(format!("Invalid {} id: {}", kind, id)));
    }
    Ok(())
}

fn validate_name(raw: &str, label: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(LedgerError::Validation(format!("{} is required", label)));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(LedgerError::Validation(format!(
            "{} too long (max {} characters)",
            label, MAX_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "Amount must be greater than zero: {}",
            amount
        )));
    }
    Ok(())
}
