//! Parsing helpers for amounts, dates and price quotes.

use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::errors::CliError;

/// Parse an amount the way amounts are printed: `,` separates decimals and
/// `.` groups thousands, so `1.234,5` is 1234.5.
///
/// A single `.` without a comma is a decimal point (`1250.75`), except when
/// exactly three digits follow it: `1.234` could be either and is rejected.
pub fn parse_amount(value: &str) -> anyhow::Result<Decimal> {
    let normalized = normalize_amount(value.trim())?;
    let amount = Decimal::from_str(&normalized)
        .map_err(|_| CliError::invalid_input(format!("Invalid amount: {}", value)))?;
    if amount <= Decimal::ZERO {
        return Err(CliError::invalid_input(format!("Amount must be positive: {}", value)).into());
    }
    Ok(amount)
}

fn normalize_amount(text: &str) -> anyhow::Result<String> {
    let invalid = || CliError::invalid_input(format!("Invalid amount: {}", text));
    let (int_part, frac) = match text.split_once(',') {
        Some((_, frac)) if frac.contains([',', '.']) => return Err(invalid().into()),
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (text, None),
    };

    let groups: Vec<&str> = int_part.split('.').collect();
    let digits = match (groups.as_slice(), frac) {
        ([whole], _) => whole.to_string(),
        ([_, tail], None) if tail.len() == 3 => {
            return Err(CliError::invalid_input(format!(
                "Ambiguous amount: {} (write {} or {},{})",
                text,
                groups.concat(),
                groups[0],
                tail
            ))
            .into())
        }
        ([_, _], None) => return Ok(text.to_string()),
        ([head, rest @ ..], _) => {
            if head.is_empty() || head.len() > 3 || rest.iter().any(|g| g.len() != 3) {
                return Err(invalid().into());
            }
            groups.concat()
        }
        ([], _) => return Err(invalid().into()),
    };

    Ok(match frac {
        Some(frac) => format!("{}.{}", digits, frac),
        None => digits,
    })
}

/// Parse a datetime string (ISO-8601 or YYYY-MM-DD in local time).
pub fn parse_datetime(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| CliError::invalid_input(format!("Invalid date value: {}", value)))?;
        let local = Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| CliError::invalid_input(format!("Invalid local date: {}", value)))?;
        return Ok(local.with_timezone(&Utc));
    }

    Err(CliError::invalid_input(format!(
        "Invalid date/time (expected ISO-8601 or YYYY-MM-DD): {}",
        value
    ))
    .into())
}

/// Parse a flag value through the core `FromStr` impls, reporting bad input as such.
pub fn parse_enum<T>(value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    T::from_str(value).map_err(|e| CliError::invalid_input(e.to_string()).into())
}

/// Parse `LABEL=BUY/SELL` into its parts.
pub fn parse_quote(value: &str) -> anyhow::Result<(String, Decimal, Decimal)> {
    let invalid = || CliError::invalid_input(format!("Invalid quote (expected LABEL=BUY/SELL): {}", value));
    let (label, prices) = value.split_once('=').ok_or_else(invalid)?;
    let (buy, sell) = prices.split_once('/').ok_or_else(invalid)?;
    if label.trim().is_empty() {
        return Err(invalid().into());
    }
    Ok((label.trim().to_string(), parse_amount(buy)?, parse_amount(sell)?))
}
