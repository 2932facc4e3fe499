//! Helper functions for the Veresiye CLI.

mod parsing;

pub use parsing::{parse_amount, parse_datetime, parse_enum, parse_quote};
