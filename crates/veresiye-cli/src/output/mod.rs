//! Output formatting helpers for the CLI.
//!
//! JSON goes through serde; tables are built from the row helpers in
//! `text`.

mod json;
mod text;

pub use json::{print_json, transactions_json};
pub use text::{
    balance_rows, customer_name, customer_name_map, customer_rows, direction_label, short_date,
    transaction_rows,
};
