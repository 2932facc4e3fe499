//! UI primitives for the Veresiye CLI.
//!
//! This module provides:
//! - **Context**: Environment detection (TTY, width, color, unicode)
//! - **Mode**: Output mode resolution (json, plain, pretty)
//! - **Theme**: Badge tokens and the color palette
//! - **Render**: Tables, headers, receipts, hints

mod context;
mod mode;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use mode::OutputFormat;
pub use theme::Badge;

pub use render::{badge, blank_line, divider, header, hint, kv, receipt, table, Column};
