//! Application-level utilities for the Veresiye CLI.
//!
//! This module provides:
//! - Path resolution for config, store and backup files
//! - A lazily-opened application context shared by command handlers

mod context;
mod resolver;

// Re-export public API
pub use context::AppContext;
pub use resolver::resolve_config_path;
