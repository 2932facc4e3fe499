//! Output mode routing.
//!
//! Every read command ends up in one of three shapes: JSON for scripts,
//! tab-separated plain text for pipes, or bordered tables for a person at a
//! terminal. Receipts after writes follow the same routing without flags.

use std::io::IsTerminal;

use clap::ValueEnum;

/// Value of `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Bordered tables, even when piped
    Table,
    /// Tab-separated rows and `key=value` receipts
    Plain,
    /// Same as `--json`
    Json,
}

/// What the process knows about where stdout goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminal {
    pub is_tty: bool,
    pub dumb: bool,
}

impl Terminal {
    pub fn detect() -> Self {
        Self {
            is_tty: std::io::stdout().is_terminal(),
            dumb: std::env::var("TERM").is_ok_and(|v| v == "dumb"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    Json,
    #[default]
    Plain,
    Pretty,
}

impl OutputMode {
    /// `--json` and `--format json` win outright. An explicit table or plain
    /// format comes next, then a dumb terminal, then whether stdout is a TTY.
    pub fn resolve(json_flag: bool, format: Option<OutputFormat>, terminal: Terminal) -> Self {
        match (json_flag, format) {
            (true, _) | (_, Some(OutputFormat::Json)) => Self::Json,
            (_, Some(OutputFormat::Plain)) => Self::Plain,
            (_, Some(OutputFormat::Table)) => Self::Pretty,
            (false, None) if terminal.dumb || !terminal.is_tty => Self::Plain,
            (false, None) => Self::Pretty,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    pub fn is_pretty(&self) -> bool {
        matches!(self, Self::Pretty)
    }
}
