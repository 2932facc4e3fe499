//! Application context for the Veresiye CLI.
//!
//! Bundles CLI arguments with the lazily-loaded config and store so handlers
//! open the store at most once.

use std::path::PathBuf;

use anyhow::Context;
use once_cell::unsync::OnceCell;

use veresiye_core::{BackupConfig, SqliteStorage};

use crate::cli::Cli;
use crate::config::VeresiyeConfig;

use super::resolver::{load_config, resolve_store_path};

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<VeresiyeConfig>,
    storage: OnceCell<SqliteStorage>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
            storage: OnceCell::new(),
        }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Get the configuration, loading it lazily if needed.
    pub fn config(&self) -> anyhow::Result<&VeresiyeConfig> {
        self.config.get_or_try_init(load_config)
    }

    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        resolve_store_path(self.cli, self.config()?)
    }

    pub fn backup_config(&self) -> anyhow::Result<BackupConfig> {
        self.config()?.backup_config()
    }

    /// Open the store, creating and migrating it on first use.
    pub fn storage(&self) -> anyhow::Result<&SqliteStorage> {
        self.storage.get_or_try_init(|| {
            let path = self.store_path()?;
            let storage = SqliteStorage::open(&path)
                .with_context(|| format!("Failed to open store {}", path.display()))?;
            let report = storage.migration_report();
            if !report.is_noop() {
                tracing::info!(
                    from = report.from_version,
                    to = report.to_version,
                    steps = report.applied.len(),
                    "Store schema upgraded"
                );
            }
            Ok(storage)
        })
    }
}
