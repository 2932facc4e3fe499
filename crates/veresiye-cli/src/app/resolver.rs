//! Path resolution for config and store files.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::{default_config_path, default_store_path, read_config, VeresiyeConfig};

/// Resolve the config file path, checking VERESIYE_CONFIG env var first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("VERESIYE_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Read the config file, or fall back to defaults when there is none.
pub fn load_config() -> anyhow::Result<VeresiyeConfig> {
    let path = resolve_config_path()?;
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(VeresiyeConfig::default());
    }
    read_config(&path)
}

/// Resolve the store path: `--store`, then the config file, then the data directory.
pub fn resolve_store_path(cli: &Cli, config: &VeresiyeConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.store.as_deref() {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    if let Some(path) = config.store.path.as_deref() {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    default_store_path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreSection;
    use clap::Parser;

    #[test]
    fn test_flag_wins_over_config() {
        let cli = Cli::try_parse_from(["veresiye", "--store", "/tmp/flag.db", "migrate"]).unwrap();
        let config = VeresiyeConfig {
            store: StoreSection {
                path: Some("/tmp/config.db".to_string()),
            },
            ..VeresiyeConfig::default()
        };
        assert_eq!(
            resolve_store_path(&cli, &config).unwrap(),
            PathBuf::from("/tmp/flag.db")
        );
    }
}
