use std::path::PathBuf;

use veresiye_core::SqliteStorage;

use crate::app::{resolve_config_path, AppContext};
use crate::config::{default_store_path, write_config, BackupSection, StoreSection, VeresiyeConfig};
use crate::errors::CliError;
use crate::ui::{hint, receipt, UiContext};

pub fn handle_init(
    ctx: &AppContext,
    path: Option<&str>,
    backup_dir: Option<&str>,
    retention_days: Option<u32>,
    force: bool,
) -> anyhow::Result<()> {
    let config_path = resolve_config_path()?;
    if config_path.exists() && !force {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {}\nHint: Pass --force to overwrite it.",
            config_path.display()
        ))
        .into());
    }

    let store_path = match path.or(ctx.cli().store.as_deref()) {
        Some(p) => PathBuf::from(p),
        None => default_store_path()?,
    };
    let defaults = BackupSection::default();
    let config = VeresiyeConfig {
        store: StoreSection {
            path: Some(store_path.to_string_lossy().to_string()),
        },
        backup: BackupSection {
            directory: backup_dir.map(str::to_string),
            retention_days: retention_days.unwrap_or(defaults.retention_days),
            ..defaults
        },
    };
    let backups = config.backup_config()?;

    let storage = SqliteStorage::open(&store_path).map_err(CliError::from)?;
    write_config(&config_path, &config)?;
    tracing::info!(
        config = %config_path.display(),
        store = %store_path.display(),
        schema = storage.migration_report().to_version,
        "Initialized"
    );

    if !ctx.quiet() {
        let ui = UiContext::for_receipts(ctx.cli());
        println!(
            "{}",
            receipt(
                &ui,
                "Veresiye initialized",
                &[
                    ("Config", &config_path.display().to_string()),
                    ("Store", &store_path.display().to_string()),
                    ("Backups", &backups.directory.display().to_string()),
                ]
            )
        );
        println!("{}", hint(&ui, "veresiye customer add <NAME>"));
    }
    Ok(())
}
