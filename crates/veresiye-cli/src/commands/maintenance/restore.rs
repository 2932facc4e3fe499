use std::io::IsTerminal;
use std::path::Path;

use veresiye_core::{BackupCoordinator, SqliteStorage};

use crate::app::AppContext;
use crate::errors::CliError;
use crate::ui::{receipt, UiContext};

pub fn handle_restore(ctx: &AppContext, file: &str, yes: bool) -> anyhow::Result<()> {
    let source = Path::new(file);
    if !source.exists() {
        return Err(CliError::not_found(
            format!("No backup found at {}", source.display()),
            "Run `veresiye backups list` to see available backups.",
        )
        .into());
    }
    BackupCoordinator::<SqliteStorage>::validate(source).map_err(CliError::from)?;

    if !yes && !ctx.quiet() && std::io::stdin().is_terminal() {
        let proceed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Replace all customers and transactions with {}?",
                source.display()
            ))
            .default(false)
            .interact()?;
        if !proceed {
            return Err(CliError::invalid_input("Restore cancelled").into());
        }
    }

    let storage = ctx.storage()?;
    let coordinator = BackupCoordinator::new(storage, ctx.backup_config()?);
    let report = coordinator.restore(source);
    if !report.success {
        return Err(CliError::backup_failed(report.message).into());
    }

    if !ctx.quiet() {
        let ui = UiContext::for_receipts(ctx.cli());
        let previous = report
            .before_restore
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "{}",
            receipt(
                &ui,
                "Restore completed",
                &[
                    ("Source", &source.display().to_string()),
                    ("Customers", &report.customers.to_string()),
                    ("Transactions", &report.transactions.to_string()),
                    ("Previous data", &previous),
                ]
            )
        );
    }
    Ok(())
}
