use veresiye_core::BackupCoordinator;

use crate::app::AppContext;
use crate::cli::{BackupsCommand, OutputArgs};
use crate::errors::CliError;
use crate::output::print_json;
use crate::ui::{header, hint, receipt, table, Column, UiContext};

pub fn handle_backup(ctx: &AppContext, keep_all: bool) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let coordinator = BackupCoordinator::new(storage, ctx.backup_config()?);

    let report = coordinator.backup();
    if !report.success {
        return Err(CliError::backup_failed(report.message).into());
    }
    let path = report
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let pruned = if keep_all {
        Vec::new()
    } else {
        coordinator.prune()?
    };

    if ctx.quiet() {
        println!("{}", path);
        return Ok(());
    }
    let ui = UiContext::for_receipts(ctx.cli());
    println!(
        "{}",
        receipt(
            &ui,
            "Backup created",
            &[("Path", &path), ("Pruned", &pruned.len().to_string())]
        )
    );
    Ok(())
}

pub fn handle_backups(ctx: &AppContext, command: &BackupsCommand) -> anyhow::Result<()> {
    match command {
        BackupsCommand::List { output } => handle_list(ctx, output),
        BackupsCommand::Prune => {
            let coordinator = BackupCoordinator::new(ctx.storage()?, ctx.backup_config()?);
            let removed = coordinator.prune()?;
            if !ctx.quiet() {
                let ui = UiContext::for_receipts(ctx.cli());
                println!(
                    "{}",
                    receipt(
                        &ui,
                        "Backups pruned",
                        &[
                            ("Removed", &removed.len().to_string()),
                            (
                                "Retention days",
                                &coordinator.config().retention_days.to_string()
                            ),
                        ]
                    )
                );
            }
            Ok(())
        }
    }
}

fn handle_list(ctx: &AppContext, output: &OutputArgs) -> anyhow::Result<()> {
    let config = ctx.backup_config()?;
    let coordinator = BackupCoordinator::new(ctx.storage()?, config);
    let backups = coordinator.list_backups()?;

    let ui = UiContext::for_command(ctx.cli(), output);
    if ui.mode.is_json() {
        return print_json(&backups);
    }
    if ui.mode.is_pretty() {
        let dir = coordinator.config().directory.display().to_string();
        println!("{}", header(&ui, "backups list", Some(&dir)));
    }
    if backups.is_empty() {
        if !ctx.quiet() {
            println!("{}", hint(&ui, "No backups yet. Run `veresiye backup`."));
        }
        return Ok(());
    }
    let rows: Vec<Vec<String>> = backups
        .iter()
        .map(|b| {
            vec![
                b.created_at.format("%d.%m.%Y %H:%M:%S").to_string(),
                b.size.to_string(),
                b.path.display().to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        table(
            &ui,
            &[Column::new("Created"), Column::numeric("Bytes"), Column::new("Path")],
            &rows
        )
    );
    Ok(())
}
