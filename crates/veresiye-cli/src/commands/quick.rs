use chrono::Utc;
use veresiye_core::export::format_amount;
use veresiye_core::storage::{QuickEntry, StorageEngine};

use crate::app::AppContext;
use crate::cli::{OutputArgs, QuickCommand};
use crate::errors::CliError;
use crate::helpers::parse_amount;
use crate::output::{print_json, short_date};
use crate::ui::{badge, header, hint, receipt, table, Badge, Column, UiContext};

pub fn handle_quick(ctx: &AppContext, command: &QuickCommand) -> anyhow::Result<()> {
    match command {
        QuickCommand::Add {
            name,
            amount,
            national_id,
        } => {
            let mut entry = QuickEntry::new(name.as_str(), parse_amount(amount)?, Utc::now());
            if let Some(value) = national_id.as_deref() {
                entry = entry.with_national_id(value);
            }
            handle_add(ctx, &entry)
        }
        QuickCommand::List {
            search,
            pending,
            output,
        } => handle_list(ctx, search.as_deref(), *pending, output),
        QuickCommand::Process { id } => handle_process(ctx, *id),
        QuickCommand::Delete { id } => {
            ctx.storage()?
                .soft_delete_quick_entry(*id)
                .map_err(CliError::from)?;
            if !ctx.quiet() {
                let ui = UiContext::for_receipts(ctx.cli());
                println!("{}", receipt(&ui, "Quick entry deleted", &[("Id", &id.to_string())]));
            }
            Ok(())
        }
    }
}

fn handle_add(ctx: &AppContext, entry: &QuickEntry) -> anyhow::Result<()> {
    let id = ctx
        .storage()?
        .save_quick_entry(entry)
        .map_err(CliError::from)?;
    if ctx.quiet() {
        println!("{}", id);
        return Ok(());
    }
    let ui = UiContext::for_receipts(ctx.cli());
    println!(
        "{}",
        receipt(
            &ui,
            "Quick entry added",
            &[("Id", &id.to_string()), ("Name", entry.full_name.trim())]
        )
    );
    Ok(())
}

fn handle_list(
    ctx: &AppContext,
    search: Option<&str>,
    pending: bool,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let mut entries = match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => storage.search_quick_entries(term)?,
        None => storage.list_quick_entries()?,
    };
    if pending {
        entries.retain(|e| !e.is_processed);
    }

    let ui = UiContext::for_command(ctx.cli(), output);
    if ui.mode.is_json() {
        return print_json(&entries);
    }
    if ui.mode.is_pretty() {
        println!("{}", header(&ui, "quick list", search));
    }
    if entries.is_empty() {
        if !ctx.quiet() {
            println!("{}", hint(&ui, "No quick entries."));
        }
        return Ok(());
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                short_date(&e.created_at),
                e.full_name.clone(),
                e.national_id.clone().unwrap_or_default(),
                format_amount(e.amount),
                if e.is_processed { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        table(
            &ui,
            &[
                Column::numeric("Id"),
                Column::new("Created"),
                Column::new("Name"),
                Column::new("National Id"),
                Column::numeric("Amount"),
                Column::new("Processed"),
            ],
            &rows
        )
    );
    Ok(())
}

fn handle_process(ctx: &AppContext, id: i64) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let mut entry = storage.get_quick_entry(id)?.ok_or_else(|| {
        CliError::not_found(
            format!("Quick entry {} not found", id),
            "Run `veresiye quick list` to see entry ids.",
        )
    })?;
    if entry.is_processed {
        if !ctx.quiet() {
            let ui = UiContext::for_receipts(ctx.cli());
            println!(
                "{}",
                badge(&ui, Badge::Warn, &format!("Quick entry {} is already processed", id))
            );
        }
        return Ok(());
    }
    entry.is_processed = true;
    storage.save_quick_entry(&entry).map_err(CliError::from)?;
    if !ctx.quiet() {
        let ui = UiContext::for_receipts(ctx.cli());
        println!(
            "{}",
            receipt(&ui, "Quick entry processed", &[("Id", &id.to_string())])
        );
    }
    Ok(())
}
