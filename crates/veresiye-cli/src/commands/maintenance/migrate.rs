use veresiye_core::storage::StorageEngine;

use crate::app::AppContext;
use crate::ui::{badge, kv, Badge, UiContext};

pub fn handle_migrate(ctx: &AppContext) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let report = storage.migration_report().clone();
    storage.refresh_schema()?;

    if ctx.quiet() {
        return Ok(());
    }
    let ui = UiContext::for_receipts(ctx.cli());
    if report.is_noop() {
        println!(
            "{}",
            badge(
                &ui,
                Badge::Ok,
                &format!("Schema is up to date (version {})", report.to_version)
            )
        );
        return Ok(());
    }
    println!(
        "{}",
        badge(
            &ui,
            Badge::Info,
            &format!(
                "Schema upgraded from version {} to {}",
                report.from_version, report.to_version
            )
        )
    );
    for step in &report.applied {
        println!("  {}", kv(&ui, "Applied", step));
    }
    Ok(())
}
