use veresiye_core::backup::{cloud_configured, upload_status_message, UploadOutcome};
use veresiye_core::storage::{Settings, StorageEngine};

use crate::app::AppContext;
use crate::cli::SettingsCommand;
use crate::errors::CliError;
use crate::output::print_json;
use crate::ui::{header, hint, kv, receipt, UiContext};

const MASK: &str = "********";

pub fn handle_settings(ctx: &AppContext, command: &SettingsCommand) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let current = storage.settings()?.unwrap_or_default();
    match command {
        SettingsCommand::Show { output } => {
            let ui = UiContext::for_command(ctx.cli(), output);
            let secret = if current.cloud_client_secret.is_empty() {
                ""
            } else {
                MASK
            };
            if ui.mode.is_json() {
                return print_json(&serde_json::json!({
                    "business_name": current.business_name,
                    "cloud_client_id": current.cloud_client_id,
                    "cloud_client_secret": secret,
                    "setup_completed": current.setup_completed,
                    "cloud_configured": cloud_configured(&current),
                }));
            }
            if ui.mode.is_pretty() {
                println!("{}", header(&ui, "settings", None));
            }
            println!("{}", kv(&ui, "Business name", &current.business_name));
            println!("{}", kv(&ui, "Cloud client id", &current.cloud_client_id));
            println!("{}", kv(&ui, "Cloud client secret", secret));
            println!(
                "{}",
                kv(&ui, "Setup completed", &current.setup_completed.to_string())
            );
            if !cloud_configured(&current) && !ctx.quiet() {
                println!(
                    "{}",
                    hint(&ui, &upload_status_message(&UploadOutcome::NotConfigured))
                );
            }
            Ok(())
        }
        SettingsCommand::Set {
            business_name,
            cloud_client_id,
            cloud_client_secret,
            setup_completed,
        } => {
            if business_name.is_none()
                && cloud_client_id.is_none()
                && cloud_client_secret.is_none()
                && setup_completed.is_none()
            {
                return Err(CliError::invalid_input("Nothing to change; pass at least one setting").into());
            }
            let updated = Settings {
                business_name: business_name.clone().unwrap_or(current.business_name),
                cloud_client_id: cloud_client_id.clone().unwrap_or(current.cloud_client_id),
                cloud_client_secret: cloud_client_secret
                    .clone()
                    .unwrap_or(current.cloud_client_secret),
                setup_completed: setup_completed.unwrap_or(current.setup_completed),
            };
            storage.save_settings(&updated).map_err(CliError::from)?;
            if !ctx.quiet() {
                let ui = UiContext::for_receipts(ctx.cli());
                println!(
                    "{}",
                    receipt(
                        &ui,
                        "Settings saved",
                        &[("Business name", &updated.business_name)]
                    )
                );
            }
            Ok(())
        }
    }
}
