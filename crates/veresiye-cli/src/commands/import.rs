use std::path::Path;

use veresiye_core::export::format_with_unit;
use veresiye_core::import::ImportedLedger;
use veresiye_core::BalanceOptions;

use crate::app::AppContext;
use crate::cli::OutputArgs;
use crate::errors::CliError;
use crate::output::{balance_rows, customer_rows, direction_label, print_json, short_date};
use crate::ui::{blank_line, header, hint, kv, table, Column, UiContext};

pub fn handle_import(
    ctx: &AppContext,
    file: &str,
    customer: Option<i64>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let path = Path::new(file);
    if !path.exists() {
        return Err(CliError::not_found(format!("No file at {}", path.display()), "").into());
    }
    let imported = ImportedLedger::open(path).map_err(CliError::from)?;
    let ui = UiContext::for_command(ctx.cli(), output);

    let Some(customer_id) = customer else {
        if ui.mode.is_json() {
            return print_json(&serde_json::json!({
                "path": imported.path(),
                "customers": imported.customers(),
                "transactions": imported.transactions().len(),
            }));
        }
        if ui.mode.is_pretty() {
            println!("{}", header(&ui, "import", Some(file)));
        }
        println!("{}", kv(&ui, "Customers", &imported.customers().len().to_string()));
        println!(
            "{}",
            kv(&ui, "Transactions", &imported.transactions().len().to_string())
        );
        if !imported.customers().is_empty() {
            println!("{}", blank_line());
            println!(
                "{}",
                table(
                    &ui,
                    &[Column::numeric("Id"), Column::new("Name"), Column::new("Phone")],
                    &customer_rows(imported.customers())
                )
            );
            if !ctx.quiet() {
                println!("{}", hint(&ui, "Pass --customer <ID> to see one account."));
            }
        }
        return Ok(());
    };

    let found = imported.customer(customer_id).ok_or_else(|| {
        CliError::not_found(format!("Customer {} not found in {}", customer_id, file), "")
    })?;
    let transactions = imported.transactions_by_customer(customer_id);
    let balances = imported.balances(customer_id, BalanceOptions::all())?;

    if ui.mode.is_json() {
        return print_json(&serde_json::json!({
            "customer": found,
            "balances": balances,
            "transactions": transactions,
        }));
    }
    if ui.mode.is_pretty() {
        println!("{}", header(&ui, "import", Some(&found.name)));
    }
    println!("{}", kv(&ui, "Name", &found.name));
    if !balances.is_empty() {
        println!(
            "{}",
            table(
                &ui,
                &[
                    Column::new("Currency"),
                    Column::numeric("Debt"),
                    Column::numeric("Credit"),
                    Column::numeric("Net"),
                ],
                &balance_rows(&balances)
            )
        );
    }
    let rows: Vec<Vec<String>> = transactions
        .iter()
        .map(|tx| {
            vec![
                tx.id.to_string(),
                short_date(&tx.date),
                direction_label(tx.direction).to_string(),
                format_with_unit(tx.amount, tx.currency),
                tx.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    if !rows.is_empty() {
        println!("{}", blank_line());
        println!(
            "{}",
            table(
                &ui,
                &[
                    Column::numeric("Id"),
                    Column::new("Date"),
                    Column::new("Type"),
                    Column::numeric("Amount"),
                    Column::new("Description"),
                ],
                &rows
            )
        );
    }
    Ok(())
}
