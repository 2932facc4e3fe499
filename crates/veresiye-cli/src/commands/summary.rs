use veresiye_core::export::format_with_unit;
use veresiye_core::{BalanceOptions, Ledger};

use crate::app::AppContext;
use crate::cli::OutputArgs;
use crate::output::print_json;
use crate::ui::{blank_line, header, kv, table, Column, UiContext};

pub fn handle_summary(
    ctx: &AppContext,
    active: bool,
    top: usize,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let opts = if active {
        BalanceOptions::active()
    } else {
        BalanceOptions::all()
    };
    let summary = Ledger::new(ctx.storage()?).summary(opts, top)?;

    let ui = UiContext::for_command(ctx.cli(), output);
    if ui.mode.is_json() {
        return print_json(&summary);
    }

    if ui.mode.is_pretty() {
        println!(
            "{}",
            header(&ui, "summary", if active { Some("deposits excluded") } else { None })
        );
    }
    println!("{}", kv(&ui, "Customers", &summary.customer_count.to_string()));
    println!("{}", kv(&ui, "Transactions", &summary.transaction_count.to_string()));
    println!("{}", kv(&ui, "Indebted customers", &summary.indebted_customers.to_string()));
    println!(
        "{}",
        kv(
            &ui,
            "Most active currency",
            &format!(
                "{} ({})",
                summary.most_active.currency.display_name(),
                summary.most_active.count
            )
        )
    );

    let rows: Vec<Vec<String>> = summary
        .currencies
        .iter()
        .filter(|c| !c.owed_to_business.is_zero() || !c.owed_to_customers.is_zero())
        .map(|c| {
            vec![
                c.currency.display_name().to_string(),
                format_with_unit(c.owed_to_business, c.currency),
                format_with_unit(c.owed_to_customers, c.currency),
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
                    Column::new("Currency"),
                    Column::numeric("Receivable"),
                    Column::numeric("Payable"),
                ],
                &rows
            )
        );
    }

    if !summary.top_customers.is_empty() {
        let rows: Vec<Vec<String>> = summary
            .top_customers
            .iter()
            .map(|c| {
                vec![
                    c.customer_id.to_string(),
                    c.customer_name.clone(),
                    c.transaction_count.to_string(),
                ]
            })
            .collect();
        println!("{}", blank_line());
        println!(
            "{}",
            table(
                &ui,
                &[
                    Column::numeric("Id"),
                    Column::new("Customer"),
                    Column::numeric("Transactions"),
                ],
                &rows
            )
        );
    }
    Ok(())
}
