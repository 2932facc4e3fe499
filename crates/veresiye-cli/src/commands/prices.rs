use chrono::Utc;
use veresiye_core::export::{format_amount, price_sheet, PriceQuote, PRICE_SHEET_ORDER};

use crate::app::AppContext;
use crate::cli::OutputArgs;
use crate::errors::CliError;
use crate::helpers::parse_quote;
use crate::output::print_json;
use crate::ui::{header, table, Column, UiContext};

pub fn handle_prices(ctx: &AppContext, quotes: &[String], output: &OutputArgs) -> anyhow::Result<()> {
    let now = Utc::now();
    let mut parsed = Vec::with_capacity(quotes.len());
    for raw in quotes {
        let (label, buy, sell) = parse_quote(raw)?;
        parsed.push(PriceQuote::new(label, buy, sell, now));
    }

    let sheet = price_sheet(&parsed);
    if sheet.is_empty() {
        return Err(CliError::invalid_input(format!(
            "No quote matches the price sheet. Labels: {}",
            PRICE_SHEET_ORDER.join(", ")
        ))
        .into());
    }

    let ui = UiContext::for_command(ctx.cli(), output);
    if ui.mode.is_json() {
        return print_json(&sheet);
    }
    if ui.mode.is_pretty() {
        println!("{}", header(&ui, "prices", None));
    }
    let rows: Vec<Vec<String>> = sheet
        .iter()
        .map(|q| {
            vec![
                q.label.clone(),
                q.currency.map(|c| c.slug().to_string()).unwrap_or_default(),
                format_amount(q.buy),
                format_amount(q.sell),
            ]
        })
        .collect();
    println!(
        "{}",
        table(
            &ui,
            &[
                Column::new("Product"),
                Column::new("Currency"),
                Column::numeric("Buy"),
                Column::numeric("Sell"),
            ],
            &rows
        )
    );
    Ok(())
}
