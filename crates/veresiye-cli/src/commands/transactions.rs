use chrono::Utc;
use veresiye_core::export::format_with_unit;
use veresiye_core::query::{DepositFilter, SortDirection, TransactionQuery};
use veresiye_core::storage::{Currency, Direction, StorageEngine, Transaction};
use veresiye_core::{BalanceOptions, Ledger, QueryEngine};

use crate::app::AppContext;
use crate::cli::{OutputArgs, PageArgs, TransactionCommand};
use crate::errors::CliError;
use crate::helpers::{parse_amount, parse_datetime, parse_enum};
use crate::output::{
    customer_name, customer_name_map, print_json, transaction_rows, transactions_json,
};
use crate::ui::{header, hint, kv, receipt, table, Column, UiContext};

pub fn handle_transaction(ctx: &AppContext, command: &TransactionCommand) -> anyhow::Result<()> {
    match command {
        TransactionCommand::Add {
            customer,
            amount,
            direction,
            currency,
            date,
            description,
            deposit,
            hidden,
        } => {
            let mut tx = Transaction::new(
                *customer,
                parse_amount(amount)?,
                parse_enum::<Direction>(direction)?,
                parse_enum::<Currency>(currency)?,
                match date.as_deref() {
                    Some(value) => parse_datetime(value)?,
                    None => Utc::now(),
                },
            );
            if let Some(text) = description.as_deref().filter(|d| !d.trim().is_empty()) {
                tx = tx.with_description(text);
            }
            if *deposit {
                tx = tx.deposit();
            }
            if *hidden {
                tx = tx.hidden();
            }
            handle_add(ctx, &tx)
        }
        TransactionCommand::Delete { id } => handle_delete(ctx, *id),
        TransactionCommand::List {
            customer,
            currency,
            direction,
            hidden,
            deposits,
            search,
            sort,
            order,
            paging,
            output,
        } => {
            let mut query = TransactionQuery::new().deposits(parse_enum::<DepositFilter>(deposits)?);
            if let Some(id) = customer {
                query = query.customer(*id);
            }
            if let Some(value) = currency.as_deref() {
                query = query.currency(parse_enum(value)?);
            }
            if let Some(value) = direction.as_deref() {
                query = query.direction(parse_enum(value)?);
            }
            if *hidden {
                query = query.include_hidden();
            }
            if let Some(term) = search.as_deref() {
                query = query.search(term);
            }
            let order = order
                .as_deref()
                .map(parse_enum::<SortDirection>)
                .transpose()?;
            match (sort.as_deref(), order) {
                (Some(field), order) => query = query.sort_by(field, order),
                (None, Some(order)) => query = query.sort_by("date", Some(order)),
                (None, None) => {}
            }
            handle_list(ctx, &query, paging, output)
        }
    }
}

fn handle_add(ctx: &AppContext, tx: &Transaction) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let id = storage.save_transaction(tx).map_err(CliError::from)?;
    tracing::debug!(id, customer_id = tx.customer_id, "Transaction added");

    if ctx.quiet() {
        println!("{}", id);
        return Ok(());
    }
    let balance = Ledger::new(storage).net_balance(tx.customer_id, tx.currency, BalanceOptions::all())?;
    let names = customer_name_map(storage)?;
    let ui = UiContext::for_receipts(ctx.cli());
    println!(
        "{}",
        receipt(
            &ui,
            "Transaction recorded",
            &[
                ("Id", &id.to_string()),
                ("Customer", &customer_name(&names, tx.customer_id)),
                ("Amount", &format_with_unit(tx.amount, tx.currency)),
                ("Balance", &format_with_unit(balance, tx.currency)),
            ]
        )
    );
    Ok(())
}

fn handle_delete(ctx: &AppContext, id: i64) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    storage.soft_delete_transaction(id).map_err(CliError::from)?;
    tracing::info!(id, "Transaction deleted");
    if !ctx.quiet() {
        let ui = UiContext::for_receipts(ctx.cli());
        println!(
            "{}",
            receipt(&ui, "Transaction deleted", &[("Id", &id.to_string())])
        );
    }
    Ok(())
}

fn handle_list(
    ctx: &AppContext,
    query: &TransactionQuery,
    paging: &PageArgs,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    if let Some(id) = query.customer_id {
        if storage.get_customer(id)?.is_none() {
            return Err(CliError::not_found(
                format!("Customer {} not found", id),
                "Run `veresiye customer list` to see customer ids.",
            )
            .into());
        }
    }

    let page = QueryEngine::new(storage).transaction_page(query, paging.page, paging.page_size)?;
    let names = customer_name_map(storage)?;

    let ui = UiContext::for_command(ctx.cli(), output);
    if ui.mode.is_json() {
        return print_json(&serde_json::json!({
            "items": transactions_json(&page.items, &names),
            "total": page.total,
            "page": page.page,
            "page_size": page.page_size,
        }));
    }

    if ui.mode.is_pretty() {
        println!("{}", header(&ui, "tx list", query.search.as_deref()));
    }
    if page.items.is_empty() {
        if !ctx.quiet() {
            println!("{}", hint(&ui, "No transactions match."));
        }
        return Ok(());
    }
    println!(
        "{}",
        table(
            &ui,
            &[
                Column::numeric("Id"),
                Column::new("Date"),
                Column::new("Customer"),
                Column::new("Type"),
                Column::numeric("Amount"),
                Column::new("Description"),
                Column::new("Flags"),
            ],
            &transaction_rows(&page.items, &names)
        )
    );
    if ui.mode.is_pretty() {
        println!(
            "{}",
            kv(
                &ui,
                "Page",
                &format!("{} of {} ({} transactions)", page.page + 1, page.page_count(), page.total)
            )
        );
    }
    Ok(())
}
