use veresiye_core::export::{format_phone, format_with_unit};
use veresiye_core::query::{CustomerQuery, CustomerSortField, SortDirection};
use veresiye_core::storage::{Customer, StorageEngine, TransactionFilter};
use veresiye_core::{BalanceOptions, Ledger, QueryEngine};

use crate::app::AppContext;
use crate::cli::{CustomerCommand, OutputArgs, PageArgs};
use crate::errors::CliError;
use crate::helpers::parse_enum;
use crate::output::{balance_rows, customer_rows, direction_label, print_json, short_date};
use crate::ui::{blank_line, divider, header, hint, kv, receipt, table, Column, UiContext};

pub fn handle_customer(ctx: &AppContext, command: &CustomerCommand) -> anyhow::Result<()> {
    match command {
        CustomerCommand::Add { name, phone } => handle_add(ctx, name, phone.as_deref()),
        CustomerCommand::Edit { id, name, phone } => {
            handle_edit(ctx, *id, name.as_deref(), phone.as_deref())
        }
        CustomerCommand::Delete { id } => handle_delete(ctx, *id),
        CustomerCommand::List {
            search,
            sort,
            order,
            paging,
            output,
        } => handle_list(ctx, search.as_deref(), sort, order, paging, output),
        CustomerCommand::Show { id, active, output } => handle_show(ctx, *id, *active, output),
        CustomerCommand::Next { id } => handle_neighbor(ctx, *id, true),
        CustomerCommand::Prev { id } => handle_neighbor(ctx, *id, false),
    }
}

fn require_customer<S: StorageEngine + ?Sized>(storage: &S, id: i64) -> anyhow::Result<Customer> {
    storage.get_customer(id)?.ok_or_else(|| {
        CliError::not_found(
            format!("Customer {} not found", id),
            "Run `veresiye customer list` to see customer ids.",
        )
        .into()
    })
}

fn handle_add(ctx: &AppContext, name: &str, phone: Option<&str>) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let mut customer = Customer::new(name);
    customer.phone = phone.map(str::to_string);
    let id = storage.save_customer(&customer).map_err(CliError::from)?;
    tracing::debug!(id, "Customer added");

    if ctx.quiet() {
        println!("{}", id);
        return Ok(());
    }
    let ui = UiContext::for_receipts(ctx.cli());
    let saved = require_customer(storage, id)?;
    println!(
        "{}",
        receipt(
            &ui,
            "Customer added",
            &[("Id", &id.to_string()), ("Name", &saved.name)]
        )
    );
    Ok(())
}

fn handle_edit(
    ctx: &AppContext,
    id: i64,
    name: Option<&str>,
    phone: Option<&str>,
) -> anyhow::Result<()> {
    if name.is_none() && phone.is_none() {
        return Err(CliError::invalid_input("Nothing to change; pass --name or --phone").into());
    }
    let storage = ctx.storage()?;
    let mut customer = require_customer(storage, id)?;
    if let Some(name) = name {
        customer.name = name.to_string();
    }
    if let Some(phone) = phone {
        customer.phone = if phone.trim().is_empty() {
            None
        } else {
            Some(phone.to_string())
        };
    }
    storage.save_customer(&customer).map_err(CliError::from)?;

    if !ctx.quiet() {
        let ui = UiContext::for_receipts(ctx.cli());
        let saved = require_customer(storage, id)?;
        let phone = saved.phone.as_deref().map(format_phone).unwrap_or_default();
        println!(
            "{}",
            receipt(
                &ui,
                "Customer updated",
                &[("Id", &id.to_string()), ("Name", &saved.name), ("Phone", &phone)]
            )
        );
    }
    Ok(())
}

fn handle_delete(ctx: &AppContext, id: i64) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let cascaded = storage.soft_delete_customer(id).map_err(CliError::from)?;
    tracing::info!(id, cascaded, "Customer deleted");

    if !ctx.quiet() {
        let ui = UiContext::for_receipts(ctx.cli());
        println!(
            "{}",
            receipt(
                &ui,
                "Customer deleted",
                &[
                    ("Id", &id.to_string()),
                    ("Transactions deleted", &cascaded.to_string())
                ]
            )
        );
    }
    Ok(())
}

fn handle_list(
    ctx: &AppContext,
    search: Option<&str>,
    sort: &str,
    order: &str,
    paging: &PageArgs,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let field: CustomerSortField = parse_enum(sort)?;
    let direction: SortDirection = parse_enum(order)?;
    let mut query = CustomerQuery::new().sort_by(field, direction);
    if let Some(term) = search {
        query = query.search(term);
    }

    let engine = QueryEngine::new(ctx.storage()?);
    let page = engine.customer_page(&query, paging.page, paging.page_size)?;

    let ui = UiContext::for_command(ctx.cli(), output);
    if ui.mode.is_json() {
        return print_json(&page);
    }

    if ui.mode.is_pretty() {
        println!("{}", header(&ui, "customer list", search));
    }
    if page.items.is_empty() {
        if !ctx.quiet() {
            println!("{}", hint(&ui, "No customers. Add one with `veresiye customer add <NAME>`."));
        }
        return Ok(());
    }
    println!(
        "{}",
        table(
            &ui,
            &[Column::numeric("Id"), Column::new("Name"), Column::new("Phone")],
            &customer_rows(&page.items)
        )
    );
    if ui.mode.is_pretty() {
        println!(
            "{}",
            kv(
                &ui,
                "Page",
                &format!("{} of {} ({} customers)", page.page + 1, page.page_count(), page.total)
            )
        );
        if page.has_next() {
            println!("{}", hint(&ui, &format!("--page {}", page.page + 1)));
        }
    }
    Ok(())
}

fn handle_show(ctx: &AppContext, id: i64, active: bool, output: &OutputArgs) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let opts = if active {
        BalanceOptions::active()
    } else {
        BalanceOptions::all()
    };
    let customer = require_customer(storage, id)?;
    let ledger = Ledger::new(storage);
    let statement = ledger.statement(customer.id, opts)?;
    let balances = ledger.balances(customer.id, opts)?;

    let ui = UiContext::for_command(ctx.cli(), output);
    if ui.mode.is_json() {
        return print_json(&serde_json::json!({
            "customer": statement.customer,
            "balances": balances,
            "groups": statement.groups,
        }));
    }

    if ui.mode.is_pretty() {
        println!("{}", header(&ui, "customer show", Some(&customer.name)));
    }
    println!("{}", kv(&ui, "Id", &customer.id.to_string()));
    println!("{}", kv(&ui, "Name", &customer.name));
    if let Some(phone) = customer.phone.as_deref() {
        println!("{}", kv(&ui, "Phone", &format_phone(phone)));
    }
    let count = storage
        .list_transactions(&TransactionFilter::new().customer(customer.id))?
        .len();
    println!("{}", kv(&ui, "Transactions", &count.to_string()));

    if statement.is_empty() {
        println!("{}", hint(&ui, "No transactions yet."));
        return Ok(());
    }

    println!("{}", blank_line());
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

    for group in &statement.groups {
        println!("{}", blank_line());
        println!("{}", divider(&ui));
        println!(
            "{}",
            kv(
                &ui,
                group.currency.display_name(),
                &format_with_unit(group.balance, group.currency)
            )
        );
        let rows: Vec<Vec<String>> = group
            .transactions
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

fn handle_neighbor(ctx: &AppContext, id: i64, forward: bool) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    require_customer(storage, id)?;
    let engine = QueryEngine::new(storage);
    let neighbor = if forward {
        engine.next_customer_id(id)?
    } else {
        engine.previous_customer_id(id)?
    };
    match neighbor {
        Some(other) => println!("{}", other),
        None => {
            if !ctx.quiet() {
                let which = if forward { "last" } else { "first" };
                eprintln!("Customer {} is the {} in name order.", id, which);
            }
        }
    }
    Ok(())
}
