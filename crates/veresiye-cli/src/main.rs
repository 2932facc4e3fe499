//! Veresiye CLI - customer debt and credit ledger
//!
//! This is the command-line interface for Veresiye. It provides a
//! user-friendly interface to the core library functionality.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;
mod ui;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use app::AppContext;
use cli::{Cli, Commands};
use commands::customers::handle_customer;
use commands::import::handle_import;
use commands::init::handle_init;
use commands::maintenance::{handle_backup, handle_backups, handle_migrate, handle_restore};
use commands::misc::handle_completions;
use commands::prices::handle_prices;
use commands::quick::handle_quick;
use commands::settings::handle_settings;
use commands::summary::handle_summary;
use commands::transactions::handle_transaction;
use errors::exit_code_for;

/// Log filter env var; defaults to warnings only.
const LOG_ENV: &str = "VERESIYE_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let ctx = AppContext::new(&cli);

    if let Err(err) = run(&ctx, &cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    let Some(command) = &cli.command else {
        let mut cmd = Cli::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Init {
            path,
            backup_dir,
            retention_days,
            force,
        } => handle_init(
            ctx,
            path.as_deref(),
            backup_dir.as_deref(),
            *retention_days,
            *force,
        ),
        Commands::Customer(command) => handle_customer(ctx, command),
        Commands::Transaction(command) => handle_transaction(ctx, command),
        Commands::Quick(command) => handle_quick(ctx, command),
        Commands::Summary {
            active,
            top,
            output,
        } => handle_summary(ctx, *active, *top, output),
        Commands::Backup { keep_all } => handle_backup(ctx, *keep_all),
        Commands::Backups(command) => handle_backups(ctx, command),
        Commands::Restore { file, yes } => handle_restore(ctx, file, *yes),
        Commands::Import {
            file,
            customer,
            output,
        } => handle_import(ctx, file, *customer, output),
        Commands::Migrate => handle_migrate(ctx),
        Commands::Settings(command) => handle_settings(ctx, command),
        Commands::Prices { quotes, output } => handle_prices(ctx, quotes, output),
        Commands::Completions { shell } => handle_completions(*shell),
    }
}
