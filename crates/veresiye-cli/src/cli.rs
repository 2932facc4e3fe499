use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use veresiye_core::VERSION;

use crate::ui::OutputFormat;

/// Veresiye - customer debt and credit ledger for jewellers and small shops
#[derive(Parser)]
#[command(name = "veresiye")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the store file
    #[arg(short, long, global = true, env = "VERESIYE_STORE")]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII table borders and badges
    #[arg(long, global = true)]
    pub ascii: bool,
}

/// Output flags shared by read commands.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Output format
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,
}

/// Paging flags for list commands.
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Zero-based page index
    #[arg(long, default_value_t = 0)]
    pub page: usize,

    /// Rows per page
    #[arg(long, default_value_t = crate::constants::DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a config file and create the store
    Init {
        /// Store file to create
        #[arg(value_name = "PATH")]
        path: Option<String>,

        /// Directory for backups
        #[arg(long)]
        backup_dir: Option<String>,

        /// Days to keep backups (0 keeps all)
        #[arg(long)]
        retention_days: Option<u32>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Manage customers
    #[command(subcommand)]
    Customer(CustomerCommand),

    /// Record and list transactions
    #[command(subcommand, name = "tx")]
    Transaction(TransactionCommand),

    /// Walk-in records waiting to be posted
    #[command(subcommand)]
    Quick(QuickCommand),

    /// Totals per currency and the most active customers
    Summary {
        /// Leave deposits out of the totals
        #[arg(long)]
        active: bool,

        /// Customers to show in the activity ranking
        #[arg(long, default_value_t = crate::constants::DEFAULT_TOP_CUSTOMERS)]
        top: usize,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Copy the store into the backup directory and prune old backups
    Backup {
        /// Skip pruning after the copy
        #[arg(long)]
        keep_all: bool,
    },

    /// Inspect the backup directory
    #[command(subcommand)]
    Backups(BackupsCommand),

    /// Replace customers and transactions with those in a backup
    Restore {
        /// Backup file to restore
        #[arg(value_name = "FILE")]
        file: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Browse a store file from another device without touching the live store
    Import {
        /// Store file to open read-only
        #[arg(value_name = "FILE")]
        file: String,

        /// Show one customer's transactions and balances
        #[arg(long)]
        customer: Option<i64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Bring the store schema up to date
    Migrate,

    /// Show or change business settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Print the gold price sheet in display order
    Prices {
        /// Quotes as LABEL=BUY/SELL (e.g. "Çeyrek=4100/4250")
        #[arg(value_name = "QUOTE", required = true)]
        quotes: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum CustomerCommand {
    /// Add a customer
    Add {
        /// Customer name
        #[arg(value_name = "NAME")]
        name: String,

        /// Phone number (up to 10 digits)
        #[arg(long)]
        phone: Option<String>,
    },

    /// Change a customer's name or phone
    Edit {
        #[arg(value_name = "ID")]
        id: i64,

        #[arg(long)]
        name: Option<String>,

        /// New phone number; pass an empty string to clear it
        #[arg(long)]
        phone: Option<String>,
    },

    /// Delete a customer and all of their transactions
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// List customers in Turkish name order
    List {
        /// Search names and phone numbers
        #[arg(long)]
        search: Option<String>,

        /// Sort field (name, phone)
        #[arg(long, default_value = "name")]
        sort: String,

        /// Sort direction (asc, desc)
        #[arg(long, default_value = "asc")]
        order: String,

        #[command(flatten)]
        paging: PageArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show a customer's statement, grouped by currency
    Show {
        #[arg(value_name = "ID")]
        id: i64,

        /// Leave deposits out of the balances
        #[arg(long)]
        active: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the id of the next customer in name order
    Next {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Print the id of the previous customer in name order
    Prev {
        #[arg(value_name = "ID")]
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TransactionCommand {
    /// Record a transaction
    Add {
        /// Customer id
        #[arg(long)]
        customer: i64,

        /// Positive amount (e.g. 1250.75)
        #[arg(long)]
        amount: String,

        /// owes-store (customer took goods) or owes-customer (store holds value)
        #[arg(long, default_value = "owes-store")]
        direction: String,

        /// Currency (try, usd, eur, gbp, gold14k, gold22k, gold24k, quarter, half, full, ziynet)
        #[arg(long, default_value = "try")]
        currency: String,

        /// Transaction date (ISO-8601 or YYYY-MM-DD); defaults to now
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Mark as a deposit held for the customer
        #[arg(long)]
        deposit: bool,

        /// Hide from default listings
        #[arg(long)]
        hidden: bool,
    },

    /// Delete a transaction
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// List transactions
    List {
        /// Only this customer's transactions
        #[arg(long)]
        customer: Option<i64>,

        #[arg(long)]
        currency: Option<String>,

        #[arg(long)]
        direction: Option<String>,

        /// Include hidden transactions
        #[arg(long)]
        hidden: bool,

        /// Deposit handling (include, exclude, only)
        #[arg(long, default_value = "include")]
        deposits: String,

        /// Search transaction descriptions
        #[arg(long)]
        search: Option<String>,

        /// Sort field (date, amount, direction, currency)
        #[arg(long)]
        sort: Option<String>,

        /// Sort direction (asc, desc)
        #[arg(long)]
        order: Option<String>,

        #[command(flatten)]
        paging: PageArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Subcommand)]
pub enum QuickCommand {
    /// Record a walk-in entry
    Add {
        /// Full name
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(long)]
        amount: String,

        /// 11-digit national id
        #[arg(long)]
        national_id: Option<String>,
    },

    /// List quick entries, newest first
    List {
        /// Search names and national ids
        #[arg(long)]
        search: Option<String>,

        /// Hide processed entries
        #[arg(long)]
        pending: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Mark an entry as processed
    Process {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Delete an entry
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BackupsCommand {
    /// List backups, newest first
    List {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Delete backups older than the retention window
    Prune,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show settings
    Show {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Change settings
    Set {
        #[arg(long)]
        business_name: Option<String>,

        #[arg(long)]
        cloud_client_id: Option<String>,

        #[arg(long)]
        cloud_client_secret: Option<String>,

        #[arg(long)]
        setup_completed: Option<bool>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_transaction_add() {
        let cli = Cli::try_parse_from([
            "veresiye", "tx", "add", "--customer", "3", "--amount", "12.5", "--currency", "gold22k",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Transaction(TransactionCommand::Add {
                customer,
                amount,
                currency,
                direction,
                ..
            })) => {
                assert_eq!(customer, 3);
                assert_eq!(amount, "12.5");
                assert_eq!(currency, "gold22k");
                assert_eq!(direction, "owes-store");
            }
            _ => panic!("expected tx add"),
        }
    }
}
