pub mod accounts;
pub mod budgets;
pub mod export;
pub mod init;
pub mod items;
pub mod report;
pub mod rules;
pub mod sync;
pub mod tables;
pub mod transactions;

use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use serde::Serialize;

use crate::db::Ledger;
use crate::error::Result;
use crate::models::TransactionFilter;
use crate::provider::Environment;
use crate::settings::load_settings;

#[derive(Parser)]
#[command(name = "tally", version, about = "Local ledger for bank transactions: sync, tag, budget, report.")]
pub struct Cli {
    /// Render lists as tables instead of JSON
    #[arg(long, global = true)]
    pub table: bool,
    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save settings and create the ledger.
    Init {
        /// Path for tally data (default: ~/Documents/tally)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        #[arg(long = "client-id")]
        client_id: Option<String>,
        #[arg(long)]
        secret: Option<String>,
        #[arg(long, value_enum)]
        environment: Option<Environment>,
        /// Override the API host, e.g. for a local mock
        #[arg(long = "base-url")]
        base_url: Option<String>,
    },
    /// Manage linked items.
    Items {
        #[command(subcommand)]
        command: ItemsCommands,
    },
    /// Pull new, changed and removed transactions, then apply tag rules.
    Sync {
        /// Only sync this item
        #[arg(long)]
        item: Option<String>,
        /// Drop the saved cursor and pull the full history again
        #[arg(long)]
        full: bool,
    },
    /// List accounts and balances.
    Accounts,
    /// List transactions, newest first.
    Transactions {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Ranked full-text search.
    Search {
        /// Terms; any of them may match
        #[arg(required = true)]
        query: Vec<String>,
        #[arg(long, default_value_t = crate::search::DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Case-insensitive regex over merchant and name.
    Grep {
        pattern: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Manage tag rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Set or clear a transaction's tag by hand.
    Tag {
        transaction_id: String,
        /// New tag; omit with --clear to remove it
        #[arg(required_unless_present = "clear")]
        tag: Option<String>,
        #[arg(long, conflicts_with = "tag")]
        clear: bool,
    },
    /// Manage monthly budgets.
    Budgets {
        #[command(subcommand)]
        command: BudgetsCommands,
    },
    /// Spending by tag with each tag's share.
    Split {
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
    },
    /// Monthly spend with average and trend.
    Burn {
        #[arg(long, default_value_t = crate::reports::DEFAULT_MONTHS)]
        months: u32,
    },
    /// Monthly income against expenses.
    Net {
        #[arg(long, default_value_t = crate::reports::DEFAULT_MONTHS)]
        months: u32,
    },
    /// Balances, recent activity, budgets, burn and runway in one view.
    Snapshot,
    /// Write transactions as CSV.
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ItemsCommands {
    /// Register a linked item's access token.
    Add {
        item_id: String,
        #[arg(long = "access-token")]
        access_token: String,
        #[arg(long)]
        institution: Option<String>,
    },
    /// List linked items with their last sync.
    List,
    /// Forget an item and delete its accounts and transactions.
    Remove { item_id: String },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a tag rule.
    Add {
        /// Regular expression matched against "merchant name"
        pattern: String,
        #[arg(long)]
        tag: String,
        /// Higher runs first
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        priority: i64,
    },
    /// List rules in evaluation order.
    List,
    /// Delete a rule.
    Delete { id: i64 },
    /// Tag untagged transactions now.
    Apply,
}

#[derive(Subcommand)]
pub enum BudgetsCommands {
    /// Create or replace the budget for a tag.
    Set {
        tag: String,
        #[arg(long)]
        limit: f64,
        /// Alert once this fraction of the limit is spent
        #[arg(long, default_value_t = crate::models::DEFAULT_ALERT_THRESHOLD)]
        threshold: f64,
    },
    /// List configured budgets.
    List,
    /// Delete a budget.
    Delete { tag: String },
    /// Spend against each budget for a month.
    Status {
        /// Month: YYYY-MM (default: current)
        #[arg(long)]
        month: Option<String>,
    },
    /// Budgets at or past their alert threshold.
    Alerts {
        #[arg(long)]
        month: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Inclusive start date: YYYY-MM-DD
    #[arg(long = "from")]
    pub from_date: Option<String>,
    /// Inclusive end date: YYYY-MM-DD
    #[arg(long = "to")]
    pub to_date: Option<String>,
    #[arg(long = "min", allow_hyphen_values = true)]
    pub min_amount: Option<f64>,
    #[arg(long = "max", allow_hyphen_values = true)]
    pub max_amount: Option<f64>,
    #[arg(long)]
    pub account: Option<String>,
    /// Only pending transactions
    #[arg(long, conflicts_with = "posted")]
    pub pending: bool,
    /// Only posted transactions
    #[arg(long)]
    pub posted: bool,
    /// Tag, or category when untagged
    #[arg(long)]
    pub tag: Option<String>,
    #[arg(long)]
    pub limit: Option<usize>,
}

impl From<FilterArgs> for TransactionFilter {
    fn from(args: FilterArgs) -> Self {
        let pending = match (args.pending, args.posted) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        TransactionFilter {
            from_date: args.from_date,
            to_date: args.to_date,
            min_amount: args.min_amount,
            max_amount: args.max_amount,
            account_id: args.account,
            pending,
            tag: args.tag,
            limit: args.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Json,
    Table,
}

impl Output {
    pub fn from_flag(table: bool) -> Self {
        if table {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Print `value` as pretty JSON, or the table built from it.
pub(crate) fn emit<T: Serialize>(output: Output, value: &T, table: impl FnOnce(&T) -> Table) -> Result<()> {
    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Output::Table => println!("{}", table(value)),
    }
    Ok(())
}

/// Open the ledger named by the saved settings.
pub(crate) fn open_ledger() -> Result<Ledger> {
    let db_path = load_settings()?.db_path();
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    Ledger::open(&db_path)
}
