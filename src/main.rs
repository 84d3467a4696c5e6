mod budgets;
mod categorizer;
mod cli;
mod dates;
mod db;
mod error;
mod export;
mod fmt;
mod models;
mod provider;
mod reconciler;
mod reports;
mod responses;
mod search;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{BudgetsCommands, Cli, Commands, ItemsCommands, Output, RulesCommands};

/// RUST_LOG wins, then --verbose, then the saved log level.
/// An unreadable settings file falls back to warn here; the command itself
/// reports it.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose {
            "debug".to_string()
        } else {
            settings::load_settings()
                .map(|s| s.log_level)
                .unwrap_or_else(|_| "warn".to_string())
        };
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = Output::from_flag(cli.table);

    let result = match cli.command {
        Commands::Init {
            data_dir,
            client_id,
            secret,
            environment,
            base_url,
        } => cli::init::run(data_dir, client_id, secret, environment, base_url),
        Commands::Items { command } => match command {
            ItemsCommands::Add {
                item_id,
                access_token,
                institution,
            } => cli::items::add(&item_id, &access_token, institution.as_deref()),
            ItemsCommands::List => cli::items::list(output),
            ItemsCommands::Remove { item_id } => cli::items::remove(&item_id, output),
        },
        Commands::Sync { item, full } => cli::sync::run(item.as_deref(), full, output),
        Commands::Accounts => cli::accounts::list(output),
        Commands::Transactions { filter } => cli::transactions::list(filter, output),
        Commands::Search { query, limit } => cli::transactions::search(&query, limit, output),
        Commands::Grep { pattern, filter } => cli::transactions::grep(&pattern, filter, output),
        Commands::Rules { command } => match command {
            RulesCommands::Add {
                pattern,
                tag,
                priority,
            } => cli::rules::add(&pattern, &tag, priority),
            RulesCommands::List => cli::rules::list(output),
            RulesCommands::Delete { id } => cli::rules::delete(id),
            RulesCommands::Apply => cli::rules::apply(),
        },
        Commands::Tag {
            transaction_id,
            tag,
            clear: _,
        } => cli::transactions::tag(&transaction_id, tag.as_deref(), output),
        Commands::Budgets { command } => match command {
            BudgetsCommands::Set {
                tag,
                limit,
                threshold,
            } => cli::budgets::set(&tag, limit, threshold),
            BudgetsCommands::List => cli::budgets::list(output),
            BudgetsCommands::Delete { tag } => cli::budgets::delete(&tag),
            BudgetsCommands::Status { month } => cli::budgets::status(month, output),
            BudgetsCommands::Alerts { month } => cli::budgets::alerts(month, output),
        },
        Commands::Split { from_date, to_date } => {
            cli::report::split(from_date.as_deref(), to_date.as_deref(), output)
        }
        Commands::Burn { months } => cli::report::burn(months, output),
        Commands::Net { months } => cli::report::net(months, output),
        Commands::Snapshot => cli::report::snapshot(output),
        Commands::Export { filter, output } => cli::export::run(filter, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
