//! smsledger CLI - Financial SMS ledger
//!
//! Usage:
//!   smsledger init                      Initialize database
//!   smsledger scan --file inbox.csv     Report what an export contains
//!   smsledger import --file inbox.csv   Store new transactions
//!   smsledger transactions              List recent transactions

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Scan { source, json } => {
            let config = commands::load_config(config_path)?;
            commands::cmd_scan(&source, &config, json)
        }
        Commands::Import { source, no_dedupe } => {
            let config = commands::load_config(config_path)?;
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, &source, &config, no_dedupe)
        }
        Commands::Transactions { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_transactions_list(&db, 20),
                Some(TransactionsAction::List { limit }) => {
                    commands::cmd_transactions_list(&db, limit)
                }
                Some(TransactionsAction::Uncategorized { limit }) => {
                    commands::cmd_transactions_uncategorized(&db, limit)
                }
                Some(TransactionsAction::Categorize {
                    id,
                    category,
                    notes,
                }) => commands::cmd_transactions_categorize(&db, id, &category, notes.as_deref()),
            }
        }
        Commands::Categories { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(CategoriesAction::List) => commands::cmd_categories_list(&db),
                Some(CategoriesAction::Add { name, color, icon }) => {
                    commands::cmd_categories_add(&db, &name, &color, icon.as_deref())
                }
                Some(CategoriesAction::Delete { name }) => {
                    commands::cmd_categories_delete(&db, &name)
                }
            }
        }
        Commands::Config => commands::cmd_config(config_path),
    }
}
