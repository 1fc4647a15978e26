//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// smsledger - Turn bank and payment SMS into a transaction ledger
#[derive(Parser)]
#[command(name = "smsledger")]
#[command(about = "Financial SMS parser and transaction ledger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "smsledger.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended: SMS bodies are stored)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SMSLEDGER_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Pipeline config file (defaults to the user override, then built-in values)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which messages to read from an export
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Exported inbox (.json or .csv)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Export format: json, csv (inferred from the extension if not specified)
    #[arg(long)]
    pub format: Option<String>,

    /// Only messages the classifier accepts
    #[arg(long)]
    pub financial_only: bool,

    /// Only the N most recent messages
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Earliest day to include (YYYY-MM-DD, UTC)
    #[arg(long)]
    pub since: Option<String>,

    /// Last day to include (YYYY-MM-DD, UTC)
    #[arg(long)]
    pub until: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Parse an export and report what would be imported (writes nothing)
    Scan {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the parsed transactions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse an export and store the new transactions
    Import {
        #[command(flatten)]
        source: SourceArgs,

        /// Skip duplicate detection (exact re-imports are still ignored)
        #[arg(long)]
        no_dedupe: bool,
    },

    /// Manage transactions (list, uncategorized, categorize)
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Manage categories (list, add, delete)
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Print the effective pipeline configuration
    Config,
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List recent transactions
    List {
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// List transactions without a category
    Uncategorized {
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Assign a category to a transaction
    Categorize {
        /// Transaction ID
        id: i64,

        /// Category name (see `smsledger categories`)
        category: String,

        /// Free-form note
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List all categories
    List,

    /// Add a category
    Add {
        /// Category name (1-50 characters)
        name: String,

        /// Hex color, e.g. #4CAF50
        color: String,

        /// Icon name
        #[arg(long)]
        icon: Option<String>,
    },

    /// Delete a user category (defaults and categories in use are kept)
    Delete {
        /// Category name
        name: String,
    },
}
