//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::path::{Path, PathBuf};

use clap::Parser;
use smsledger_core::db::Database;
use smsledger_core::PipelineConfig;
use tempfile::TempDir;

use crate::cli::{CategoriesAction, Cli, Commands, SourceArgs, TransactionsAction};
use crate::commands::{self, truncate};

const INBOX_CSV: &str = "\
_id,address,body,date,type,read
1,GPAY,\"₹150 paid to 9876543210 via UPI. UPI Ref: 123456789\",1704067200000,1,1
2,HDFCBK,\"Rs.500 debited from account ending 1234 at ZOMATO on 15-Jan-24\",1705312800000,1,0
3,AMAZON,\"Your OTP for login is 123456. Do not share with anyone.\",1705312900000,1,0
4,FRIEND,See you at 8,1705313000000,1,1
";

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

fn write_export(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn source_args(file: &Path) -> SourceArgs {
    SourceArgs {
        file: file.to_path_buf(),
        format: None,
        financial_only: false,
        limit: None,
        since: None,
        until: None,
    }
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_global_flags() {
    let cli = Cli::try_parse_from([
        "smsledger",
        "--db",
        "ledger.db",
        "--no-encrypt",
        "-v",
        "init",
    ])
    .unwrap();
    assert_eq!(cli.db, PathBuf::from("ledger.db"));
    assert!(cli.no_encrypt);
    assert!(cli.verbose);
    assert!(matches!(cli.command, Commands::Init));
}

#[test]
fn test_parse_scan_options() {
    let cli = Cli::try_parse_from([
        "smsledger",
        "scan",
        "--file",
        "inbox.csv",
        "--financial-only",
        "--limit",
        "50",
        "--since",
        "2024-01-01",
        "--json",
    ])
    .unwrap();

    match cli.command {
        Commands::Scan { source, json } => {
            assert_eq!(source.file, PathBuf::from("inbox.csv"));
            assert!(source.financial_only);
            assert_eq!(source.limit, Some(50));
            assert_eq!(source.since.as_deref(), Some("2024-01-01"));
            assert!(json);
        }
        _ => panic!("expected scan"),
    }
}

#[test]
fn test_parse_subcommand_actions() {
    let cli = Cli::try_parse_from([
        "smsledger",
        "transactions",
        "categorize",
        "7",
        "Shopping",
        "--notes",
        "gift",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Transactions {
            action: Some(TransactionsAction::Categorize { id: 7, .. })
        }
    ));

    let cli = Cli::try_parse_from(["smsledger", "categories", "add", "Pets", "#ABC"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Categories {
            action: Some(CategoriesAction::Add { .. })
        }
    ));

    assert!(Cli::try_parse_from(["smsledger", "import"]).is_err());
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("ZOMATO", 10), "ZOMATO");
    assert_eq!(truncate("ZOMATO INDIA PRIVATE", 10), "ZOMATO ...");
    // Multi-byte characters are never split
    assert_eq!(truncate("₹₹₹₹₹₹₹₹", 5), "₹₹...");
}

#[test]
fn test_date_range() {
    assert_eq!(commands::date_range(None, None).unwrap(), None);

    let (start, end) = commands::date_range(Some("2024-01-01"), Some("2024-01-01"))
        .unwrap()
        .unwrap();
    assert_eq!(start, 1_704_067_200_000);
    assert_eq!(end, 1_704_067_200_000 + 86_400_000 - 1);

    let (start, end) = commands::date_range(Some("2024-01-15"), None)
        .unwrap()
        .unwrap();
    assert_eq!(start, 1_705_276_800_000);
    assert_eq!(end, i64::MAX);

    assert!(commands::date_range(Some("15/01/2024"), None).is_err());
    assert!(commands::date_range(Some("2024-02-01"), Some("2024-01-01")).is_err());
}

#[test]
fn test_build_source_format_override() {
    let dir = TempDir::new().unwrap();
    let path = write_export(&dir, "inbox.txt", INBOX_CSV);

    // No extension to infer from
    assert!(commands::build_source(&source_args(&path)).is_err());

    let mut args = source_args(&path);
    args.format = Some("csv".to_string());
    args.financial_only = true;
    args.limit = Some(2);
    let (source, query) = commands::build_source(&args).unwrap();
    assert_eq!(source.format(), smsledger_core::MessageFormat::Csv);
    assert!(query.financial_only);
    assert_eq!(query.limit, Some(2));

    args.format = Some("xml".to_string());
    assert!(commands::build_source(&args).is_err());
}

// ========== Core Command Tests ==========

#[test]
fn test_cmd_init() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("ledger.db");
    commands::cmd_init(&db_path, true).unwrap();
    assert!(db_path.exists());
}

#[test]
fn test_load_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_export(&dir, "pipeline.toml", "[dedupe]\nwindow_ms = 10\n");

    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.duplicate_window_ms, 10);
    assert_eq!(config.window_ms(), 60_000);
    assert!(commands::cmd_config(Some(&path)).is_ok());

    let bad = write_export(&dir, "bad.toml", "[dedupe\n");
    assert!(commands::load_config(Some(&bad)).is_err());
}

// ========== Scan / Import Tests ==========

#[test]
fn test_cmd_scan() {
    let dir = TempDir::new().unwrap();
    let path = write_export(&dir, "inbox.csv", INBOX_CSV);
    let config = PipelineConfig::default();

    assert!(commands::cmd_scan(&source_args(&path), &config, false).is_ok());
    assert!(commands::cmd_scan(&source_args(&path), &config, true).is_ok());
}

#[test]
fn test_cmd_scan_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.csv");
    let result = commands::cmd_scan(&source_args(&path), &PipelineConfig::default(), false);
    assert!(result.is_err());
}

#[test]
fn test_cmd_import() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    let path = write_export(&dir, "inbox.csv", INBOX_CSV);
    let config = PipelineConfig::default();

    commands::cmd_import(&db, &source_args(&path), &config, false).unwrap();
    assert_eq!(db.count_transactions().unwrap(), 2);

    // Importing the same export again stores nothing
    commands::cmd_import(&db, &source_args(&path), &config, false).unwrap();
    assert_eq!(db.count_transactions().unwrap(), 2);

    // Exact re-imports are ignored even without duplicate detection
    commands::cmd_import(&db, &source_args(&path), &config, true).unwrap();
    assert_eq!(db.count_transactions().unwrap(), 2);
}

#[test]
fn test_cmd_import_date_range() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    let path = write_export(&dir, "inbox.csv", INBOX_CSV);

    let mut args = source_args(&path);
    args.since = Some("2024-01-15".to_string());
    commands::cmd_import(&db, &args, &PipelineConfig::default(), false).unwrap();

    let stored = db.list_transactions(10, 0).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].merchant_name.as_deref(), Some("ZOMATO"));
}

#[test]
fn test_cmd_import_json() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    let path = write_export(
        &dir,
        "inbox.json",
        r#"[
            {"id": 1, "address": "HDFC", "body": "INR 2000 spent on AMAZON using HDFC Credit Card ending 5678", "date": 1705312800000},
            {"id": 2, "sender": "MOM", "body": "Call me", "received_at": 1705312900000}
        ]"#,
    );

    commands::cmd_import(&db, &source_args(&path), &PipelineConfig::default(), false).unwrap();
    let stored = db.list_transactions(10, 0).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].merchant_name.as_deref(), Some("AMAZON"));
}

// ========== Transactions Command Tests ==========

#[test]
fn test_cmd_transactions_list_empty() {
    let db = setup_test_db();
    assert!(commands::cmd_transactions_list(&db, 20).is_ok());
    assert!(commands::cmd_transactions_uncategorized(&db, 20).is_ok());
}

#[test]
fn test_cmd_transactions_categorize() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    let path = write_export(&dir, "inbox.csv", INBOX_CSV);
    commands::cmd_import(&db, &source_args(&path), &PipelineConfig::default(), false).unwrap();

    let id = db.list_uncategorized(10).unwrap()[0].id;
    commands::cmd_transactions_categorize(&db, id, "Food & Dining", Some("dinner")).unwrap();

    let tx = db.get_transaction(id).unwrap().unwrap();
    assert!(tx.categorized);
    assert_eq!(tx.category.as_deref(), Some("Food & Dining"));
    assert_eq!(tx.notes.as_deref(), Some("dinner"));

    assert!(commands::cmd_transactions_list(&db, 20).is_ok());
    assert!(commands::cmd_transactions_uncategorized(&db, 20).is_ok());
}

#[test]
fn test_cmd_transactions_categorize_errors() {
    let db = setup_test_db();
    assert!(commands::cmd_transactions_categorize(&db, 999, "Shopping", None).is_err());

    let dir = TempDir::new().unwrap();
    let path = write_export(&dir, "inbox.csv", INBOX_CSV);
    commands::cmd_import(&db, &source_args(&path), &PipelineConfig::default(), false).unwrap();
    let id = db.list_transactions(1, 0).unwrap()[0].id;
    assert!(commands::cmd_transactions_categorize(&db, id, "Nonexistent", None).is_err());
}

// ========== Categories Command Tests ==========

#[test]
fn test_cmd_categories_list() {
    let db = setup_test_db();
    assert!(commands::cmd_categories_list(&db).is_ok());
}

#[test]
fn test_cmd_categories_add_and_delete() {
    let db = setup_test_db();

    commands::cmd_categories_add(&db, "Pets", "#A1B2C3", Some("pets")).unwrap();
    let pets = db.get_category_by_name("Pets").unwrap().unwrap();
    assert_eq!(pets.icon.as_deref(), Some("pets"));

    assert!(commands::cmd_categories_add(&db, "Pets", "#A1B2C3", None).is_err());
    assert!(commands::cmd_categories_add(&db, "Garden", "green", None).is_err());

    commands::cmd_categories_delete(&db, "Pets").unwrap();
    assert!(db.get_category_by_name("Pets").unwrap().is_none());
}

#[test]
fn test_cmd_categories_delete_default_refused() {
    let db = setup_test_db();
    assert!(commands::cmd_categories_delete(&db, "Other").is_err());
    assert!(db.get_category_by_name("Other").unwrap().is_some());
}
