//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_config` - Shared utility to load the pipeline config
//! - `cmd_init` - Initialize the database
//! - `cmd_config` - Print the effective config

use std::path::Path;

use anyhow::{Context, Result};
use smsledger_core::config::default_config_path;
use smsledger_core::{db::Database, PipelineConfig};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Load the pipeline config from --config, else the user override, else defaults
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::load_from(p)
            .with_context(|| format!("Failed to load config: {}", p.display())),
        None => PipelineConfig::load().context("Failed to load config"),
    }
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;

    let categories = db.list_categories().context("Failed to list categories")?;
    println!("   {} categories available", categories.len());

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Preview an export: smsledger scan --file inbox.csv");
    println!("  2. Import it: smsledger import --file inbox.csv");

    Ok(())
}

pub fn cmd_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;

    let source = match path {
        Some(p) => p.display().to_string(),
        None => match default_config_path() {
            Some(p) if p.exists() => p.display().to_string(),
            _ => "built-in defaults".to_string(),
        },
    };

    println!();
    println!("⚙️  Pipeline Configuration ({})", source);
    println!("   ─────────────────────────────");
    println!(
        "   Duplicate window:     {} ms (effective {} ms)",
        config.duplicate_window_ms,
        config.window_ms()
    );
    println!("   Similarity threshold: {:.2}", config.similarity_threshold);
    println!("   Amount tolerance:     {:.2}", config.amount_tolerance);
    println!(
        "   High confidence:      {:.2}",
        config.high_confidence_threshold
    );
    println!("   Amount cap:           ₹{:.2}", config.amount_cap);

    Ok(())
}
