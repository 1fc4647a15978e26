//! Transaction command implementations

use anyhow::Result;
use chrono::{DateTime, Utc};
use smsledger_core::db::Database;
use smsledger_core::PersistedTransaction;

use super::truncate;

/// Message time as a UTC date and time
fn format_date_time(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn print_row(tx: &PersistedTransaction) {
    let category = tx.category.as_deref().unwrap_or("-");
    println!(
        "   [{}] {} │ {:>12} │ {:<18} │ {}",
        tx.id,
        format_date_time(tx.date_time),
        tx.formatted_amount(),
        truncate(category, 18),
        truncate(tx.short_description(), 35)
    );
}

pub fn cmd_transactions_list(db: &Database, limit: i64) -> Result<()> {
    let transactions = db.list_transactions(limit, 0)?;

    if transactions.is_empty() {
        println!("No transactions found. Import some with:");
        println!("  smsledger import --file inbox.csv");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in &transactions {
        print_row(tx);
    }

    Ok(())
}

pub fn cmd_transactions_uncategorized(db: &Database, limit: i64) -> Result<()> {
    let transactions = db.list_uncategorized(limit)?;

    if transactions.is_empty() {
        println!("✅ Every transaction has a category.");
        return Ok(());
    }

    let count = db.count_uncategorized()?;

    println!();
    println!("🏷️  Uncategorized Transactions ({} total)", count);
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in &transactions {
        print_row(tx);
    }

    println!();
    println!("   Use 'smsledger transactions categorize <id> <category>' to assign one.");

    Ok(())
}

pub fn cmd_transactions_categorize(
    db: &Database,
    id: i64,
    category: &str,
    notes: Option<&str>,
) -> Result<()> {
    // Verify transaction exists
    let tx = db
        .get_transaction(id)?
        .ok_or_else(|| anyhow::anyhow!("Transaction {} not found", id))?;

    if db.get_category_by_name(category)?.is_none() {
        anyhow::bail!(
            "Category '{}' not found. Run 'smsledger categories' to see the list.",
            category
        );
    }

    db.categorize_transaction(id, category, notes)?;

    println!("✅ Categorized transaction {} as {}:", id, category);
    println!(
        "   {} │ {} │ {}",
        format_date_time(tx.date_time),
        tx.formatted_amount(),
        truncate(tx.short_description(), 40)
    );

    Ok(())
}
