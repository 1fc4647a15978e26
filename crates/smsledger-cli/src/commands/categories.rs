//! Category command implementations

use anyhow::{Context, Result};
use smsledger_core::db::Database;

pub fn cmd_categories_list(db: &Database) -> Result<()> {
    let categories = db.list_categories()?;

    println!();
    println!("🏷️  Categories");
    println!("   ─────────────────────────────");

    for category in &categories {
        let marker = if category.is_default { "" } else { " (custom)" };
        println!(
            "   {} {:<20} {}{}",
            category.color,
            category.name,
            category.icon.as_deref().unwrap_or(""),
            marker
        );
    }

    Ok(())
}

pub fn cmd_categories_add(db: &Database, name: &str, color: &str, icon: Option<&str>) -> Result<()> {
    let id = db
        .add_category(name, color, icon)
        .with_context(|| format!("Failed to add category '{}'", name))?;

    println!("✅ Added category '{}' (id {})", name.trim(), id);
    Ok(())
}

pub fn cmd_categories_delete(db: &Database, name: &str) -> Result<()> {
    db.delete_category(name)
        .with_context(|| format!("Failed to delete category '{}'", name))?;

    println!("✅ Deleted category '{}'", name);
    Ok(())
}
