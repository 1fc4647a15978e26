//! Category operations

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Category, DEFAULT_CATEGORIES};
use crate::validate::validate_category;

impl Database {
    /// Seed the built-in categories (idempotent - skips existing names)
    ///
    /// Returns how many were added.
    pub fn seed_default_categories(&self) -> Result<usize> {
        let conn = self.conn()?;
        let mut added = 0;

        for (name, color, icon) in DEFAULT_CATEGORIES.iter() {
            added += conn.execute(
                r#"
                INSERT OR IGNORE INTO categories (name, color, icon, is_default)
                VALUES (?, ?, ?, 1)
                "#,
                params![name, color, icon],
            )?;
        }

        if added > 0 {
            info!(added, "Seeded default categories");
        }
        Ok(added)
    }

    fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
        let is_default: i64 = row.get(4)?;
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            icon: row.get(3)?,
            is_default: is_default != 0,
        })
    }

    /// Defaults first, then user categories, alphabetically
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, color, icon, is_default FROM categories ORDER BY is_default DESC, name",
        )?;

        let categories = stmt
            .query_map([], |row| Self::row_to_category(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    pub fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name, color, icon, is_default FROM categories WHERE name = ? COLLATE NOCASE",
                params![name.trim()],
                |row| Self::row_to_category(row),
            )
            .optional()?;
        Ok(category)
    }

    /// Add a user category after validating its name and color
    pub fn add_category(&self, name: &str, color: &str, icon: Option<&str>) -> Result<i64> {
        let validation = validate_category(name, color);
        if !validation.is_valid {
            return Err(Error::InvalidData(validation.message()));
        }

        let name = name.trim();
        if self.get_category_by_name(name)?.is_some() {
            return Err(Error::InvalidData(format!("Category '{}' already exists", name)));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (name, color, icon, is_default) VALUES (?, ?, ?, 0)",
            params![name, color, icon],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Delete a user category
    ///
    /// Default categories and categories still assigned to transactions are refused.
    pub fn delete_category(&self, name: &str) -> Result<()> {
        let category = self
            .get_category_by_name(name)?
            .ok_or_else(|| Error::NotFound(format!("Category '{}'", name)))?;

        if !crate::validate::can_delete_category(&category) {
            return Err(Error::InvalidData(format!(
                "Category '{}' is a default category and cannot be deleted",
                category.name
            )));
        }

        let conn = self.conn()?;
        let in_use: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE category = ? COLLATE NOCASE",
            params![category.name],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            return Err(Error::InvalidData(format!(
                "Category '{}' is used by {} transaction(s)",
                category.name, in_use
            )));
        }

        conn.execute("DELETE FROM categories WHERE id = ?", params![category.id])?;
        Ok(())
    }
}
