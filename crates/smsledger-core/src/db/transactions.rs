//! Transaction operations

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{CategorySpending, NewTransaction, ParsedTransaction, PaymentMethod, PersistedTransaction};
use crate::store::{TransactionStore, AMOUNT_EPSILON};

const TRANSACTION_COLUMNS: &str = "id, amount, recipient, merchant_name, date_time, transaction_id, \
     payment_method, category, notes, is_categorized, sms_content, created_at, updated_at";

impl Database {
    /// Insert a transaction (skips exact re-imports based on sms_hash)
    ///
    /// Returns `None` when the same message was already stored.
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<Option<i64>> {
        let conn = self.conn()?;

        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO transactions
                (amount, recipient, merchant_name, date_time, transaction_id, payment_method,
                 sms_content, sender, confidence, sms_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.amount,
                tx.recipient,
                tx.merchant_name,
                tx.date_time,
                tx.transaction_id,
                tx.payment_method.as_str(),
                tx.sms_content,
                tx.sender,
                tx.confidence,
                tx.sms_hash,
            ],
        )?;

        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(conn.last_insert_rowid()))
    }

    /// Id of the row holding a given message fingerprint
    pub fn find_by_sms_hash(&self, sms_hash: &str) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM transactions WHERE sms_hash = ?",
                params![sms_hash],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Insert many transactions in one SQL transaction
    ///
    /// Records failing validation and messages already stored are skipped;
    /// the ids of rows actually written are returned.
    pub fn insert_transactions(&self, txs: &[NewTransaction]) -> Result<Vec<i64>> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(txs.len());

        {
            let mut stmt = db_tx.prepare(
                r#"
                INSERT OR IGNORE INTO transactions
                    (amount, recipient, merchant_name, date_time, transaction_id, payment_method,
                     sms_content, sender, confidence, sms_hash)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )?;

            for tx in txs {
                let inserted = stmt.execute(params![
                    tx.amount,
                    tx.recipient,
                    tx.merchant_name,
                    tx.date_time,
                    tx.transaction_id,
                    tx.payment_method.as_str(),
                    tx.sms_content,
                    tx.sender,
                    tx.confidence,
                    tx.sms_hash,
                ])?;
                if inserted == 0 {
                    debug!(sms_hash = %tx.sms_hash, "Message already stored, skipping");
                    continue;
                }
                ids.push(db_tx.last_insert_rowid());
            }
        }

        db_tx.commit()?;
        Ok(ids)
    }

    /// Helper to convert a row to PersistedTransaction
    /// Column order: see `TRANSACTION_COLUMNS`
    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<PersistedTransaction> {
        let payment_method_str: String = row.get(6)?;
        let categorized_int: i64 = row.get(9)?;
        let created_at_str: String = row.get(11)?;
        let updated_at_str: String = row.get(12)?;
        Ok(PersistedTransaction {
            id: row.get(0)?,
            amount: row.get(1)?,
            recipient: row.get(2)?,
            merchant_name: row.get(3)?,
            date_time: row.get(4)?,
            transaction_id: row.get(5)?,
            payment_method: payment_method_str.parse().unwrap_or(PaymentMethod::Other),
            category: row.get(7)?,
            notes: row.get(8)?,
            categorized: categorized_int != 0,
            sms_content: row.get(10)?,
            created_at: parse_datetime(&created_at_str),
            updated_at: parse_datetime(&updated_at_str),
        })
    }

    /// Closest-in-time stored transaction with the same amount and counterparty
    pub fn find_duplicate_candidate(
        &self,
        amount: f64,
        recipient: Option<&str>,
        merchant_name: Option<&str>,
        date_time: i64,
        window_ms: i64,
    ) -> Result<Option<PersistedTransaction>> {
        let conn = self.conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM transactions
            WHERE ABS(amount - ?1) < ?2
              AND (recipient = ?3 COLLATE NOCASE OR merchant_name = ?4 COLLATE NOCASE)
              AND ABS(date_time - ?5) <= ?6
            ORDER BY ABS(date_time - ?5)
            LIMIT 1
            "#,
            TRANSACTION_COLUMNS
        );

        let found = conn
            .query_row(
                &sql,
                params![amount, AMOUNT_EPSILON, recipient, merchant_name, date_time, window_ms],
                |row| Self::row_to_transaction(row),
            )
            .optional()?;
        Ok(found)
    }

    /// Count total transactions
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn count_uncategorized(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE is_categorized = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get a single transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<PersistedTransaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        ))?;

        let transaction = stmt
            .query_row(params![id], |row| Self::row_to_transaction(row))
            .optional()?;

        Ok(transaction)
    }

    /// List transactions, newest first
    pub fn list_transactions(&self, limit: i64, offset: i64) -> Result<Vec<PersistedTransaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY date_time DESC, id DESC LIMIT ? OFFSET ?",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![limit, offset], |row| Self::row_to_transaction(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Transactions still waiting for a category, newest first
    pub fn list_uncategorized(&self, limit: i64) -> Result<Vec<PersistedTransaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE is_categorized = 0 \
             ORDER BY date_time DESC, id DESC LIMIT ?",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![limit], |row| Self::row_to_transaction(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Assign a category (which must exist) and optional notes
    pub fn categorize_transaction(&self, id: i64, category: &str, notes: Option<&str>) -> Result<()> {
        let category = self
            .get_category_by_name(category)?
            .ok_or_else(|| Error::NotFound(format!("Category '{}'", category)))?;

        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE transactions
            SET category = ?, notes = ?, is_categorized = 1, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![category.name, notes, id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Transaction {}", id)));
        }
        Ok(())
    }

    pub fn uncategorize_transaction(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE transactions
            SET category = NULL, is_categorized = 0, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Transaction {}", id)));
        }
        Ok(())
    }

    /// Sum of amounts with `date_time` in `[start_ms, end_ms]`
    pub fn total_amount_between(&self, start_ms: i64, end_ms: i64) -> Result<f64> {
        let conn = self.conn()?;
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM transactions WHERE date_time BETWEEN ? AND ?",
            params![start_ms, end_ms],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Spending per category in `[start_ms, end_ms]`, largest first
    pub fn category_spending_between(&self, start_ms: i64, end_ms: i64) -> Result<Vec<CategorySpending>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT category, SUM(amount) AS total, COUNT(*) AS count
            FROM transactions
            WHERE date_time BETWEEN ? AND ?
            GROUP BY category
            ORDER BY total DESC
            "#,
        )?;

        let rows = stmt
            .query_map(params![start_ms, end_ms], |row| {
                Ok(CategorySpending {
                    category: row.get(0)?,
                    total: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

impl TransactionStore for Database {
    fn find_potential_duplicate(
        &self,
        amount: f64,
        recipient: Option<&str>,
        merchant_name: Option<&str>,
        date_time: i64,
        window_ms: i64,
    ) -> Result<Option<PersistedTransaction>> {
        self.find_duplicate_candidate(amount, recipient, merchant_name, date_time, window_ms)
    }

    /// Re-inserting an already stored message returns the existing id
    fn insert(&self, parsed: &ParsedTransaction) -> Result<i64> {
        let tx = NewTransaction::from(parsed);
        match self.insert_transaction(&tx)? {
            Some(id) => Ok(id),
            None => self
                .find_by_sms_hash(&tx.sms_hash)?
                .ok_or_else(|| Error::Store("stored message vanished during insert".into())),
        }
    }

    fn batch_insert(&self, parsed: &[ParsedTransaction]) -> Result<Vec<i64>> {
        let valid: Vec<NewTransaction> = parsed
            .iter()
            .filter(|p| p.is_valid())
            .map(NewTransaction::from)
            .collect();
        if valid.len() < parsed.len() {
            debug!(skipped = parsed.len() - valid.len(), "Skipping invalid transactions");
        }
        self.insert_transactions(&valid)
    }
}
