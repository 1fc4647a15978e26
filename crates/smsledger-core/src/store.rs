//! Transaction store seam
//!
//! The pipeline only needs three operations from persistence: a point lookup
//! for cross-store duplicate detection, single insert and batch insert.
//! `db::Database` is the SQLite implementation; `MemoryStore` keeps
//! everything in a `Vec` for tests and dry runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Utc;

use crate::error::{Error, Result};
use crate::models::{ParsedTransaction, PersistedTransaction};

/// Amounts closer than this are the same amount for store lookups
pub const AMOUNT_EPSILON: f64 = 0.01;

pub trait TransactionStore {
    /// Any stored transaction with the same amount, the same recipient or
    /// merchant (case-insensitive) and a timestamp within `window_ms`.
    /// The closest in time wins.
    fn find_potential_duplicate(
        &self,
        amount: f64,
        recipient: Option<&str>,
        merchant_name: Option<&str>,
        date_time: i64,
        window_ms: i64,
    ) -> Result<Option<PersistedTransaction>>;

    /// Store one validated transaction and return its id
    fn insert(&self, parsed: &ParsedTransaction) -> Result<i64>;

    /// Store several transactions, returning the ids of the rows written
    fn batch_insert(&self, parsed: &[ParsedTransaction]) -> Result<Vec<i64>> {
        parsed.iter().map(|p| self.insert(p)).collect()
    }
}

fn eq_ignore_case(stored: Option<&str>, wanted: Option<&str>) -> bool {
    match (stored, wanted) {
        (Some(s), Some(w)) => s.eq_ignore_ascii_case(w),
        _ => false,
    }
}

/// Counterparty rule shared by every store implementation
pub fn counterparty_matches(
    tx: &PersistedTransaction,
    recipient: Option<&str>,
    merchant_name: Option<&str>,
) -> bool {
    eq_ignore_case(tx.recipient.as_deref(), recipient)
        || eq_ignore_case(tx.merchant_name.as_deref(), merchant_name)
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    transactions: Mutex<Vec<PersistedTransaction>>,
    fail_lookups: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with already persisted rows
    pub fn with_transactions(transactions: Vec<PersistedTransaction>) -> Self {
        Self {
            transactions: Mutex::new(transactions),
            fail_lookups: AtomicBool::new(false),
        }
    }

    /// Make every subsequent lookup fail, to exercise error propagation
    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn transactions(&self) -> Result<Vec<PersistedTransaction>> {
        Ok(self.lock()?.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|txs| txs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<PersistedTransaction>>> {
        self.transactions
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".into()))
    }
}

impl TransactionStore for MemoryStore {
    fn find_potential_duplicate(
        &self,
        amount: f64,
        recipient: Option<&str>,
        merchant_name: Option<&str>,
        date_time: i64,
        window_ms: i64,
    ) -> Result<Option<PersistedTransaction>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::Store("lookup failed".into()));
        }

        let txs = self.lock()?;
        Ok(txs
            .iter()
            .filter(|tx| (tx.amount - amount).abs() < AMOUNT_EPSILON)
            .filter(|tx| counterparty_matches(tx, recipient, merchant_name))
            .filter(|tx| tx.date_time.abs_diff(date_time) <= window_ms.max(0) as u64)
            .min_by_key(|tx| tx.date_time.abs_diff(date_time))
            .cloned())
    }

    fn insert(&self, parsed: &ParsedTransaction) -> Result<i64> {
        let mut txs = self.lock()?;
        let id = txs.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let now = Utc::now();
        txs.push(PersistedTransaction {
            id,
            amount: parsed.amount,
            recipient: parsed.recipient.clone(),
            merchant_name: parsed.merchant_name.clone(),
            date_time: parsed.date_time,
            transaction_id: parsed.transaction_id.clone(),
            payment_method: parsed.payment_method,
            category: None,
            notes: None,
            categorized: false,
            sms_content: parsed.sms_content.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }
}
