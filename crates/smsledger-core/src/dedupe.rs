//! Duplicate detection
//!
//! Two paths share the same comparison rules:
//! - intra-batch: collapse repeats among freshly parsed transactions
//! - cross-store: reject parsed transactions already held by a store
//!
//! Windows are always clamped to [1 minute, 30 minutes] before use.

use serde::Serialize;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::models::{ParsedTransaction, PersistedTransaction};
use crate::pipeline::CancellationToken;
use crate::similarity::similar_with_threshold;
use crate::store::TransactionStore;

const AMOUNT_WEIGHT: f64 = 0.40;
const COUNTERPARTY_WEIGHT: f64 = 0.30;
const SIMILAR_COUNTERPARTY_WEIGHT: f64 = 0.15;
const TIME_WEIGHT: f64 = 0.20;
const REFERENCE_WEIGHT: f64 = 0.10;

/// Result of checking one parsed transaction against a store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    pub matches: Vec<PersistedTransaction>,
    /// Best confidence over `matches`, 0.0 when there are none
    pub confidence: f64,
}

/// A parsed transaction and the stored rows it duplicates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateDetail {
    pub transaction: ParsedTransaction,
    pub matches: Vec<PersistedTransaction>,
    pub confidence: f64,
}

/// Batch result of cross-store duplicate detection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateSummary {
    pub total: usize,
    pub unique: Vec<ParsedTransaction>,
    pub duplicates: Vec<ParsedTransaction>,
    pub details: Vec<DuplicateDetail>,
}

impl DuplicateSummary {
    pub fn unique_count(&self) -> usize {
        self.unique.len()
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    pub fn duplicate_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.duplicate_count() as f64 / self.total as f64 * 100.0
        }
    }

    fn push(&mut self, transaction: ParsedTransaction, matches: Vec<PersistedTransaction>, confidence: f64) {
        self.total += 1;
        if matches.is_empty() {
            self.unique.push(transaction);
        } else {
            self.duplicates.push(transaction.clone());
            self.details.push(DuplicateDetail {
                transaction,
                matches,
                confidence,
            });
        }
    }
}

/// Duplicate detector configured with a window, amount tolerance and
/// similarity threshold
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    window_ms: i64,
    amount_tolerance: f64,
    similarity_threshold: f64,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl DuplicateDetector {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            window_ms: config.window_ms(),
            amount_tolerance: config.amount_tolerance,
            similarity_threshold: config.similarity_threshold,
        }
    }

    /// Default tolerances with a caller-supplied window (clamped)
    pub fn with_window(window_ms: i64) -> Self {
        Self::new(&PipelineConfig::default().with_window(window_ms))
    }

    /// The clamped window in use
    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    fn same_amount(&self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.amount_tolerance
    }

    fn within_window(&self, a: i64, b: i64) -> bool {
        a.abs_diff(b) <= self.window_ms as u64
    }

    fn identifiers_match(&self, a: &str, b: &str) -> bool {
        a.eq_ignore_ascii_case(b) || similar_with_threshold(a, b, self.similarity_threshold)
    }

    /// Same amount, within the window, and matching counterparties.
    ///
    /// Counterparties match when both are present and similar, or when both
    /// are absent.
    pub fn are_duplicates(&self, a: &ParsedTransaction, b: &ParsedTransaction) -> bool {
        if !self.same_amount(a.amount, b.amount) || !self.within_window(a.date_time, b.date_time) {
            return false;
        }
        match (a.primary_identifier(), b.primary_identifier()) {
            (Some(x), Some(y)) => self.identifiers_match(x, y),
            (None, None) => true,
            _ => false,
        }
    }

    /// Collapse duplicates, keeping the earliest occurrence by `date_time`.
    ///
    /// Output is ordered by `date_time`; ties keep input order.
    pub fn remove_duplicates(&self, transactions: Vec<ParsedTransaction>) -> Vec<ParsedTransaction> {
        let mut sorted = transactions;
        sorted.sort_by_key(|t| t.date_time);

        let mut unique: Vec<ParsedTransaction> = Vec::with_capacity(sorted.len());
        for candidate in sorted {
            if unique.iter().any(|kept| self.are_duplicates(&candidate, kept)) {
                debug!(
                    amount = candidate.amount,
                    description = candidate.short_description(),
                    "Dropping duplicate within batch"
                );
                continue;
            }
            unique.push(candidate);
        }
        unique
    }

    /// Whether a stored row looks like the same transaction as `parsed`.
    ///
    /// A parse without any counterparty matches on amount and time alone.
    pub fn matches_persisted(&self, parsed: &ParsedTransaction, existing: &PersistedTransaction) -> bool {
        if !self.same_amount(parsed.amount, existing.amount)
            || !self.within_window(parsed.date_time, existing.date_time)
        {
            return false;
        }
        match parsed.primary_identifier() {
            Some(id) => self.identifiers_match(id, existing.short_description()),
            None => true,
        }
    }

    /// Weighted likelihood in [0, 1] that `parsed` and `existing` are the same
    pub fn duplicate_confidence(&self, parsed: &ParsedTransaction, existing: &PersistedTransaction) -> f64 {
        let mut score = 0.0;

        if self.same_amount(parsed.amount, existing.amount) {
            score += AMOUNT_WEIGHT;
        }

        if let Some(id) = parsed.primary_identifier() {
            let stored = existing.short_description();
            if id.eq_ignore_ascii_case(stored) {
                score += COUNTERPARTY_WEIGHT;
            } else if similar_with_threshold(id, stored, self.similarity_threshold) {
                score += SIMILAR_COUNTERPARTY_WEIGHT;
            }
        }

        let delta = parsed.date_time.abs_diff(existing.date_time);
        if delta <= self.window_ms as u64 {
            score += TIME_WEIGHT * (1.0 - delta as f64 / self.window_ms as f64);
        }

        let same_reference = match (parsed.transaction_id.as_deref(), existing.transaction_id.as_deref()) {
            (Some(a), Some(b)) => !a.trim().is_empty() && a == b,
            _ => false,
        };
        if same_reference {
            score += REFERENCE_WEIGHT;
        }

        score.clamp(0.0, 1.0)
    }

    fn best_confidence(&self, parsed: &ParsedTransaction, matches: &[PersistedTransaction]) -> f64 {
        matches
            .iter()
            .map(|m| self.duplicate_confidence(parsed, m))
            .fold(0.0, f64::max)
    }

    // In-memory comparison against a slice of stored rows

    pub fn find_duplicates_in(
        &self,
        parsed: &ParsedTransaction,
        existing: &[PersistedTransaction],
    ) -> Vec<PersistedTransaction> {
        existing
            .iter()
            .filter(|e| self.matches_persisted(parsed, e))
            .cloned()
            .collect()
    }

    pub fn is_duplicate_in(&self, parsed: &ParsedTransaction, existing: &[PersistedTransaction]) -> bool {
        existing.iter().any(|e| self.matches_persisted(parsed, e))
    }

    pub fn summarize_against(
        &self,
        parsed: &[ParsedTransaction],
        existing: &[PersistedTransaction],
    ) -> DuplicateSummary {
        let mut summary = DuplicateSummary::default();
        for p in parsed {
            let matches = self.find_duplicates_in(p, existing);
            let confidence = self.best_confidence(p, &matches);
            summary.push(p.clone(), matches, confidence);
        }
        summary
    }

    // Store-backed comparison

    /// Ask the store for a potential duplicate and score it
    pub fn check<S: TransactionStore + ?Sized>(
        &self,
        parsed: &ParsedTransaction,
        store: &S,
    ) -> Result<DuplicateCheck> {
        let found = store.find_potential_duplicate(
            parsed.amount,
            parsed.recipient.as_deref(),
            parsed.merchant_name.as_deref(),
            parsed.date_time,
            self.window_ms,
        )?;

        let matches: Vec<PersistedTransaction> = found.into_iter().collect();
        let confidence = self.best_confidence(parsed, &matches);
        Ok(DuplicateCheck {
            is_duplicate: !matches.is_empty(),
            matches,
            confidence,
        })
    }

    pub fn is_duplicate<S: TransactionStore + ?Sized>(
        &self,
        parsed: &ParsedTransaction,
        store: &S,
    ) -> Result<bool> {
        Ok(self.check(parsed, store)?.is_duplicate)
    }

    pub fn find_potential_duplicates<S: TransactionStore + ?Sized>(
        &self,
        parsed: &ParsedTransaction,
        store: &S,
    ) -> Result<Vec<PersistedTransaction>> {
        Ok(self.check(parsed, store)?.matches)
    }

    /// 0.0 when the store has no candidate
    pub fn best_duplicate_confidence<S: TransactionStore + ?Sized>(
        &self,
        parsed: &ParsedTransaction,
        store: &S,
    ) -> Result<f64> {
        Ok(self.check(parsed, store)?.confidence)
    }

    /// Split a batch into unique and duplicate transactions.
    ///
    /// Checks `cancel` before each transaction; store errors abort the batch.
    pub fn analyze<S: TransactionStore + ?Sized>(
        &self,
        parsed: &[ParsedTransaction],
        store: &S,
        cancel: Option<&CancellationToken>,
    ) -> Result<DuplicateSummary> {
        let mut summary = DuplicateSummary::default();
        for (processed, p) in parsed.iter().enumerate() {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(Error::Cancelled { processed });
            }
            let check = self.check(p, store)?;
            if check.is_duplicate {
                debug!(
                    amount = p.amount,
                    description = p.short_description(),
                    confidence = check.confidence,
                    "Already stored"
                );
            }
            summary.push(p.clone(), check.matches, check.confidence);
        }
        Ok(summary)
    }

    /// Only the transactions with no stored duplicate
    pub fn filter_duplicates<S: TransactionStore + ?Sized>(
        &self,
        parsed: &[ParsedTransaction],
        store: &S,
    ) -> Result<Vec<ParsedTransaction>> {
        Ok(self.analyze(parsed, store, None)?.unique)
    }
}
