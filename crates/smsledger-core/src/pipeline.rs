//! SMS ingestion pipeline
//!
//! classify → route/extract → validity gate → batch dedupe → store dedupe → insert
//!
//! Every stage is a plain function of its inputs. Batch entry points accept an
//! optional `CancellationToken` that is checked between messages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::classify::is_transaction_message;
use crate::config::PipelineConfig;
use crate::dedupe::{DuplicateDetector, DuplicateSummary};
use crate::error::{Error, Result};
use crate::issuer::route;
use crate::models::{ParsedTransaction, RawMessage};
use crate::source::{MessageQuery, MessageSource};
use crate::store::TransactionStore;
use crate::validate::validate_transaction;

/// Cooperative cancellation flag shared between a caller and a running batch
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn check_cancelled(cancel: Option<&CancellationToken>, processed: usize) -> Result<()> {
    if cancel.is_some_and(CancellationToken::is_cancelled) {
        info!(processed, "Batch cancelled");
        return Err(Error::Cancelled { processed });
    }
    Ok(())
}

/// What happened to a single message
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Not an inbox message, or not a financial transaction
    NotTransaction,
    /// Classified as a transaction but no amount could be extracted
    NoAmount,
    /// Extracted, but failed the validity gate
    Discarded {
        transaction: ParsedTransaction,
        errors: Vec<String>,
    },
    Parsed(ParsedTransaction),
}

impl ParseOutcome {
    pub fn into_transaction(self) -> Option<ParsedTransaction> {
        match self {
            Self::Parsed(t) => Some(t),
            _ => None,
        }
    }
}

/// Classify, extract and validate one message
pub fn parse_message_outcome(message: &RawMessage, config: &PipelineConfig) -> ParseOutcome {
    if !message.is_inbox() || !is_transaction_message(message) {
        return ParseOutcome::NotTransaction;
    }

    let Some(parsed) = route(message) else {
        debug!(id = message.id, sender = %message.sender, "No amount found, skipping");
        return ParseOutcome::NoAmount;
    };

    let validation = validate_transaction(&parsed, config);
    if !validation.is_valid {
        debug!(id = message.id, errors = %validation.message(), "Discarding invalid transaction");
        return ParseOutcome::Discarded {
            transaction: parsed,
            errors: validation.errors,
        };
    }

    ParseOutcome::Parsed(parsed)
}

/// A valid transaction, or `None` for anything that is not one
pub fn parse_message(message: &RawMessage, config: &PipelineConfig) -> Option<ParsedTransaction> {
    parse_message_outcome(message, config).into_transaction()
}

/// Lazily parse a sequence of messages, yielding only valid transactions
pub fn parse_iter<'a, I>(messages: I, config: &'a PipelineConfig) -> impl Iterator<Item = ParsedTransaction> + 'a
where
    I: IntoIterator<Item = RawMessage> + 'a,
    I::IntoIter: 'a,
{
    messages
        .into_iter()
        .filter_map(move |m| parse_message(&m, config))
}

/// Counters for a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub total_in: usize,
    /// Not a transaction, or no amount
    pub skipped: usize,
    /// Passed the validity gate
    pub parsed_out: usize,
    /// Extracted but invalid
    pub discarded: usize,
    /// Collapsed within the batch
    pub batch_duplicates: usize,
    /// Already in the store
    pub store_duplicates: usize,
    pub inserted: usize,
}

impl IngestReport {
    pub fn duplicates(&self) -> usize {
        self.batch_duplicates + self.store_duplicates
    }
}

/// Valid transactions from a batch and how the rest were accounted for
#[derive(Debug, Clone, Default)]
pub struct ParseBatch {
    pub transactions: Vec<ParsedTransaction>,
    pub report: IngestReport,
}

/// Parse a batch eagerly, counting skips and discards
pub fn parse_messages(
    messages: &[RawMessage],
    config: &PipelineConfig,
    cancel: Option<&CancellationToken>,
) -> Result<ParseBatch> {
    let mut batch = ParseBatch::default();
    batch.report.total_in = messages.len();

    for (processed, message) in messages.iter().enumerate() {
        check_cancelled(cancel, processed)?;
        match parse_message_outcome(message, config) {
            ParseOutcome::NotTransaction | ParseOutcome::NoAmount => batch.report.skipped += 1,
            ParseOutcome::Discarded { .. } => batch.report.discarded += 1,
            ParseOutcome::Parsed(t) => batch.transactions.push(t),
        }
    }

    batch.report.parsed_out = batch.transactions.len();
    Ok(batch)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Run batch and store duplicate detection
    pub check_duplicates: bool,
    /// Report what would be stored without writing
    pub dry_run: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            check_duplicates: true,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestResult {
    pub report: IngestReport,
    /// Store duplicate split of the batch-deduplicated transactions
    pub summary: DuplicateSummary,
    /// Ids of rows written (empty on a dry run)
    pub inserted_ids: Vec<i64>,
}

/// Run the whole pipeline over a batch and store the unique transactions.
///
/// Store failures abort the batch and are returned to the caller.
pub fn ingest<S: TransactionStore + ?Sized>(
    messages: &[RawMessage],
    store: &S,
    config: &PipelineConfig,
    options: &IngestOptions,
    cancel: Option<&CancellationToken>,
) -> Result<IngestResult> {
    let ParseBatch {
        transactions,
        mut report,
    } = parse_messages(messages, config, cancel)?;

    let detector = DuplicateDetector::new(config);

    let summary = if options.check_duplicates {
        let unique = detector.remove_duplicates(transactions);
        report.batch_duplicates = report.parsed_out - unique.len();
        let summary = detector.analyze(&unique, store, cancel)?;
        report.store_duplicates = summary.duplicate_count();
        summary
    } else {
        DuplicateSummary {
            total: transactions.len(),
            unique: transactions,
            ..DuplicateSummary::default()
        }
    };

    let inserted_ids = if options.dry_run || summary.unique.is_empty() {
        Vec::new()
    } else {
        check_cancelled(cancel, messages.len())?;
        store.batch_insert(&summary.unique)?
    };
    report.inserted = inserted_ids.len();

    info!(
        total = report.total_in,
        parsed = report.parsed_out,
        skipped = report.skipped,
        discarded = report.discarded,
        duplicates = report.duplicates(),
        inserted = report.inserted,
        dry_run = options.dry_run,
        "Ingest complete"
    );

    Ok(IngestResult {
        report,
        summary,
        inserted_ids,
    })
}

/// Pull messages from a source, then `ingest` them
pub fn ingest_from<M, S>(
    source: &M,
    query: &MessageQuery,
    store: &S,
    config: &PipelineConfig,
    options: &IngestOptions,
    cancel: Option<&CancellationToken>,
) -> Result<IngestResult>
where
    M: MessageSource + ?Sized,
    S: TransactionStore + ?Sized,
{
    let messages = source.messages(query)?;
    ingest(&messages, store, config, options, cancel)
}
