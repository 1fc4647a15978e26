//! smsledger Core Library
//!
//! Turns bank and payment-app SMS into structured transactions:
//! - Classification of messages as financial or not
//! - Issuer-specific templates with a generic fallback extractor
//! - Validation of derived records and category labels
//! - Duplicate detection within a batch and against stored history
//! - Message sources (JSON/CSV exports) and an encrypted SQLite store

pub mod classify;
pub mod config;
pub mod db;
pub mod dedupe;
pub mod error;
pub mod extract;
pub mod issuer;
pub mod models;
pub mod patterns;
pub mod pipeline;
pub mod similarity;
pub mod source;
pub mod store;
pub mod validate;

/// Message and transaction builders for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::PipelineConfig;
pub use db::Database;
pub use dedupe::{DuplicateCheck, DuplicateDetector, DuplicateSummary};
pub use error::{Error, Result};
pub use issuer::{route, IssuerKind};
pub use models::{
    Category, CategorySpending, MessageFolder, NewTransaction, ParsedTransaction, PaymentMethod,
    PersistedTransaction, RawMessage,
};
pub use pipeline::{
    ingest, ingest_from, parse_iter, parse_message, parse_messages, CancellationToken,
    IngestOptions, IngestReport, IngestResult, ParseOutcome,
};
pub use source::{FileSource, MessageFormat, MessageQuery, MessageSource, VecSource};
pub use store::{MemoryStore, TransactionStore};
pub use validate::ValidationResult;
