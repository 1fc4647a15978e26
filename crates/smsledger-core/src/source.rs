//! Message sources
//!
//! A source yields raw SMS on demand and honours a `MessageQuery`. Sources
//! are provided for in-memory batches and for JSON and CSV inbox exports.
//!
//! CSV exports use the header row to find columns. Both our own column names
//! (`id,sender,body,received_at,folder,read`) and the names used by Android
//! SMS backups (`_id,address,body,date,type,read`) are accepted.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::classify::{filter_by_date_range, filter_by_senders, inbox_only, is_transaction_message, sort_by_date_desc};
use crate::error::{Error, Result};
use crate::models::{MessageFolder, RawMessage};

/// Selection predicates a source is asked to honour
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageQuery {
    /// Only messages the classifier accepts
    pub financial_only: bool,
    /// Inclusive `[start_ms, end_ms]`
    pub date_range: Option<(i64, i64)>,
    /// Sender substrings; empty means any sender
    pub senders: Vec<String>,
    /// Most recent N after the other filters
    pub limit: Option<usize>,
}

impl MessageQuery {
    pub fn financial() -> Self {
        Self {
            financial_only: true,
            ..Self::default()
        }
    }

    pub fn with_date_range(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.date_range = Some((start_ms, end_ms));
        self
    }

    pub fn with_senders(mut self, senders: Vec<String>) -> Self {
        self.senders = senders;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Apply a query to an already loaded batch.
///
/// Only inbox messages are kept. When a limit is set the result is the most
/// recent messages, newest first.
pub fn apply_query(messages: Vec<RawMessage>, query: &MessageQuery) -> Vec<RawMessage> {
    let mut messages = inbox_only(messages);

    if let Some((start, end)) = query.date_range {
        messages = filter_by_date_range(messages, start, end);
    }
    if !query.senders.is_empty() {
        messages = filter_by_senders(messages, &query.senders);
    }
    if query.financial_only {
        messages.retain(is_transaction_message);
    }
    if let Some(limit) = query.limit {
        messages = sort_by_date_desc(messages);
        messages.truncate(limit);
    }
    messages
}

pub trait MessageSource {
    fn messages(&self, query: &MessageQuery) -> Result<Vec<RawMessage>>;
}

/// Messages held in memory
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    messages: Vec<RawMessage>,
}

impl VecSource {
    pub fn new(messages: Vec<RawMessage>) -> Self {
        Self { messages }
    }

    /// Add a message delivered by a push callback
    pub fn push(&mut self, sender: &str, body: &str) -> &RawMessage {
        self.messages.push(RawMessage::from_push(sender, body));
        let last = self.messages.len() - 1;
        &self.messages[last]
    }
}

impl MessageSource for VecSource {
    fn messages(&self, query: &MessageQuery) -> Result<Vec<RawMessage>> {
        Ok(apply_query(self.messages.clone(), query))
    }
}

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    Json,
    Csv,
}

impl MessageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl std::str::FromStr for MessageFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown message format: {}", s)),
        }
    }
}

impl std::fmt::Display for MessageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An exported inbox on disk, read afresh on every query
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: MessageFormat,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, format: MessageFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Format taken from the file extension
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = MessageFormat::from_path(&path).ok_or_else(|| {
            Error::UnsupportedFormat(format!(
                "cannot infer format of {}, expected .json or .csv",
                path.display()
            ))
        })?;
        Ok(Self::new(path, format))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> MessageFormat {
        self.format
    }
}

impl MessageSource for FileSource {
    fn messages(&self, query: &MessageQuery) -> Result<Vec<RawMessage>> {
        let messages = load_messages(&self.path, self.format)?;
        Ok(apply_query(messages, query))
    }
}

/// Read every message from an export file
pub fn load_messages(path: &Path, format: MessageFormat) -> Result<Vec<RawMessage>> {
    let reader = BufReader::new(File::open(path)?);
    let messages = match format {
        MessageFormat::Json => parse_json_messages(reader)?,
        MessageFormat::Csv => parse_csv_messages(reader)?,
    };
    debug!(path = %path.display(), format = %format, count = messages.len(), "Loaded messages");
    Ok(messages)
}

/// A JSON array of messages
pub fn parse_json_messages<R: Read>(reader: R) -> Result<Vec<RawMessage>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Column positions resolved from the header row
struct Columns {
    id: Option<usize>,
    sender: usize,
    body: usize,
    received_at: usize,
    folder: Option<usize>,
    read: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| Error::InvalidData(format!("Missing column: {}", names[0])))
        };

        Ok(Self {
            id: find(&["id", "_id"]),
            sender: require(&["sender", "address"])?,
            body: require(&["body"])?,
            received_at: require(&["received_at", "date", "timestamp"])?,
            folder: find(&["folder", "type"]),
            read: find(&["read"]),
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

/// CSV export with a header row
pub fn parse_csv_messages<R: Read>(reader: R) -> Result<Vec<RawMessage>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = Columns::resolve(&headers)?;
    let mut messages = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let line = row + 2;

        let received_at = record
            .get(columns.received_at)
            .map(str::trim)
            .ok_or_else(|| Error::InvalidData(format!("Line {}: missing timestamp", line)))?
            .parse::<i64>()
            .map_err(|e| Error::InvalidData(format!("Line {}: invalid timestamp: {}", line, e)))?;

        let id = match columns.id.and_then(|i| record.get(i)) {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<i64>()
                .map_err(|e| Error::InvalidData(format!("Line {}: invalid id: {}", line, e)))?,
            _ => row as i64 + 1,
        };

        let folder = match columns.folder.and_then(|i| record.get(i)) {
            Some(raw) if !raw.trim().is_empty() => raw
                .parse::<MessageFolder>()
                .map_err(|e| Error::InvalidData(format!("Line {}: {}", line, e)))?,
            _ => MessageFolder::Inbox,
        };

        messages.push(RawMessage {
            id,
            sender: record.get(columns.sender).unwrap_or_default().trim().to_string(),
            body: record.get(columns.body).unwrap_or_default().to_string(),
            received_at,
            folder,
            read: columns
                .read
                .and_then(|i| record.get(i))
                .map(parse_flag)
                .unwrap_or(false),
        });
    }

    Ok(messages)
}
