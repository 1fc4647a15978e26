//! Scan and import command implementations

use anyhow::{Context, Result};
use chrono::NaiveDate;
use smsledger_core::{
    db::Database, ingest_from, FileSource, IngestOptions, IngestResult, MemoryStore,
    MessageFormat, MessageQuery, PipelineConfig,
};

use super::truncate;
use crate::cli::SourceArgs;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Parse a YYYY-MM-DD day into milliseconds at 00:00 UTC
fn day_start_ms(s: &str) -> Result<i64> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .with_context(|| format!("Invalid date '{}'", s))
}

/// Inclusive millisecond range for --since/--until
pub fn date_range(since: Option<&str>, until: Option<&str>) -> Result<Option<(i64, i64)>> {
    if since.is_none() && until.is_none() {
        return Ok(None);
    }

    let start = since.map(day_start_ms).transpose()?.unwrap_or(i64::MIN);
    let end = until
        .map(|u| day_start_ms(u).map(|ms| ms + MS_PER_DAY - 1))
        .transpose()?
        .unwrap_or(i64::MAX);

    if start > end {
        anyhow::bail!("--since must not be after --until");
    }
    Ok(Some((start, end)))
}

/// Resolve the export file and query from the command-line arguments
pub fn build_source(args: &SourceArgs) -> Result<(FileSource, MessageQuery)> {
    let source = match args.format.as_deref() {
        Some(f) => {
            let format: MessageFormat = f.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            FileSource::new(&args.file, format)
        }
        None => FileSource::open(&args.file)
            .with_context(|| format!("Failed to open {}", args.file.display()))?,
    };

    let mut query = MessageQuery {
        financial_only: args.financial_only,
        ..MessageQuery::default()
    };
    if let Some((start, end)) = date_range(args.since.as_deref(), args.until.as_deref())? {
        query = query.with_date_range(start, end);
    }
    if let Some(limit) = args.limit {
        query = query.with_limit(limit);
    }

    tracing::debug!(
        file = %args.file.display(),
        format = %source.format(),
        financial_only = query.financial_only,
        limit = ?query.limit,
        "Resolved message source"
    );
    Ok((source, query))
}

fn print_report(result: &IngestResult) {
    let report = &result.report;
    println!("   Messages read:        {}", report.total_in);
    println!("   Not transactions:     {}", report.skipped);
    println!("   Parsed:               {}", report.parsed_out);
    println!("   Discarded (invalid):  {}", report.discarded);
    println!("   Duplicates in batch:  {}", report.batch_duplicates);
    println!("   Already stored:       {}", report.store_duplicates);
}

/// Dry run: parse and dedupe an export without touching the database
pub fn cmd_scan(args: &SourceArgs, config: &PipelineConfig, json: bool) -> Result<()> {
    let (source, query) = build_source(args)?;

    let options = IngestOptions {
        dry_run: true,
        ..IngestOptions::default()
    };
    let result = ingest_from(&source, &query, &MemoryStore::new(), config, &options, None)
        .with_context(|| format!("Failed to scan {}", args.file.display()))?;
    tracing::debug!(
        parsed = result.report.parsed_out,
        unique = result.summary.unique.len(),
        "Scan finished"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result.summary.unique)?);
        return Ok(());
    }

    println!("🔍 Scanning {} ({})...", args.file.display(), source.format());
    println!();
    print_report(&result);

    if result.summary.unique.is_empty() {
        println!();
        println!("No transactions found.");
        return Ok(());
    }

    println!();
    println!("📝 Transactions");
    println!("   ─────────────────────────────────────────────────────────────");
    for tx in &result.summary.unique {
        let flag = if tx.is_high_confidence_at(config.high_confidence_threshold) {
            " "
        } else {
            "?"
        };
        println!(
            "  {}{:>12} │ {:<12} │ {}",
            flag,
            format!("₹{:.2}", tx.amount),
            tx.payment_method.as_str(),
            truncate(tx.short_description(), 40)
        );
    }
    println!();
    println!("   Run 'smsledger import --file {}' to store them.", args.file.display());

    Ok(())
}

pub fn cmd_import(
    db: &Database,
    args: &SourceArgs,
    config: &PipelineConfig,
    no_dedupe: bool,
) -> Result<()> {
    let (source, query) = build_source(args)?;
    println!("📥 Importing {} ({})...", args.file.display(), source.format());

    let options = IngestOptions {
        check_duplicates: !no_dedupe,
        ..IngestOptions::default()
    };
    let result = ingest_from(&source, &query, db, config, &options, None)
        .with_context(|| format!("Failed to import {}", args.file.display()))?;
    if result.report.discarded > 0 {
        tracing::warn!(
            discarded = result.report.discarded,
            "Some financial messages could not be parsed into valid transactions"
        );
    }

    print_report(&result);
    println!();
    println!("✅ Imported {} new transactions", result.report.inserted);

    let uncategorized = db.count_uncategorized()?;
    if uncategorized > 0 {
        println!(
            "   {} transactions need a category. Run 'smsledger transactions uncategorized'.",
            uncategorized
        );
    }

    Ok(())
}
