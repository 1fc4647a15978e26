//! Pipeline configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/smsledger/config/pipeline.toml)
//!    or an explicit path
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/pipeline.toml");

/// Default duplicate window: 5 minutes
pub const DEFAULT_WINDOW_MS: i64 = 5 * 60 * 1000;
/// Smallest window the detector will use: 1 minute
pub const MIN_WINDOW_MS: i64 = 60 * 1000;
/// Largest window the detector will use: 30 minutes
pub const MAX_WINDOW_MS: i64 = 30 * 60 * 1000;

pub const DEFAULT_HIGH_CONFIDENCE: f64 = 0.8;
pub const DEFAULT_AMOUNT_CAP: f64 = 1_000_000.0;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.80;
pub const DEFAULT_AMOUNT_TOLERANCE: f64 = 0.01;

/// Clamp a caller-supplied window into [MIN_WINDOW_MS, MAX_WINDOW_MS]
pub fn clamp_window(window_ms: i64) -> i64 {
    window_ms.clamp(MIN_WINDOW_MS, MAX_WINDOW_MS)
}

/// Tunables for the ingestion pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    /// Duplicate detection window in milliseconds (clamped when used)
    pub duplicate_window_ms: i64,
    /// Confidence at or above which a parse is "high confidence"
    pub high_confidence_threshold: f64,
    /// Largest amount accepted by the validity gate
    pub amount_cap: f64,
    /// Normalized Levenshtein similarity needed for two identifiers to match
    pub similarity_threshold: f64,
    /// Two amounts closer than this are equal
    pub amount_tolerance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            duplicate_window_ms: DEFAULT_WINDOW_MS,
            high_confidence_threshold: DEFAULT_HIGH_CONFIDENCE,
            amount_cap: DEFAULT_AMOUNT_CAP,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            amount_tolerance: DEFAULT_AMOUNT_TOLERANCE,
        }
    }
}

impl PipelineConfig {
    /// Load from the default override location, falling back to embedded defaults
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from an explicit path (embedded defaults if it does not exist)
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// The duplicate window actually used by the detectors
    pub fn window_ms(&self) -> i64 {
        clamp_window(self.duplicate_window_ms)
    }

    /// Copy of this config with a different window
    pub fn with_window(&self, window_ms: i64) -> Self {
        Self {
            duplicate_window_ms: window_ms,
            ..self.clone()
        }
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("smsledger").join("config").join("pipeline.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<PipelineConfig> {
    let path = match override_path {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path(),
    };

    let content = match path {
        Some(p) if p.exists() => fs::read_to_string(&p)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", p.display(), e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    dedupe: Option<RawDedupe>,
    extraction: Option<RawExtraction>,
    validation: Option<RawValidation>,
}

#[derive(Debug, Deserialize)]
struct RawDedupe {
    window_ms: Option<i64>,
    similarity_threshold: Option<f64>,
    amount_tolerance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
    high_confidence_threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawValidation {
    amount_cap: Option<f64>,
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<PipelineConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = PipelineConfig::default();

    if let Some(dedupe) = raw.dedupe {
        if let Some(window) = dedupe.window_ms {
            config.duplicate_window_ms = window;
        }
        if let Some(threshold) = dedupe.similarity_threshold {
            config.similarity_threshold = threshold;
        }
        if let Some(tolerance) = dedupe.amount_tolerance {
            config.amount_tolerance = tolerance;
        }
    }

    if let Some(extraction) = raw.extraction {
        if let Some(threshold) = extraction.high_confidence_threshold {
            config.high_confidence_threshold = threshold;
        }
    }

    if let Some(validation) = raw.validation {
        if let Some(cap) = validation.amount_cap {
            config.amount_cap = cap;
        }
    }

    Ok(config)
}
