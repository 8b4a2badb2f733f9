//! Core data structures for the card generation pipeline.
//!
//! A [`Record`] is one validated survey row; [`QrAsset`] and [`CardDocument`]
//! are the per-record artifacts flowing towards the compositor; [`RunSummary`]
//! carries the outcome of a full pipeline run back to the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// One validated survey row
///
/// Coordinates are already parsed and range-checked; rows that fail that
/// validation never become a `Record` and are reported as [`RecordFailure`]s
/// instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// 1-based line number of the source row in the input CSV
    pub row: usize,
    /// Unique, stable identifier of the opportunity
    pub object_id: String,
    /// Contact name of the submitter
    pub name: String,
    /// Submitter's organization
    pub organization: String,
    /// Free-text description of the opportunity
    pub description: String,
    /// Feasibility answer ("is this feasible in the next 3 years?")
    pub feasibility: String,
    /// Ordinal difficulty score 1-5, absent when missing or unparseable
    pub difficulty_score: Option<u8>,
    /// Aspects expected to go smoothly
    pub smooth_aspects: String,
    /// Aspects expected to be challenging
    pub challenges: String,
    /// Potential funders
    pub funders: String,
    /// Longitude in decimal degrees, within [-180, 180]
    pub longitude: f64,
    /// Latitude in decimal degrees, within [-90, 90]
    pub latitude: f64,
}

/// A generated QR code image and its provenance
///
/// Created exactly once per record per run. The file name is a deterministic
/// function of `object_id`, so re-running against the same dataset overwrites
/// in place rather than accumulating stale files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrAsset {
    /// Record identifier the asset belongs to
    pub object_id: String,
    /// Path of the written PNG
    pub file_path: PathBuf,
    /// The URL encoded in the QR symbol
    pub source_url: String,
}

impl QrAsset {
    /// File name component of the asset path
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A rendered card for one record
///
/// Holds both the substituted Markdown content written to `cards/` and the
/// tagged field map the page compositor renders layout blocks from.
#[derive(Debug, Clone)]
pub struct CardDocument {
    /// Record identifier the card belongs to
    pub object_id: String,
    /// Fully substituted card content
    pub content: String,
    /// Canonical placeholder name -> rendered value, including aliases
    pub fields: BTreeMap<String, String>,
}

impl CardDocument {
    /// Rendered value for a placeholder, empty when absent
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// One skipped row and the reason it was skipped
///
/// Carries the source row number so failures collected across pipeline
/// phases can be reported in first-seen input order.
#[derive(Debug, Clone)]
pub struct RecordFailure {
    /// 1-based line number of the failed row in the input CSV
    pub row: usize,
    /// Identifier of the failed record ("?" when the identifier itself is unreadable)
    pub object_id: String,
    /// Human-readable failure reason
    pub reason: String,
}

impl RecordFailure {
    pub fn new(row: usize, object_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            row,
            object_id: object_id.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome of a full pipeline run, for reporting and exit-code mapping
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Data rows read from the input CSV
    pub rows_read: usize,
    /// QR assets successfully written
    pub qr_generated: usize,
    /// Card documents successfully written
    pub cards_written: usize,
    /// Rows skipped, in first-seen input order
    pub failures: Vec<RecordFailure>,
    /// Manifest path, `None` when the manifest write failed
    pub manifest_path: Option<PathBuf>,
    /// Assembled LaTeX source path
    pub layout_path: Option<PathBuf>,
    /// Compiled document path, `None` when compilation was skipped
    pub document_path: Option<PathBuf>,
    /// Front/back page pairs composed
    pub page_pairs: usize,
    /// Total wall-clock processing time
    pub processing_time: Duration,
}

impl RunSummary {
    /// True when at least one card was produced
    pub fn has_output(&self) -> bool {
        self.cards_written > 0
    }

    /// True when some rows succeeded and some failed
    pub fn is_partial(&self) -> bool {
        self.has_output() && !self.failures.is_empty()
    }
}
