//! Cardpress Library
//!
//! Converts tabular survey records (one row per "opportunity") into a
//! printable deck of double-sided cards, each bearing a QR code linking to
//! a map location.
//!
//! The pipeline:
//! - Resolves arbitrary input column headers to a canonical schema, with
//!   normalization and a persisted remapping file
//! - Derives Google Maps weblinks from record coordinates
//! - Generates deterministically named QR code assets plus a CSV manifest
//! - Renders per-record cards from a `{{field}}` placeholder template
//! - Composes N cards per page into front/back page pairs and invokes an
//!   external document compiler (pandoc + xelatex) behind a trait

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod services;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::RunConfig;
pub use error::{Error, Result};
pub use models::{CardDocument, QrAsset, Record, RecordFailure, RunSummary};
pub use services::page_compositor::{DocumentCompiler, PandocCompiler};
pub use services::pipeline::Pipeline;
pub use services::schema_resolver::{CanonicalField, HeaderMapping, MappingOverrides};
