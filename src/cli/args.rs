//! Command-line argument definitions for cardpress.
//!
//! The complete CLI interface using the clap derive API: the full `generate`
//! pipeline plus the standalone `weblinks` and `qr` utilities.

use crate::config::RunConfig;
use crate::constants::{DEFAULT_CARDS_PER_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_ZOOM};
use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments for the cardpress card generator
///
/// Converts survey CSV data into a printable deck of double-sided cards,
/// each carrying a QR code linking to a map location.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cardpress",
    version,
    about = "Generate printable double-sided cards with QR map links from survey CSV data",
    long_about = "Converts tabular survey records into a printable card deck: resolves \
                  inconsistent CSV headers against a canonical schema, derives Google Maps \
                  weblinks from coordinates, generates QR code assets with a manifest, renders \
                  per-record cards from a template, and composes front/back page pairs for \
                  duplex printing via pandoc and xelatex."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the full card generation pipeline (main command)
    Generate(GenerateArgs),
    /// Derive map weblinks from a coordinate CSV, without generating cards
    Weblinks(WeblinksArgs),
    /// Encode a single string as a QR PNG
    Qr(QrArgs),
}

/// Arguments for the generate command
#[derive(Debug, Clone, Parser)]
pub struct GenerateArgs {
    /// Input CSV file with one survey row per opportunity
    #[arg(short = 'i', long = "input", value_name = "CSV")]
    pub input: PathBuf,

    /// Directory for the output tree (qr_codes/, cards/, compiled deck)
    ///
    /// Created if it doesn't exist. Re-running against the same directory
    /// overwrites deterministically named artifacts in place.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        default_value = "output"
    )]
    pub output_dir: PathBuf,

    /// Zoom level for Google Maps weblinks (1-21)
    #[arg(short = 'z', long = "zoom", value_name = "N", default_value_t = DEFAULT_ZOOM)]
    pub zoom: u8,

    /// Card slots per page face
    #[arg(long = "cards-per-page", value_name = "N", default_value_t = DEFAULT_CARDS_PER_PAGE)]
    pub cards_per_page: usize,

    /// LaTeX page size option (e.g. a4paper, letterpaper)
    #[arg(long = "page-size", value_name = "SIZE", default_value = DEFAULT_PAGE_SIZE)]
    pub page_size: String,

    /// Card template file; a built-in front-matter Markdown template is
    /// used when not given
    #[arg(long = "card-template", value_name = "PATH")]
    pub card_template: Option<PathBuf>,

    /// Layout template file; a built-in LaTeX layout is used when not given
    #[arg(long = "layout-template", value_name = "PATH")]
    pub layout_template: Option<PathBuf>,

    /// Header mapping overrides file (canonical field -> actual header,
    /// JSON); defaults to header_mapping.json next to the input CSV
    #[arg(long = "mapping", value_name = "PATH")]
    pub mapping_file: Option<PathBuf>,

    /// Stop after writing the LaTeX source, without invoking pandoc
    #[arg(long = "skip-pdf")]
    pub skip_pdf: bool,

    /// Bound on the pandoc wait, in seconds
    #[arg(long = "compile-timeout", value_name = "SECS", default_value_t = 120)]
    pub compile_timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Suppress progress output and reduce logging to warnings
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl GenerateArgs {
    /// Build the pipeline run configuration from the parsed arguments
    pub fn to_config(&self) -> Result<RunConfig> {
        let config = RunConfig {
            output_dir: self.output_dir.clone(),
            zoom: self.zoom,
            cards_per_page: self.cards_per_page,
            page_size: self.page_size.clone(),
            card_template: self.card_template.clone(),
            layout_template: self.layout_template.clone(),
            mapping_file: self.mapping_file.clone(),
            skip_compile: self.skip_pdf,
            compile_timeout: Duration::from_secs(self.compile_timeout_secs),
            show_progress: !self.quiet,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Arguments for the weblinks command
#[derive(Debug, Clone, Parser)]
pub struct WeblinksArgs {
    /// Input CSV file with x (longitude) and y (latitude) columns
    #[arg(short = 'i', long = "input", value_name = "CSV")]
    pub input: PathBuf,

    /// Output CSV file (default: <input>_with_links.csv)
    #[arg(short = 'o', long = "output", value_name = "CSV")]
    pub output: Option<PathBuf>,

    /// Zoom level for Google Maps weblinks (1-21)
    #[arg(short = 'z', long = "zoom", value_name = "N", default_value_t = DEFAULT_ZOOM)]
    pub zoom: u8,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Arguments for the qr command
#[derive(Debug, Clone, Parser)]
pub struct QrArgs {
    /// The string to encode
    #[arg(value_name = "DATA")]
    pub data: String,

    /// Output PNG file
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
}
