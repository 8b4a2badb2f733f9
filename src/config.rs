//! Run configuration for the card generation pipeline.
//!
//! A [`RunConfig`] captures every run parameter the pipeline needs beyond the
//! input file itself: output location, map zoom, page geometry, template and
//! mapping overrides, and the compiler wait bound.

use crate::constants::{
    DEFAULT_CARDS_PER_PAGE, DEFAULT_COMPILE_TIMEOUT_SECS, DEFAULT_PAGE_SIZE, DEFAULT_ZOOM,
    MAX_ZOOM,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Root of the output tree (`qr_codes/`, `cards/`, compiled document)
    pub output_dir: PathBuf,

    /// Google Maps zoom level embedded in weblinks
    pub zoom: u8,

    /// Card slots per page face
    pub cards_per_page: usize,

    /// LaTeX page size option (e.g. "a4paper", "letterpaper")
    pub page_size: String,

    /// Card template file; the built-in template is used when `None`
    pub card_template: Option<PathBuf>,

    /// Layout template file; the built-in template is used when `None`
    pub layout_template: Option<PathBuf>,

    /// Header mapping overrides file; skipped when absent
    pub mapping_file: Option<PathBuf>,

    /// Stop after writing the LaTeX source, without invoking the compiler
    pub skip_compile: bool,

    /// Bound on the external compiler wait
    pub compile_timeout: Duration,

    /// Display a progress bar while processing records
    pub show_progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            zoom: DEFAULT_ZOOM,
            cards_per_page: DEFAULT_CARDS_PER_PAGE,
            page_size: DEFAULT_PAGE_SIZE.to_string(),
            card_template: None,
            layout_template: None,
            mapping_file: None,
            skip_compile: false,
            compile_timeout: Duration::from_secs(DEFAULT_COMPILE_TIMEOUT_SECS),
            show_progress: true,
        }
    }
}

impl RunConfig {
    /// Validate parameter ranges before any processing starts
    pub fn validate(&self) -> Result<()> {
        if self.cards_per_page == 0 {
            return Err(Error::data_validation("cards_per_page must be at least 1"));
        }
        if self.zoom == 0 || self.zoom > MAX_ZOOM {
            return Err(Error::data_validation(format!(
                "zoom must be between 1 and {MAX_ZOOM}, got {}",
                self.zoom
            )));
        }
        if self.page_size.trim().is_empty() {
            return Err(Error::data_validation("page_size must not be empty"));
        }
        Ok(())
    }

    /// Directory receiving QR PNG assets
    pub fn qr_dir(&self) -> PathBuf {
        self.output_dir.join(crate::constants::QR_DIR_NAME)
    }

    /// Directory receiving rendered card documents
    pub fn cards_dir(&self) -> PathBuf {
        self.output_dir.join(crate::constants::CARDS_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_cards_per_page_rejected() {
        let config = RunConfig {
            cards_per_page: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::DataValidation { .. })
        ));
    }

    #[test]
    fn out_of_range_zoom_rejected() {
        let config = RunConfig {
            zoom: 22,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
