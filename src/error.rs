//! Error handling for the card generation pipeline.
//!
//! Provides error types with context for schema resolution, coordinate
//! validation, QR encoding, template rendering, and document compilation
//! failures.

use thiserror::Error;

/// Result type alias for card generation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the card generation pipeline
///
/// Per-record variants (`InvalidCoordinate`, `Encoding`, `Image`) are
/// collected by the orchestrator without aborting the batch; the remaining
/// variants are fatal to the run or to the compilation step.
#[derive(Error, Debug)]
pub enum Error {
    /// One or more canonical fields could not be resolved against the input headers
    #[error("missing required headers: {}", fields.join(", "))]
    MissingHeaders { fields: Vec<String> },

    /// A record's coordinate value is non-numeric or out of range
    #[error("invalid coordinate for record '{object_id}': {value:?} ({reason})")]
    InvalidCoordinate {
        object_id: String,
        value: String,
        reason: String,
    },

    /// The weblink exceeds QR symbol capacity or cannot be encoded
    #[error("QR encoding failed for record '{object_id}': {message}")]
    Encoding { object_id: String, message: String },

    /// QR image could not be written
    #[error("QR image write failed for record '{object_id}': {message}")]
    Image { object_id: String, message: String },

    /// A template references a placeholder outside the fixed field set,
    /// or its layout markers are malformed
    #[error("template error: {message}")]
    Template { message: String },

    /// The external document compiler failed, timed out, or produced no output
    #[error("document compilation failed: {message}")]
    Compilation { message: String },

    /// Structural data problem (duplicate identifier, invalid configuration)
    #[error("data validation error: {message}")]
    DataValidation { message: String },

    /// CSV parsing error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a missing-headers error from unresolved canonical field names
    pub fn missing_headers(fields: Vec<String>) -> Self {
        Self::MissingHeaders { fields }
    }

    /// Create an invalid-coordinate error for a record
    pub fn invalid_coordinate(
        object_id: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidCoordinate {
            object_id: object_id.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a QR encoding error for a record
    pub fn encoding(object_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encoding {
            object_id: object_id.into(),
            message: message.into(),
        }
    }

    /// Create a QR image write error for a record
    pub fn image(object_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Image {
            object_id: object_id.into(),
            message: message.into(),
        }
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create a compilation error
    pub fn compilation(message: impl Into<String>) -> Self {
        Self::Compilation {
            message: message.into(),
        }
    }

    /// Create a data validation error
    pub fn data_validation(message: impl Into<String>) -> Self {
        Self::DataValidation {
            message: message.into(),
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// True for errors collected per record rather than aborting the run
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            Self::InvalidCoordinate { .. } | Self::Encoding { .. } | Self::Image { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_record_classification_separates_skippable_from_fatal() {
        assert!(Error::invalid_coordinate("1", "bad", "not a number").is_per_record());
        assert!(Error::encoding("1", "too long").is_per_record());
        assert!(Error::image("1", "disk full").is_per_record());

        assert!(!Error::missing_headers(vec!["x".to_string()]).is_per_record());
        assert!(!Error::template("bad placeholder").is_per_record());
        assert!(!Error::data_validation("duplicate identifier").is_per_record());
        assert!(!Error::io("writing", std::io::Error::other("boom")).is_per_record());
    }
}
