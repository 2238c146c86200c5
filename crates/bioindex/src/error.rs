//! Error types for the Bioindex library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Bioindex operations.
///
/// Every variant names the pipeline stage that failed, so a caller can tell a
/// rejected record apart from a strict-mode resolution failure or a broken
/// sink.
#[derive(Debug, Error)]
pub enum BioindexError {
    /// Error reading an input file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input document is not a well-formed Bioindex.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The record failed structural validation.
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] InvalidRecordError),

    /// Taxonomy resolution failed while strict resolution was requested.
    #[error("Taxonomy resolution failed (strict mode): {0}")]
    Resolution(#[from] ResolutionError),

    /// The export sink could not persist the tables.
    #[error("Export failed: {0}")]
    Sink(#[from] SinkError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Structural problems that make a record impossible to tabularize.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidRecordError {
    /// The record has no results at all.
    #[error("bioindex '{id}' has no results")]
    NoResults { id: String },

    /// Two results share the same sample identifier.
    #[error("duplicate sample '{sample}'")]
    DuplicateSample { sample: String },

    /// A result lacks one of the four dimensions.
    #[error("sample '{sample}' is missing dimension '{dimension}'")]
    MissingDimension { sample: String, dimension: String },

    /// A numeric field holds NaN or an infinity.
    #[error("sample '{sample}' has non-finite value {value} at '{field}'")]
    NonFinite {
        sample: String,
        field: String,
        value: f64,
    },
}

/// Failures talking to the taxonomy service.
#[derive(Debug, Clone, Error)]
pub enum ResolutionError {
    /// Transport failure or non-success status.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with something other than a name mapping.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The configured endpoint cannot be used.
    #[error("unknown endpoint '{0}'")]
    UnknownEndpoint(String),
}

impl From<reqwest::Error> for ResolutionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ResolutionError::MalformedResponse(err.to_string())
        } else if err.is_builder() {
            ResolutionError::UnknownEndpoint(err.to_string())
        } else {
            ResolutionError::Network(err.to_string())
        }
    }
}

/// Failures while writing tables to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Error creating or writing an output file.
    #[error("write failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error serializing the JSON document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Bioindex operations.
pub type Result<T> = std::result::Result<T, BioindexError>;
