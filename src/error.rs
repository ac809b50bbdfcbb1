//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.
//!
//! Data-quality conditions (positions outside the recombination map, NaN
//! rates) are not errors: they are logged with `tracing::warn!` and counted
//! by the structures that detect them.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for two-locus counting
#[derive(Error, Debug)]
pub enum TwoLocusError {
    /// I/O errors (file missing, permission denied, read/write failures)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (missing positions for a window or bp threshold,
    /// decreasing bin edges, invalid CLI arguments)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Domain errors (malformed dosage codes, rates outside the map function's domain)
    #[error("Domain error: {message}")]
    Domain { message: String },

    /// Invalid data errors (length mismatches, unsorted positions or distances)
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// File not found errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Parse errors
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Windows file errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Results using TwoLocusError
pub type Result<T> = std::result::Result<T, TwoLocusError>;

impl TwoLocusError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a domain error
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
