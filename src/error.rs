//! Error types for starboard

use thiserror::Error;

/// Errors that can occur while building a leaderboard
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse records: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error in {field}: {message}")]
    DateParseError { field: &'static str, message: String },

    #[error("Invalid page: {0}")]
    InvalidPage(String),
}
