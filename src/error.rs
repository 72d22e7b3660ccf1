//! Error types for the site-enricher crate

use thiserror::Error;

/// Result type for enrichment operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for enrichment operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Page fetching error
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// HTML parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Classification or rule set error
    #[error("Classification error: {0}")]
    Classification(String),

    /// Input table error (missing column, unreadable file)
    #[error("Input error: {0}")]
    Input(String),

    /// Output table error
    #[error("Output error: {0}")]
    Output(String),
}
