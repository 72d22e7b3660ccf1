//! Error types for the extractor module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for content extraction
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document exceeds the configured size limit
    #[error("Document too large: {size} bytes (limit {limit})")]
    TooLarge {
        /// Size of the document in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },
}

impl From<ParseError> for CrateError {
    fn from(err: ParseError) -> Self {
        CrateError::Parse(err.to_string())
    }
}
