//! Error types for the classifier module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for classifier operations
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// A computed confidence fell outside [0, 1] or was not finite
    #[error("Invalid confidence {value} for '{label}'")]
    InvalidConfidence {
        /// Label the confidence was computed for
        label: String,
        /// The offending value
        value: f64,
    },

    /// A rule set entry is unusable
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Selector signature could not be parsed
    #[error("Invalid selector signature '{selector}' for {platform}")]
    InvalidSelector {
        /// Platform the signature belongs to
        platform: String,
        /// The selector text
        selector: String,
    },

    /// Rule set file could not be decoded
    #[error("Rule set JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rule set file could not be read
    #[error("Rule set IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ClassificationError> for CrateError {
    fn from(err: ClassificationError) -> Self {
        match err {
            ClassificationError::Json(e) => CrateError::Json(e),
            ClassificationError::Io(e) => CrateError::Io(e),
            _ => CrateError::Classification(err.to_string()),
        }
    }
}
