//! Error types for the fetcher module

use crate::error::Error as CrateError;
use crate::fetcher::FetchStatus;
use thiserror::Error;

/// Error type for fetch operations
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be normalized into an http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-2xx status
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FetchError {
    /// The document status a failed fetch degrades to
    pub fn status(&self) -> FetchStatus {
        match self {
            FetchError::Timeout => FetchStatus::Timeout,
            FetchError::Http(e) if e.is_timeout() => FetchStatus::Timeout,
            _ => FetchStatus::FetchError,
        }
    }
}

impl From<FetchError> for CrateError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Http(e) => CrateError::Http(e),
            _ => CrateError::Fetch(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(FetchError::Timeout.status(), FetchStatus::Timeout);
        assert_eq!(FetchError::Status(404).status(), FetchStatus::FetchError);
        assert_eq!(
            FetchError::InvalidUrl("ftp://x".to_string()).status(),
            FetchStatus::FetchError
        );
    }

    #[test]
    fn test_into_crate_error() {
        let err: CrateError = FetchError::Status(503).into();
        assert!(matches!(err, CrateError::Fetch(msg) if msg.contains("503")));
    }
}
