//! # Page Fetcher Module
//!
//! This module retrieves raw HTML for a single URL. It is the only part of the
//! pipeline that touches the network.
//!
//! ## Key Components
//!
//! - `Fetcher`: The seam the orchestrator fetches through, so tests can swap
//!   in canned documents
//! - `HttpFetcher`: reqwest-backed implementation with timeout, user agent and
//!   an optional shared rate limit
//! - `FetchedDocument`: The raw page plus its fetch status and timestamp
//! - `FetchError`: Typed failures (invalid URL, timeout, non-2xx, transport)
//!
//! A request is attempted exactly once. Failures are turned into an empty
//! document with `FetchStatus::FetchError` or `FetchStatus::Timeout`, which
//! every downstream extractor reads as "no signal".

mod config;
mod error;
mod http;

pub use config::{FetcherConfig, FetcherConfigBuilder, DEFAULT_TIMEOUT_SECS};
pub use error::FetchError;
pub use http::HttpFetcher;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Outcome of a fetch as recorded on the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// The page was retrieved with a 2xx response
    Success,
    /// Non-2xx response, transport failure or invalid URL
    FetchError,
    /// The request exceeded the configured timeout
    Timeout,
}

/// A fetched page
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// URL that was requested
    pub url: String,

    /// Raw HTML, empty when the fetch failed
    pub html: String,

    /// Fetch status
    pub status: FetchStatus,

    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,
}

impl FetchedDocument {
    /// A successfully fetched document
    pub fn success(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            status: FetchStatus::Success,
            fetched_at: Utc::now(),
        }
    }

    /// The empty document a failed fetch degrades to
    pub fn from_error(url: impl Into<String>, error: &FetchError) -> Self {
        Self {
            url: url.into(),
            html: String::new(),
            status: error.status(),
            fetched_at: Utc::now(),
        }
    }

    /// Whether the document carries any HTML to analyze
    pub fn has_content(&self) -> bool {
        self.status == FetchStatus::Success && !self.html.trim().is_empty()
    }
}

/// Retrieves a page for a normalized URL
pub trait Fetcher {
    /// Fetch a single page. Implementations make at most one attempt.
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedDocument, FetchError>> + Send;
}
