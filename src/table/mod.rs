//! # Table Module
//!
//! CSV input and output for the enrichment pipeline.
//!
//! ## Key Components
//!
//! - `read_source_rows`: Reads the `website_url` column plus passthrough columns
//! - `write_records`: Writes enriched records with JSON-encoded structured columns
//! - `read_enriched_rows`: Reads back `website_url` and `last_enriched_at` from
//!   a previous run's output
//! - `normalize_url`: Turns a raw URL cell into an http(s) `Url`
//!
//! ## Output Columns
//!
//! `website_url`, `platform`, `industry`, `tags`, `platforms`, `industries`,
//! `colors`, `tag_confidence`, `last_enriched_at`, then the input's other
//! columns in input order. Input columns named like an output column are not
//! repeated.

mod error;
mod reader;
mod writer;

pub use error::TableError;
pub use reader::{read_enriched_rows, read_source_rows};
pub use writer::{write_records, write_url_list};

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use url::Url;

use crate::fetcher::FetchError;

/// Header of the URL column
pub const URL_COLUMN: &str = "website_url";

/// Header of the enrichment timestamp column
pub const ENRICHED_AT_COLUMN: &str = "last_enriched_at";

/// Columns written before the passthrough columns
pub const OUTPUT_COLUMNS: [&str; 9] = [
    URL_COLUMN,
    "platform",
    "industry",
    "tags",
    "platforms",
    "industries",
    "colors",
    "tag_confidence",
    ENRICHED_AT_COLUMN,
];

/// Longest URL accepted
const MAX_URL_LEN: usize = 2048;

/// A scheme at the start of the cell, not `://` inside a query
static SCHEME_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").expect("static regex must compile")
});

/// One input row
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    /// The raw URL cell
    pub website_url: String,

    /// The other columns as `(header, value)` in input order
    pub passthrough: Vec<(String, String)>,
}

impl SourceRow {
    pub fn new(website_url: impl Into<String>) -> Self {
        Self {
            website_url: website_url.into(),
            passthrough: Vec::new(),
        }
    }
}

/// A row of a previously enriched table
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub website_url: String,

    /// `None` when the cell is missing or unparseable
    pub last_enriched_at: Option<DateTime<Utc>>,
}

/// Normalize a raw URL cell
///
/// Trims whitespace and defaults a missing scheme to `https://`. Rejects
/// empty values, non-http(s) schemes, URLs without a host and URLs longer
/// than 2048 characters.
pub fn normalize_url(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidUrl("empty URL".to_string()));
    }

    let candidate = if SCHEME_PREFIX.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    if candidate.len() > MAX_URL_LEN {
        return Err(FetchError::InvalidUrl(format!(
            "URL longer than {} characters",
            MAX_URL_LEN
        )));
    }

    let url = Url::parse(&candidate)
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "unsupported scheme '{}' in {}",
            url.scheme(),
            trimmed
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::InvalidUrl(format!("no host in {}", trimmed)));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_scheme() {
        let url = normalize_url("  example.com/pricing ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/pricing");
    }

    #[test]
    fn test_normalize_scheme_only_at_start() {
        let url = normalize_url("example.com/login?next=https://example.com/home").unwrap();
        assert_eq!(url.as_str(), "https://example.com/login?next=https://example.com/home");

        let url = normalize_url("shop.example.com/r?to=http://partner.test").unwrap();
        assert_eq!(url.host_str(), Some("shop.example.com"));
    }

    #[test]
    fn test_normalize_keeps_http() {
        let url = normalize_url("HTTP://Example.COM").unwrap();
        assert_eq!(url.as_str(), "http://example.com/");
    }

    #[test]
    fn test_normalize_rejects() {
        assert!(matches!(normalize_url("   "), Err(FetchError::InvalidUrl(_))));
        assert!(matches!(
            normalize_url("ftp://files.example.com"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(normalize_url("https://"), Err(FetchError::InvalidUrl(_))));

        let long = format!("example.com/{}", "a".repeat(MAX_URL_LEN));
        assert!(matches!(normalize_url(&long), Err(FetchError::InvalidUrl(_))));
    }
}
