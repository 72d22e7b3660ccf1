//! # Enrichment Pipeline Module
//!
//! This module drives every other component for a batch of source rows and
//! merges their results into one `EnrichmentRecord` per row.
//!
//! ## Key Components
//!
//! - `Enricher`: Fetches, extracts and classifies rows with bounded concurrency
//! - `EnrichConfig`: Run tunables (concurrency, thresholds, tag limits)
//! - `EnrichJob`: Reads an input CSV, enriches it over HTTP and writes the output
//! - `EnrichmentRecord`: The merged output for one row
//! - `RowOutcome`: A record plus the warnings raised while building it
//! - `RunSummary`: Counts and timing for a completed run
//! - `needs_reenrichment`: Freshness check for previously enriched rows
//!
//! ## Failure Containment
//!
//! A failing fetch, an oversize page, a classifier error or even a panic in
//! the row task only affects that row. The row is still emitted with empty
//! fields for whatever could not be computed, and the reason is kept as a
//! `Warning` on its `RowOutcome::Degraded`.

mod config;
mod freshness;
mod job;
mod orchestrator;

pub use config::{EnrichConfig, EnrichConfigBuilder, DEFAULT_CONCURRENCY};
pub use freshness::{needs_reenrichment, DEFAULT_MAX_AGE_DAYS};
pub use job::EnrichJob;
pub use orchestrator::Enricher;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::classifier::{ColorPair, ScoredLabel};
use crate::fetcher::FetchStatus;

/// Timestamp format of `last_enriched_at`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format a timestamp the way it is written to output files
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp written by `format_timestamp`, also accepting RFC 3339
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .map(|at| at.with_timezone(&Utc))
                .ok()
        })
}

/// The merged enrichment result for one source row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentRecord {
    /// Normalized URL, or the trimmed input when it could not be normalized
    pub website_url: String,

    /// Platform names joined with `", "`
    pub platform: String,

    /// Industry names joined with `", "`
    pub industry: String,

    /// Tag names joined with `", "`
    pub tags: String,

    pub platforms: Vec<ScoredLabel>,

    pub industries: Vec<ScoredLabel>,

    pub colors: ColorPair,

    /// Tags in rank order, serialized as a `{tag: confidence}` object
    #[serde(serialize_with = "serialize_tag_map")]
    pub tag_confidence: Vec<ScoredLabel>,

    #[serde(serialize_with = "serialize_timestamp")]
    pub last_enriched_at: DateTime<Utc>,

    /// Input columns carried through unchanged
    #[serde(skip)]
    pub passthrough: Vec<(String, String)>,
}

impl EnrichmentRecord {
    /// A record with every extractor field empty
    pub fn empty(
        website_url: impl Into<String>,
        passthrough: Vec<(String, String)>,
        last_enriched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            website_url: website_url.into(),
            platform: String::new(),
            industry: String::new(),
            tags: String::new(),
            platforms: Vec::new(),
            industries: Vec::new(),
            colors: ColorPair::default(),
            tag_confidence: Vec::new(),
            last_enriched_at,
            passthrough,
        }
    }

    /// The `tag_confidence` column as a JSON object in rank order
    pub fn tag_confidence_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&TagMap(&self.tag_confidence))
    }
}

struct TagMap<'a>(&'a [ScoredLabel]);

impl Serialize for TagMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for tag in self.0 {
            map.serialize_entry(&tag.name, &tag.confidence)?;
        }
        map.end()
    }
}

fn serialize_tag_map<S: Serializer>(tags: &[ScoredLabel], serializer: S) -> Result<S::Ok, S::Error> {
    TagMap(tags).serialize(serializer)
}

fn serialize_timestamp<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(at))
}

/// Why a row was degraded
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    /// The page could not be fetched
    #[error("fetch failed ({status:?}): {message}")]
    Fetch { status: FetchStatus, message: String },

    /// The page could not be parsed
    #[error("parse failed: {0}")]
    Parse(String),

    /// One extractor failed; its fields were left empty
    #[error("{extractor} failed: {message}")]
    Classification {
        extractor: &'static str,
        message: String,
    },
}

/// The result of enriching one row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Every component produced its output
    Enriched(EnrichmentRecord),

    /// Some fields were left empty
    Degraded {
        record: EnrichmentRecord,
        warnings: Vec<Warning>,
    },
}

impl RowOutcome {
    /// Build an outcome, degraded when any warning was raised
    pub fn new(record: EnrichmentRecord, warnings: Vec<Warning>) -> Self {
        if warnings.is_empty() {
            RowOutcome::Enriched(record)
        } else {
            RowOutcome::Degraded { record, warnings }
        }
    }

    pub fn record(&self) -> &EnrichmentRecord {
        match self {
            RowOutcome::Enriched(record) | RowOutcome::Degraded { record, .. } => record,
        }
    }

    pub fn into_record(self) -> EnrichmentRecord {
        match self {
            RowOutcome::Enriched(record) | RowOutcome::Degraded { record, .. } => record,
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            RowOutcome::Enriched(_) => &[],
            RowOutcome::Degraded { warnings, .. } => warnings,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, RowOutcome::Degraded { .. })
    }

    /// Whether the page could not be fetched
    pub fn fetch_failed(&self) -> bool {
        self.warnings()
            .iter()
            .any(|warning| matches!(warning, Warning::Fetch { .. }))
    }
}

/// Progress event sent once per finished row
#[derive(Debug, Clone, PartialEq)]
pub struct RowProgress {
    /// Position of the row in the input
    pub index: usize,
    pub url: String,
    pub degraded: bool,
}

/// Totals for a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub enriched: usize,
    pub degraded: usize,
    pub fetch_failures: usize,
    pub enriched_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Tally a run's outcomes
    pub fn from_outcomes(
        outcomes: &[RowOutcome],
        enriched_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        let degraded = outcomes.iter().filter(|o| o.is_degraded()).count();
        Self {
            total: outcomes.len(),
            enriched: outcomes.len() - degraded,
            degraded,
            fetch_failures: outcomes.iter().filter(|o| o.fetch_failed()).count(),
            enriched_at,
            elapsed,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows: {} enriched, {} degraded ({} fetch failures) in {:.1}s",
            self.total,
            self.enriched,
            self.degraded,
            self.fetch_failures,
            self.elapsed.as_secs_f64()
        )
    }
}
