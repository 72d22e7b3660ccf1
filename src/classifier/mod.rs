//! # Classifier Module
//!
//! This module holds the rule-based signal extractors that run on a page once
//! it has been fetched and parsed. Each extractor is independent of the
//! others and reads either the raw HTML or the `ExtractedContent` view.
//!
//! ## Key Components
//!
//! - `SignatureMatcher`: CMS / framework detection from HTML signatures
//! - `KeywordClassifier`: Industry scoring from weighted keyword lists
//! - `TagExtractor`: Frequent meaningful words with rank-decayed confidence
//! - `ColorExtractor`: Primary and secondary brand colors
//! - `RuleSet`: The signature, keyword and stopword tables the extractors
//!   are constructed from
//! - `ScoredLabel`: The `(name, confidence)` pair every extractor emits
//!
//! ## Ordering
//!
//! Platform and industry lists are sorted by descending confidence with the
//! name as tiebreak, so output is deterministic for identical input.

mod colors;
mod error;
mod industries;
mod platforms;
pub mod rules;
mod tags;

pub use colors::{normalize_hex, ColorExtractor, ColorPair, DEFAULT_MAX_STYLE_BYTES};
pub use error::ClassificationError;
pub use industries::{KeywordClassifier, DEFAULT_INDUSTRY_THRESHOLD, DEFAULT_MAX_INDUSTRIES};
pub use platforms::SignatureMatcher;
pub use rules::RuleSet;
pub use tags::{TagExtractor, TagOptions};

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A named result with a confidence in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredLabel {
    /// Platform, industry or tag name
    pub name: String,

    /// Confidence in [0, 1], rounded to four decimal places
    pub confidence: f64,
}

impl ScoredLabel {
    /// Create a label, rejecting confidences that are not finite or outside [0, 1]
    pub fn new(name: impl Into<String>, confidence: f64) -> Result<Self, ClassificationError> {
        let name = name.into();
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(ClassificationError::InvalidConfidence {
                label: name,
                value: confidence,
            });
        }

        Ok(Self {
            name,
            confidence: (confidence * 10_000.0).round() / 10_000.0,
        })
    }
}

/// Descending confidence, then name ascending
pub fn compare_labels(a: &ScoredLabel, b: &ScoredLabel) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.name.cmp(&b.name))
}

/// Join label names with `", "` in list order
pub fn join_names(labels: &[ScoredLabel]) -> String {
    labels
        .iter()
        .map(|label| label.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Normalize text for keyword matching: lowercase, non-alphanumerics become
/// spaces, whitespace collapsed
pub(crate) fn normalize_text(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
