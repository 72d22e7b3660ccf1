//! Tag extraction by word frequency

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::classifier::{normalize_text, ClassificationError, ScoredLabel};

/// Lowest confidence a kept tag can have
const MIN_TAG_CONFIDENCE: f64 = 0.01;

/// Tuning for tag extraction
#[derive(Debug, Clone, PartialEq)]
pub struct TagOptions {
    /// Maximum number of tags kept
    pub max_tags: usize,

    /// Tokens shorter than this are ignored
    pub min_len: usize,

    /// Confidence of the tag at rank `r` is `decay^r`
    pub decay: f64,
}

impl Default for TagOptions {
    fn default() -> Self {
        Self {
            max_tags: 10,
            min_len: 3,
            decay: 0.85,
        }
    }
}

/// Picks the most frequent meaningful words of a text
#[derive(Debug)]
pub struct TagExtractor {
    stopwords: HashSet<String>,
    options: TagOptions,
}

impl TagExtractor {
    /// Create a tag extractor
    ///
    /// # Arguments
    ///
    /// * `stopwords` - Words never emitted as tags, compared case-insensitively
    /// * `options` - Limits and decay factor
    pub fn new(stopwords: &[String], options: TagOptions) -> Result<Self, ClassificationError> {
        if !options.decay.is_finite() || options.decay <= 0.0 || options.decay > 1.0 {
            return Err(ClassificationError::InvalidRule(format!(
                "tag decay {} outside (0, 1]",
                options.decay
            )));
        }

        let stopwords = stopwords
            .iter()
            .map(|word| normalize_text(word))
            .filter(|word| !word.is_empty())
            .collect();

        Ok(Self { stopwords, options })
    }

    /// Build without validating `options`, so tests can force bad confidences
    #[cfg(test)]
    pub(crate) fn new_unchecked(stopwords: &[String], options: TagOptions) -> Self {
        Self {
            stopwords: stopwords.iter().map(|word| normalize_text(word)).collect(),
            options,
        }
    }

    fn keep(&self, token: &str) -> bool {
        token.chars().count() >= self.options.min_len
            && !token.chars().all(|c| c.is_numeric())
            && !self.stopwords.contains(token)
    }

    /// Extract tags in rank order
    ///
    /// Ranked by descending frequency with alphabetical tiebreak. Confidence
    /// decays geometrically with rank and never drops below 0.01.
    #[instrument(skip_all, level = "debug")]
    pub fn extract(&self, text: &str) -> Result<Vec<ScoredLabel>, ClassificationError> {
        let normalized = normalize_text(text);

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in normalized.split(' ').filter(|t| self.keep(t)) {
            *counts.entry(token).or_insert(0) += 1;
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.options.max_tags);

        let mut tags = Vec::with_capacity(ranked.len());
        let mut confidence: f64 = 1.0;
        for (word, _) in ranked {
            tags.push(ScoredLabel::new(word, confidence.max(MIN_TAG_CONFIDENCE))?);
            confidence *= self.options.decay;
        }

        debug!("Extracted {} tags", tags.len());
        Ok(tags)
    }
}
