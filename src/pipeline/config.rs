//! # Enrichment Configuration Module
//!
//! Tunables for one enrichment run: worker count, classifier thresholds, tag
//! limits and the extractor settings. Built with the same builder pattern as
//! `FetcherConfig`.

use crate::classifier::{
    TagOptions, DEFAULT_INDUSTRY_THRESHOLD, DEFAULT_MAX_INDUSTRIES, DEFAULT_MAX_STYLE_BYTES,
};
use crate::extractor::ExtractorConfig;

/// Default number of rows processed concurrently
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration for an enrichment run
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Maximum rows in flight at once (1 processes rows sequentially)
    pub concurrency: usize,

    /// Minimum confidence for an industry to be reported
    pub industry_threshold: f64,

    /// Maximum industries per record
    pub max_industries: usize,

    /// Tag count, length and decay settings
    pub tags: TagOptions,

    /// CSS bytes scanned for colors per page
    pub max_style_bytes: usize,

    /// Content extraction settings
    pub extractor: ExtractorConfig,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            industry_threshold: DEFAULT_INDUSTRY_THRESHOLD,
            max_industries: DEFAULT_MAX_INDUSTRIES,
            tags: TagOptions::default(),
            max_style_bytes: DEFAULT_MAX_STYLE_BYTES,
            extractor: ExtractorConfig::default(),
        }
    }
}

/// Builder for EnrichConfig
#[derive(Debug, Default)]
pub struct EnrichConfigBuilder {
    config: EnrichConfig,
}

impl EnrichConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: EnrichConfig::default(),
        }
    }

    /// Set the number of concurrent rows, at least 1
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    /// Set the industry confidence threshold
    pub fn industry_threshold(mut self, threshold: f64) -> Self {
        self.config.industry_threshold = threshold;
        self
    }

    /// Set the maximum number of industries per record
    pub fn max_industries(mut self, max: usize) -> Self {
        self.config.max_industries = max;
        self
    }

    /// Set the maximum number of tags per record
    pub fn max_tags(mut self, max: usize) -> Self {
        self.config.tags.max_tags = max;
        self
    }

    /// Set the minimum tag length in characters
    pub fn min_tag_len(mut self, len: usize) -> Self {
        self.config.tags.min_len = len;
        self
    }

    /// Set the per-rank tag confidence decay
    pub fn tag_decay(mut self, decay: f64) -> Self {
        self.config.tags.decay = decay;
        self
    }

    /// Set the CSS scan budget for color extraction
    pub fn max_style_bytes(mut self, bytes: usize) -> Self {
        self.config.max_style_bytes = bytes;
        self
    }

    /// Set the largest document the extractor will parse
    pub fn max_document_bytes(mut self, bytes: usize) -> Self {
        self.config.extractor.max_document_bytes = bytes;
        self
    }

    /// Replace the content extraction settings
    pub fn extractor(mut self, extractor: ExtractorConfig) -> Self {
        self.config.extractor = extractor;
        self
    }

    /// Build the EnrichConfig
    pub fn build(self) -> EnrichConfig {
        self.config
    }
}

impl EnrichConfig {
    /// Create a new builder for EnrichConfig
    pub fn builder() -> EnrichConfigBuilder {
        EnrichConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnrichConfig::default();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.industry_threshold, 0.15);
        assert_eq!(config.max_industries, 5);
        assert_eq!(config.tags.max_tags, 10);
        assert_eq!(config.max_style_bytes, 50_000);
    }

    #[test]
    fn test_builder() {
        let config = EnrichConfig::builder()
            .concurrency(0)
            .industry_threshold(0.3)
            .max_tags(3)
            .tag_decay(0.5)
            .max_document_bytes(1024)
            .build();

        assert_eq!(config.concurrency, 1);
        assert_eq!(config.industry_threshold, 0.3);
        assert_eq!(config.tags.max_tags, 3);
        assert_eq!(config.tags.decay, 0.5);
        assert_eq!(config.extractor.max_document_bytes, 1024);
    }
}
