//! Content extraction module
//!
//! This module turns raw HTML into the text and style views the classifiers
//! work on: title, meta description, visible body text, style sources and
//! meta color hints.

mod content_extraction;
mod error;

pub use content_extraction::ContentExtractor;
pub use error::ParseError;

/// Default maximum document size accepted for extraction (5 MiB)
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

/// Content extracted from a fetched page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContent {
    /// Text of the first `<title>`, trimmed
    pub title: String,

    /// Content of `<meta name="description">`, trimmed
    pub meta_description: String,

    /// Visible body text with scripts, styles and navigation removed
    pub body_text: String,

    /// Inline `style` attributes and `<style>` blocks in document order
    pub style_sources: Vec<String>,

    /// Normalized hex colors from theme-color, then msapplication-TileColor
    pub meta_colors: Vec<String>,
}

impl ExtractedContent {
    /// Title, description and body joined into the text classifiers read
    pub fn signal_text(&self) -> String {
        [
            self.title.as_str(),
            self.meta_description.as_str(),
            self.body_text.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Whether extraction produced nothing at all
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.meta_description.is_empty()
            && self.body_text.is_empty()
            && self.style_sources.is_empty()
            && self.meta_colors.is_empty()
    }
}

/// Configuration for content extraction
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// CSS selectors whose text is excluded from `body_text`
    pub exclude_selectors: Vec<String>,

    /// Documents larger than this are rejected with `ParseError::TooLarge`
    pub max_document_bytes: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            exclude_selectors: [
                "script",
                "style",
                "noscript",
                "template",
                "nav",
                "header",
                "footer",
                "aside",
                ".navigation",
                ".menu",
                ".sidebar",
                "#nav",
                "#header",
                "#footer",
                "#sidebar",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}
