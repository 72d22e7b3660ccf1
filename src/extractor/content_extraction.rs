//! Content extraction functionality for the extractor module

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};

use crate::classifier::normalize_hex;
use crate::extractor::{ExtractedContent, ExtractorConfig, ParseError};

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| static_selector("title"));
static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| static_selector("body"));
static NAMED_META_SELECTOR: LazyLock<Selector> = LazyLock::new(|| static_selector("meta[name]"));

const META_COLOR_NAMES: [&str; 2] = ["theme-color", "msapplication-TileColor"];

fn static_selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

/// Parses HTML into an `ExtractedContent`
#[derive(Debug)]
pub struct ContentExtractor {
    exclude: Vec<Selector>,
    max_document_bytes: usize,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}

impl ContentExtractor {
    /// Create an extractor, skipping exclude selectors that fail to parse
    pub fn new(config: &ExtractorConfig) -> Self {
        let exclude = config
            .exclude_selectors
            .iter()
            .filter_map(|selector_str| match Selector::parse(selector_str) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    warn!("Failed to parse selector '{}': {}", selector_str, e);
                    None
                }
            })
            .collect();

        Self {
            exclude,
            max_document_bytes: config.max_document_bytes,
        }
    }

    /// Extract title, description, visible text, style sources and meta colors
    ///
    /// # Arguments
    ///
    /// * `html` - The raw HTML of the page
    ///
    /// # Returns
    ///
    /// The extracted content; empty HTML yields empty fields
    pub fn extract(&self, html: &str) -> Result<ExtractedContent, ParseError> {
        if html.len() > self.max_document_bytes {
            return Err(ParseError::TooLarge {
                size: html.len(),
                limit: self.max_document_bytes,
            });
        }
        if html.trim().is_empty() {
            return Ok(ExtractedContent::default());
        }

        let document = Html::parse_document(html);

        let title = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .unwrap_or_default();

        let named_metas: Vec<ElementRef> = document.select(&NAMED_META_SELECTOR).collect();

        let meta_description = named_metas
            .iter()
            .find(|meta| meta_name_is(meta, "description"))
            .and_then(|meta| meta.value().attr("content"))
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        let meta_colors = META_COLOR_NAMES
            .iter()
            .flat_map(|name| {
                named_metas
                    .iter()
                    .filter(move |meta| meta_name_is(meta, name))
                    .filter_map(|meta| meta.value().attr("content"))
                    .filter_map(normalize_hex)
            })
            .collect();

        let content = ExtractedContent {
            title,
            meta_description,
            body_text: self.body_text(&document),
            style_sources: style_sources(&document),
            meta_colors,
        };

        debug!(
            "Extracted {} chars of body text and {} style sources",
            content.body_text.len(),
            content.style_sources.len()
        );

        Ok(content)
    }

    fn body_text(&self, document: &Html) -> String {
        let excluded: HashSet<_> = self
            .exclude
            .iter()
            .flat_map(|selector| document.select(selector).map(|element| element.id()))
            .collect();

        let root = document
            .select(&BODY_SELECTOR)
            .next()
            .unwrap_or_else(|| document.root_element());

        let mut text = String::new();
        for node in root.descendants() {
            if let Node::Text(fragment) = node.value() {
                if node.ancestors().any(|ancestor| excluded.contains(&ancestor.id())) {
                    continue;
                }
                text.push_str(fragment);
                text.push(' ');
            }
        }

        collapse_whitespace(&text)
    }
}

fn style_sources(document: &Html) -> Vec<String> {
    let mut sources = Vec::new();
    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };

        if let Some(style) = element.value().attr("style") {
            let style = style.trim();
            if !style.is_empty() {
                sources.push(style.to_string());
            }
        }

        if element.value().name() == "style" {
            let block = element.text().collect::<String>();
            if !block.trim().is_empty() {
                sources.push(block);
            }
        }
    }
    sources
}

fn meta_name_is(meta: &ElementRef, name: &str) -> bool {
    meta.value()
        .attr("name")
        .is_some_and(|value| value.trim().eq_ignore_ascii_case(name))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
