//! Platform detection from HTML signatures

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, instrument};

use crate::classifier::rules::{PlatformRule, Signature};
use crate::classifier::{compare_labels, ClassificationError, ScoredLabel};

static GENERATOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[name]").expect("static selector must parse"));

#[derive(Debug)]
struct CompiledPlatform {
    name: String,
    substrings: Vec<String>,
    generators: Vec<String>,
    selectors: Vec<Selector>,
}

impl CompiledPlatform {
    fn total(&self) -> usize {
        self.substrings.len() + self.generators.len() + self.selectors.len()
    }
}

/// Matches raw HTML against per-platform signature tables
#[derive(Debug)]
pub struct SignatureMatcher {
    platforms: Vec<CompiledPlatform>,
    needs_document: bool,
}

impl SignatureMatcher {
    /// Compile a platform table
    ///
    /// Duplicate signatures within a platform count once. Platforms without
    /// signatures never match.
    pub fn new(rules: &[PlatformRule]) -> Result<Self, ClassificationError> {
        let mut platforms = Vec::with_capacity(rules.len());

        for rule in rules {
            let mut seen = HashSet::new();
            let mut compiled = CompiledPlatform {
                name: rule.name.clone(),
                substrings: Vec::new(),
                generators: Vec::new(),
                selectors: Vec::new(),
            };

            for signature in &rule.signatures {
                let key = match signature {
                    Signature::Selector(s) => Signature::Selector(s.trim().to_string()),
                    Signature::Substring(s) => Signature::Substring(s.to_lowercase()),
                    Signature::Generator(s) => Signature::Generator(s.to_lowercase()),
                };
                if !seen.insert(key.clone()) {
                    continue;
                }

                match key {
                    Signature::Substring(s) => compiled.substrings.push(s),
                    Signature::Generator(s) => compiled.generators.push(s),
                    Signature::Selector(s) => {
                        let selector = Selector::parse(&s).map_err(|_| {
                            ClassificationError::InvalidSelector {
                                platform: rule.name.clone(),
                                selector: s.clone(),
                            }
                        })?;
                        compiled.selectors.push(selector);
                    }
                }
            }

            if compiled.total() == 0 {
                debug!("Platform '{}' has no signatures and will never match", rule.name);
            }
            platforms.push(compiled);
        }

        let needs_document = platforms
            .iter()
            .any(|p| !p.generators.is_empty() || !p.selectors.is_empty());

        Ok(Self {
            platforms,
            needs_document,
        })
    }

    /// Detect platforms in a page
    ///
    /// # Arguments
    ///
    /// * `html` - The raw HTML of the page
    ///
    /// # Returns
    ///
    /// Matched platforms with confidence = matched signatures / total
    /// signatures, sorted by descending confidence then name
    #[instrument(skip_all, level = "debug")]
    pub fn detect(&self, html: &str) -> Result<Vec<ScoredLabel>, ClassificationError> {
        if html.trim().is_empty() {
            return Ok(Vec::new());
        }

        let lower = html.to_lowercase();
        let document = self.needs_document.then(|| Html::parse_document(html));
        let generators: Vec<String> = document
            .as_ref()
            .map(|doc| {
                doc.select(&GENERATOR_SELECTOR)
                    .filter(|meta| {
                        meta.value()
                            .attr("name")
                            .is_some_and(|name| name.trim().eq_ignore_ascii_case("generator"))
                    })
                    .filter_map(|meta| meta.value().attr("content"))
                    .map(str::to_lowercase)
                    .collect()
            })
            .unwrap_or_default();

        let mut labels = Vec::new();
        for platform in &self.platforms {
            let total = platform.total();
            if total == 0 {
                continue;
            }

            let substring_hits = platform
                .substrings
                .iter()
                .filter(|s| lower.contains(s.as_str()))
                .count();
            let generator_hits = platform
                .generators
                .iter()
                .filter(|g| generators.iter().any(|content| content.contains(g.as_str())))
                .count();
            let selector_hits = document.as_ref().map_or(0, |doc| {
                platform
                    .selectors
                    .iter()
                    .filter(|selector| doc.select(selector).next().is_some())
                    .count()
            });

            let matched = substring_hits + generator_hits + selector_hits;
            if matched == 0 {
                continue;
            }

            let confidence = (matched as f64 / total as f64).min(1.0);
            labels.push(ScoredLabel::new(platform.name.as_str(), confidence)?);
        }

        labels.sort_by(compare_labels);
        debug!("Detected {} platforms", labels.len());
        Ok(labels)
    }
}
