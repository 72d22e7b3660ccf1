//! Industry classification from weighted keyword lists

use tracing::{debug, instrument};

use crate::classifier::rules::IndustryRule;
use crate::classifier::{compare_labels, normalize_text, ClassificationError, ScoredLabel};

/// Industries scoring below this confidence are dropped
pub const DEFAULT_INDUSTRY_THRESHOLD: f64 = 0.15;

/// Maximum number of industries kept per page
pub const DEFAULT_MAX_INDUSTRIES: usize = 5;

#[derive(Debug)]
struct CompiledIndustry {
    name: String,
    /// Normalized keyword padded with spaces for whole-token matching
    keywords: Vec<(String, f64)>,
    total_weight: f64,
}

/// Scores text against per-industry keyword lists
#[derive(Debug)]
pub struct KeywordClassifier {
    industries: Vec<CompiledIndustry>,
    threshold: f64,
    max_labels: usize,
}

impl KeywordClassifier {
    /// Compile an industry table
    ///
    /// # Arguments
    ///
    /// * `rules` - Industry keyword table
    /// * `threshold` - Minimum confidence for an industry to be reported
    /// * `max_labels` - Maximum number of industries reported
    pub fn new(
        rules: &[IndustryRule],
        threshold: f64,
        max_labels: usize,
    ) -> Result<Self, ClassificationError> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(ClassificationError::InvalidRule(format!(
                "industry threshold {} outside [0, 1]",
                threshold
            )));
        }

        let mut industries = Vec::with_capacity(rules.len());
        for rule in rules {
            let mut keywords: Vec<(String, f64)> = Vec::new();
            for keyword in &rule.keywords {
                let normalized = normalize_text(&keyword.term);
                if normalized.is_empty() {
                    continue;
                }
                let padded = format!(" {} ", normalized);
                // A keyword repeated in the table contributes once, with its larger weight
                match keywords.iter_mut().find(|(term, _)| *term == padded) {
                    Some((_, weight)) => *weight = weight.max(keyword.weight),
                    None => keywords.push((padded, keyword.weight)),
                }
            }

            let total_weight: f64 = keywords.iter().map(|(_, weight)| weight).sum();
            if !total_weight.is_finite() || total_weight <= 0.0 {
                return Err(ClassificationError::InvalidRule(format!(
                    "industry '{}' has no positive keyword weight",
                    rule.name
                )));
            }

            industries.push(CompiledIndustry {
                name: rule.name.clone(),
                keywords,
                total_weight,
            });
        }

        Ok(Self {
            industries,
            threshold,
            max_labels,
        })
    }

    /// The configured confidence threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify text into industries
    ///
    /// A keyword contributes its weight once if present, however often it
    /// appears. Confidence is the matched weight over the industry's total
    /// weight.
    #[instrument(skip_all, level = "debug")]
    pub fn classify(&self, text: &str) -> Result<Vec<ScoredLabel>, ClassificationError> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }
        let haystack = format!(" {} ", normalized);

        let mut labels = Vec::new();
        for industry in &self.industries {
            let matched: f64 = industry
                .keywords
                .iter()
                .filter(|(term, _)| haystack.contains(term.as_str()))
                .map(|(_, weight)| weight)
                .sum();

            if matched <= 0.0 {
                continue;
            }

            // Compared after rounding so no emitted label sits under the threshold
            let confidence = (matched / industry.total_weight).clamp(0.0, 1.0);
            let label = ScoredLabel::new(industry.name.as_str(), confidence)?;
            if label.confidence >= self.threshold {
                labels.push(label);
            }
        }

        labels.sort_by(compare_labels);
        labels.truncate(self.max_labels);
        debug!("Classified into {} industries", labels.len());
        Ok(labels)
    }
}
