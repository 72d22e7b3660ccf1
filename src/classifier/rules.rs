//! # Rule Set Module
//!
//! The signature, keyword and stopword tables the classifiers are built from.
//! A `RuleSet` is plain data: it can be the built-in default, loaded from a
//! JSON file, or a small fixture table in tests.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "platforms": [
//!     { "name": "WordPress", "signatures": [
//!         { "substring": "/wp-content/" },
//!         { "generator": "WordPress" },
//!         { "selector": "link[href*='wp-includes']" }
//!     ] }
//!   ],
//!   "industries": [
//!     { "name": "SaaS", "keywords": [
//!         { "term": "saas", "weight": 2.0 },
//!         { "term": "subscription" }
//!     ] }
//!   ],
//!   "stopwords": ["the", "and"]
//! }
//! ```
//!
//! Keyword weights default to 1.0 when omitted.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::{normalize_text, ClassificationError};

/// A marker associated with a platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signature {
    /// Case-insensitive substring of the raw HTML
    Substring(String),
    /// Case-insensitive substring of a `<meta name="generator">` content
    Generator(String),
    /// CSS selector that must match at least one element
    Selector(String),
}

impl Signature {
    /// The pattern text regardless of kind
    pub fn pattern(&self) -> &str {
        match self {
            Signature::Substring(s) | Signature::Generator(s) | Signature::Selector(s) => s,
        }
    }
}

/// Signatures for one platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRule {
    /// Display name of the platform
    pub name: String,

    /// Signatures known for the platform
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

/// A keyword and the weight it contributes when present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedKeyword {
    /// Keyword or phrase
    pub term: String,

    /// Contribution to the industry score
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// Keywords for one industry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryRule {
    /// Display name of the industry
    pub name: String,

    /// Weighted keywords
    pub keywords: Vec<WeightedKeyword>,
}

/// All tables the classifiers use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Platform signature table
    #[serde(default)]
    pub platforms: Vec<PlatformRule>,

    /// Industry keyword table
    #[serde(default)]
    pub industries: Vec<IndustryRule>,

    /// Words never emitted as tags
    #[serde(default)]
    pub stopwords: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleSet {
    /// Load and validate a rule set from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ClassificationError> {
        let path = path.as_ref();
        debug!("Loading rule set from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse and validate a rule set from JSON text
    pub fn from_json(json: &str) -> Result<Self, ClassificationError> {
        let rules: RuleSet = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Serialize the rule set as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, ClassificationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check names are unique and keywords carry usable weights
    pub fn validate(&self) -> Result<(), ClassificationError> {
        let mut seen = HashSet::new();
        for platform in &self.platforms {
            if platform.name.trim().is_empty() {
                return Err(ClassificationError::InvalidRule(
                    "platform with empty name".to_string(),
                ));
            }
            if !seen.insert(platform.name.as_str()) {
                return Err(ClassificationError::InvalidRule(format!(
                    "duplicate platform '{}'",
                    platform.name
                )));
            }
            if platform.signatures.iter().any(|s| s.pattern().trim().is_empty()) {
                return Err(ClassificationError::InvalidRule(format!(
                    "empty signature for platform '{}'",
                    platform.name
                )));
            }
        }

        let mut seen = HashSet::new();
        for industry in &self.industries {
            if industry.name.trim().is_empty() {
                return Err(ClassificationError::InvalidRule(
                    "industry with empty name".to_string(),
                ));
            }
            if !seen.insert(industry.name.as_str()) {
                return Err(ClassificationError::InvalidRule(format!(
                    "duplicate industry '{}'",
                    industry.name
                )));
            }
            if industry.keywords.is_empty() {
                return Err(ClassificationError::InvalidRule(format!(
                    "industry '{}' has no keywords",
                    industry.name
                )));
            }
            for keyword in &industry.keywords {
                if normalize_text(&keyword.term).is_empty() {
                    return Err(ClassificationError::InvalidRule(format!(
                        "empty keyword for industry '{}'",
                        industry.name
                    )));
                }
                if !keyword.weight.is_finite() || keyword.weight <= 0.0 {
                    return Err(ClassificationError::InvalidRule(format!(
                        "keyword '{}' of industry '{}' has weight {}",
                        keyword.term, industry.name, keyword.weight
                    )));
                }
            }
        }

        Ok(())
    }

    /// The built-in tables
    pub fn builtin() -> Self {
        Self {
            platforms: builtin_platforms(),
            industries: builtin_industries(),
            stopwords: BUILTIN_STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn substring(s: &str) -> Signature {
    Signature::Substring(s.to_string())
}

fn generator(s: &str) -> Signature {
    Signature::Generator(s.to_string())
}

fn selector(s: &str) -> Signature {
    Signature::Selector(s.to_string())
}

fn platform(name: &str, signatures: Vec<Signature>) -> PlatformRule {
    PlatformRule {
        name: name.to_string(),
        signatures,
    }
}

fn builtin_platforms() -> Vec<PlatformRule> {
    vec![
        platform(
            "WordPress",
            vec![
                substring("/wp-content/"),
                substring("/wp-includes/"),
                substring("wp-json"),
                generator("WordPress"),
            ],
        ),
        platform(
            "WooCommerce",
            vec![
                substring("woocommerce"),
                substring("wc-block"),
                generator("WooCommerce"),
            ],
        ),
        platform(
            "Webflow",
            vec![
                substring("webflow.js"),
                substring("website-files.com"),
                selector("[data-wf-page]"),
                generator("Webflow"),
            ],
        ),
        platform(
            "Shopify",
            vec![
                substring("cdn.shopify.com"),
                substring("shopify-section"),
                substring("Shopify.theme"),
                substring("shopify-digital-wallet"),
            ],
        ),
        platform(
            "Wix",
            vec![
                substring("wixstatic.com"),
                substring("parastorage.com"),
                substring("wixsite.com"),
                generator("Wix.com"),
            ],
        ),
        platform(
            "Squarespace",
            vec![
                substring("static1.squarespace.com"),
                substring("Static.SQUARESPACE_CONTEXT"),
                substring("squarespace-cdn.com"),
            ],
        ),
        platform(
            "Framer",
            vec![
                substring("framerusercontent.com"),
                substring("data-framer-"),
                generator("Framer"),
            ],
        ),
        platform(
            "Ghost",
            vec![
                substring("ghost.io"),
                substring("ghost-content-api"),
                generator("Ghost"),
            ],
        ),
        platform(
            "Kajabi",
            vec![
                substring("kajabi.com"),
                substring("cdn.kajabi.com"),
                substring("kajabi-storefront"),
            ],
        ),
        platform(
            "Bubble",
            vec![
                substring("bubble.io"),
                substring("bubble.is"),
                substring("bubbleapps.io"),
            ],
        ),
        platform(
            "Magento",
            vec![
                substring("Mage.Cookies"),
                substring("Magento_"),
                substring("text/x-magento-init"),
            ],
        ),
        platform(
            "Drupal",
            vec![
                substring("drupal-settings-json"),
                substring("/sites/default/files/"),
                substring("Drupal.settings"),
                generator("Drupal"),
            ],
        ),
        platform(
            "Joomla",
            vec![
                substring("com_content"),
                substring("/media/jui/"),
                generator("Joomla"),
            ],
        ),
        platform(
            "Next.js",
            vec![
                substring("/_next/static/"),
                selector("script#__NEXT_DATA__"),
                generator("Next.js"),
            ],
        ),
        platform(
            "Nuxt",
            vec![
                substring("/_nuxt/"),
                substring("__NUXT__"),
                selector("#__nuxt"),
            ],
        ),
        platform(
            "Gatsby",
            vec![
                substring("___gatsby"),
                substring("/page-data/"),
                generator("Gatsby"),
            ],
        ),
        platform(
            "Laravel",
            vec![
                substring("laravel_session"),
                substring("livewire"),
                substring("laravel"),
            ],
        ),
        platform(
            "Weebly",
            vec![substring("weebly.com"), substring("weebly.cloud")],
        ),
        platform(
            "Notion",
            vec![
                substring("notion.site"),
                substring("notion.so"),
                substring("notion-api"),
            ],
        ),
        platform(
            "Carrd",
            vec![substring("carrd.co"), substring("carrd.co/assets")],
        ),
        platform(
            "Tilda",
            vec![substring("tilda.ws"), substring("tilda.cc")],
        ),
        platform(
            "Thinkific",
            vec![substring("thinkific.com"), substring("thinkific")],
        ),
        platform(
            "Teachable",
            vec![substring("teachable.com"), substring("teachablecdn")],
        ),
        platform(
            "ClickFunnels",
            vec![substring("clickfunnels.com"), substring("clickfunnels")],
        ),
        platform(
            "HubSpot CMS",
            vec![
                substring("hs-scripts.com"),
                substring("hs-sites.com"),
                substring("hubspotusercontent"),
                generator("HubSpot"),
            ],
        ),
        platform(
            "React",
            vec![
                substring("data-reactroot"),
                substring("react-dom"),
                substring("ReactDOM"),
            ],
        ),
        platform(
            "Vue",
            vec![
                substring("vue.js"),
                substring("__VUE__"),
                selector("[data-v-app]"),
            ],
        ),
    ]
}

/// The first term defines the industry and weighs double
fn industry(name: &str, terms: &[&str]) -> IndustryRule {
    IndustryRule {
        name: name.to_string(),
        keywords: terms
            .iter()
            .enumerate()
            .map(|(i, term)| WeightedKeyword {
                term: term.to_string(),
                weight: if i == 0 { 2.0 } else { 1.0 },
            })
            .collect(),
    }
}

fn builtin_industries() -> Vec<IndustryRule> {
    vec![
        industry(
            "SaaS",
            &["saas", "software", "platform", "api", "dashboard", "cloud", "subscription"],
        ),
        industry(
            "E-commerce",
            &["ecommerce", "shop", "store", "cart", "checkout", "product", "buy", "e-commerce"],
        ),
        industry(
            "Blog",
            &["blog", "post", "article", "writing", "newsletter"],
        ),
        industry(
            "Portfolio",
            &["portfolio", "projects", "case study", "resume", "cv", "work"],
        ),
        industry(
            "Agency",
            &["agency", "studio", "consulting", "solutions", "services", "we help"],
        ),
        industry(
            "Education",
            &["education", "course", "academy", "learning", "training", "teach", "school"],
        ),
        industry(
            "Finance",
            &["finance", "bank", "loan", "investment", "crypto", "trading", "payment"],
        ),
        industry(
            "Healthcare",
            &["health", "clinic", "medical", "doctor", "wellness", "hospital", "care"],
        ),
        industry(
            "Community",
            &["community", "forum", "members", "discord", "slack", "network"],
        ),
        industry(
            "Marketplace",
            &["marketplace", "market", "vendors", "listings", "buyers", "sellers"],
        ),
        industry(
            "Media",
            &["media", "news", "magazine", "articles", "content", "publish"],
        ),
        industry(
            "Fitness",
            &["fitness", "gym", "workout", "training", "sports", "athlete"],
        ),
        industry(
            "Real Estate",
            &["real estate", "property", "listing", "rent", "housing", "realtor"],
        ),
        industry(
            "Restaurant",
            &["restaurant", "menu", "food", "cafe", "dining", "reservation"],
        ),
        industry(
            "Travel",
            &["travel", "hotel", "booking", "tour", "vacation", "trip"],
        ),
        industry(
            "Nonprofit",
            &["nonprofit", "ngo", "charity", "foundation", "donation", "cause"],
        ),
        industry(
            "Technology",
            &["technology", "developer", "engineering", "software", "open source"],
        ),
        industry(
            "Marketing",
            &["marketing", "seo", "ads", "campaign", "branding", "growth"],
        ),
    ]
}

const BUILTIN_STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "this", "that", "from", "your", "you", "are", "was", "were",
    "has", "have", "will", "our", "their", "they", "them", "into", "about", "all", "can", "get",
    "not", "but", "what", "when", "where", "which", "who", "how", "why", "more", "also", "than",
    "then", "there", "these", "those", "its", "just", "like", "one", "out", "new", "use", "any",
    "each", "only", "over", "such", "some", "other", "been", "being", "his", "her", "she", "him",
    "here", "may", "most", "very", "off", "per", "www", "com", "http", "https", "us", "we",
];
