//! Brand color extraction from meta tags and CSS

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::extractor::ExtractedContent;

/// Style text scanned per page before giving up
pub const DEFAULT_MAX_STYLE_BYTES: usize = 50_000;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|[;{\s"])(background-color|background|color)\s*:\s*([^;}]*)"#)
        .expect("static regex must compile")
});

/// `url(...)` references, whose `#fragment` is not a color
static URL_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)url\([^)]*\)").expect("static regex must compile")
});

static HEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)#([0-9a-f]{6}|[0-9a-f]{3})\b").expect("static regex must compile")
});

/// Normalize a hex color to lowercase `#rrggbb`
///
/// Accepts `#rgb` and `#rrggbb` (surrounding whitespace ignored). Anything
/// else returns `None`.
pub fn normalize_hex(value: &str) -> Option<String> {
    let digits = value.trim().strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let digits = digits.to_ascii_lowercase();
    match digits.len() {
        6 => Some(format!("#{}", digits)),
        3 => Some(digits.chars().fold(String::from("#"), |mut out, c| {
            out.push(c);
            out.push(c);
            out
        })),
        _ => None,
    }
}

/// Up to two distinct representative colors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

impl ColorPair {
    fn from_colors(mut colors: Vec<String>) -> Self {
        let secondary = (colors.len() > 1).then(|| colors.remove(1));
        let primary = colors.into_iter().next();
        Self { primary, secondary }
    }

    /// Whether no color was found
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }
}

/// Selects brand colors from meta tags, then CSS declarations
#[derive(Debug, Clone)]
pub struct ColorExtractor {
    max_style_bytes: usize,
}

impl Default for ColorExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STYLE_BYTES)
    }
}

impl ColorExtractor {
    /// Create a color extractor that reads at most `max_style_bytes` of CSS
    pub fn new(max_style_bytes: usize) -> Self {
        Self { max_style_bytes }
    }

    /// Pick up to two distinct colors
    ///
    /// Meta colors win over CSS. In CSS only `color`, `background-color` and
    /// `background` declarations count, scanned in document order.
    #[instrument(skip_all, level = "debug")]
    pub fn extract(&self, content: &ExtractedContent) -> ColorPair {
        let mut colors: Vec<String> = Vec::with_capacity(2);

        for value in &content.meta_colors {
            if let Some(hex) = normalize_hex(value) {
                push(&mut colors, hex);
            }
        }

        let mut budget = self.max_style_bytes;
        for source in &content.style_sources {
            if colors.len() >= 2 || budget == 0 {
                break;
            }

            let scanned = truncate_at_char_boundary(source, budget);
            budget -= scanned.len();

            for declaration in DECLARATION.captures_iter(scanned) {
                let Some(value) = declaration.get(2) else {
                    continue;
                };
                let value = URL_FUNCTION.replace_all(value.as_str(), " ");
                for hex in HEX.find_iter(&value) {
                    if let Some(hex) = normalize_hex(hex.as_str()) {
                        push(&mut colors, hex);
                    }
                }
                if colors.len() >= 2 {
                    break;
                }
            }
        }

        debug!("Found {} colors", colors.len());
        ColorPair::from_colors(colors)
    }
}

fn push(colors: &mut Vec<String>, value: String) {
    if colors.len() < 2 && !colors.contains(&value) {
        colors.push(value);
    }
}

fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
