//! Generic main-content extraction.
//!
//! Used when no site selector and no printable view produced a body. The page
//! is cleaned with [`PreprocessConfig::document`], paragraph-level elements are
//! scored and their scores flow to the parent (in full) and grandparent (half).
//! The best container, scaled by its link density, wins; qualifying siblings
//! are appended in document order.
//!
//! # Example
//!
//! ```rust
//! use nongjeong_core::readability::{Readability, ReadabilityConfig};
//!
//! let reader = Readability::with_config(ReadabilityConfig::builder().min_score(5.0).char_threshold(10).build());
//! let html = "<html><body><div><p>쌀 수확량이 늘었다, 올해도 풍년이다, 농가 소득도 오를 전망이다.</p></div></body></html>";
//! let body = reader.extract(html, "https://www.nongmin.com/article/1");
//! assert!(body.is_some());
//! ```

use std::collections::HashMap;

use url::Url;

use crate::extract::{ExtractedBody, images_from};
use crate::parse::{Document, Element};
use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::scoring::{ScoreConfig, base_tag_score, calculate_score, class_id_weight, link_density};
use crate::text::visible_text_len;

/// Elements whose own text is scored.
const PARAGRAPH_TAGS: &str = "p, td, pre, blockquote";

/// Configuration for the generic extractor.
///
/// # Example
///
/// ```rust
/// use nongjeong_core::readability::ReadabilityConfig;
///
/// let config = ReadabilityConfig::builder()
///     .min_score(15.0)
///     .char_threshold(300)
///     .build();
/// assert_eq!(config.max_images, 6);
/// ```
#[derive(Debug, Clone)]
pub struct ReadabilityConfig {
    /// Minimum score the top container must reach (default: 10.0).
    pub min_score: f64,

    /// Minimum visible characters in the extracted body (default: 200).
    pub char_threshold: usize,

    /// Paragraphs shorter than this are not scored (default: 25).
    pub min_paragraph_chars: usize,

    /// Siblings scoring at least this fraction of the top score are kept (default: 0.2).
    pub sibling_threshold: f64,

    /// Maximum paragraphs to score (0 = unlimited, default: 0).
    pub max_elems_to_parse: usize,

    /// Maximum images returned with the body (default: 6).
    pub max_images: usize,
}

impl Default for ReadabilityConfig {
    fn default() -> Self {
        Self {
            min_score: 10.0,
            char_threshold: 200,
            min_paragraph_chars: 25,
            sibling_threshold: 0.2,
            max_elems_to_parse: 0,
            max_images: 6,
        }
    }
}

impl ReadabilityConfig {
    pub fn builder() -> ReadabilityConfigBuilder {
        ReadabilityConfigBuilder::new()
    }
}

/// Builder for ReadabilityConfig.
pub struct ReadabilityConfigBuilder {
    config: ReadabilityConfig,
}

impl ReadabilityConfigBuilder {
    pub fn new() -> Self {
        Self { config: ReadabilityConfig::default() }
    }

    pub fn min_score(mut self, value: f64) -> Self {
        self.config.min_score = value;
        self
    }

    pub fn char_threshold(mut self, value: usize) -> Self {
        self.config.char_threshold = value;
        self
    }

    pub fn min_paragraph_chars(mut self, value: usize) -> Self {
        self.config.min_paragraph_chars = value;
        self
    }

    pub fn sibling_threshold(mut self, value: f64) -> Self {
        self.config.sibling_threshold = value;
        self
    }

    pub fn max_elems_to_parse(mut self, value: usize) -> Self {
        self.config.max_elems_to_parse = value;
        self
    }

    pub fn max_images(mut self, value: usize) -> Self {
        self.config.max_images = value;
        self
    }

    pub fn build(self) -> ReadabilityConfig {
        self.config
    }
}

impl Default for ReadabilityConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Main entry point for generic content extraction.
#[derive(Debug, Clone, Default)]
pub struct Readability {
    config: ReadabilityConfig,
    score_config: ScoreConfig,
}

impl Readability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReadabilityConfig) -> Self {
        Self { config, score_config: ScoreConfig::default() }
    }

    pub fn config(&self) -> &ReadabilityConfig {
        &self.config
    }

    /// Extracts the main body of a full page fetched from `url`.
    ///
    /// Returns `None` when no container reaches `min_score` or the result is
    /// shorter than `char_threshold` visible characters.
    pub fn extract(&self, html: &str, url: &str) -> Option<ExtractedBody> {
        let base_url = Url::parse(url).ok();
        let cleaned = preprocess_html(html, &PreprocessConfig::document(base_url.clone()));
        let doc = Document::parse_with_url(&cleaned, url);

        let paragraphs = doc.select(PARAGRAPH_TAGS).ok()?;
        let limit = if self.config.max_elems_to_parse == 0 { usize::MAX } else { self.config.max_elems_to_parse };

        let mut scores = HashMap::new();
        let mut containers: Vec<Element<'_>> = Vec::new();

        for paragraph in paragraphs.iter().take(limit) {
            if paragraph.text().trim().chars().count() < self.config.min_paragraph_chars {
                continue;
            }

            let score = 1.0 + calculate_score(paragraph, &self.score_config).final_score;
            let ancestors = [paragraph.parent(), paragraph.parent().and_then(|p| p.parent())];

            for (level, ancestor) in ancestors.into_iter().enumerate() {
                let Some(ancestor) = ancestor else {
                    break;
                };
                if matches!(ancestor.tag_name().as_str(), "body" | "html") {
                    break;
                }

                let entry = scores.entry(ancestor.id()).or_insert_with(|| {
                    containers.push(ancestor.clone());
                    base_tag_score(&ancestor) + class_id_weight(&ancestor, &self.score_config)
                });
                *entry += if level == 0 { score } else { score / 2.0 };
            }
        }

        let (top, top_score) = containers
            .iter()
            .map(|el| (el, scores[&el.id()] * (1.0 - link_density(el))))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;

        if top_score < self.config.min_score {
            return None;
        }

        let threshold = top_score * self.config.sibling_threshold;
        let siblings = top.parent().map(|parent| parent.children()).unwrap_or_default();
        let html = if siblings.is_empty() {
            top.outer_html()
        } else {
            siblings
                .iter()
                .filter(|sibling| {
                    sibling.id() == top.id() || self.keeps_sibling(sibling, scores.get(&sibling.id()).copied(), threshold)
                })
                .map(Element::outer_html)
                .collect::<Vec<_>>()
                .join("\n")
        };

        if visible_text_len(&html) < self.config.char_threshold {
            return None;
        }

        let images = images_from(&html, base_url.as_ref(), self.config.max_images);
        Some(ExtractedBody { html, images })
    }

    /// Scored siblings close to the top score, or unscored paragraphs that read like prose.
    fn keeps_sibling(&self, sibling: &Element<'_>, score: Option<f64>, threshold: f64) -> bool {
        let density = link_density(sibling);
        if let Some(score) = score
            && score * (1.0 - density) >= threshold
        {
            return true;
        }

        sibling.tag_name() == "p" && sibling.text().trim().chars().count() > 80 && density < 0.25
    }
}
