//! Scraped article record.
//!
//! [`NewsItem`] is what a site scrape emits: a sanitized body together with
//! the metadata recovered from the detail page. Field names serialize in
//! camelCase (`publishedAt`), matching the JSON served over HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sites::Source;
use crate::text::{excerpt, html_to_text};

/// One scraped article.
///
/// `id` and `url` are both the canonical article URL. `title` is never empty,
/// `content` is already sanitized and `images` holds at most six absolute URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    /// Outlet label, e.g. `농민신문`.
    pub source: Source,
    /// Outlet key, e.g. `nongmin`.
    pub key: String,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl NewsItem {
    /// Plain text of the body, for terminals and previews.
    pub fn text_content(&self) -> String {
        html_to_text(&self.content)
    }

    /// First `max_chars` characters of the body text, with an ellipsis when cut.
    pub fn excerpt(&self, max_chars: usize) -> String {
        excerpt(&self.content, max_chars)
    }
}
