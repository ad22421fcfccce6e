//! Government RSS feeds.
//!
//! Three fixed korea.kr department feeds are fetched concurrently and parsed
//! with feed-rs. A feed that fails to download or parse contributes nothing.
//! The combined list is deduplicated by link and sorted newest first.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::fetch::{FetchConfig, Fetcher};
use crate::text::{clean_html, clean_text};
use crate::{NongjeongError, Result};

pub const FEED_USER_AGENT: &str = "rss-news/1.0";

/// Title used when an entry has none.
pub const UNTITLED: &str = "(제목 없음)";

/// A feed endpoint and the label its entries are attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub url: String,
    pub label: String,
}

impl FeedSource {
    pub fn new(url: &str, label: &str) -> Self {
        Self { url: url.to_string(), label: label.to_string() }
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub feeds: Vec<FeedSource>,
    /// Per-feed timeout in seconds.
    pub timeout: u64,
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feeds: vec![
                FeedSource::new("https://www.korea.kr/rss/dept_mafra.xml", "농림축산식품부"),
                FeedSource::new("https://www.korea.kr/rss/dept_kostat.xml", "통계청"),
                FeedSource::new("https://www.korea.kr/rss/dept_rda.xml", "농촌진흥청"),
            ],
            timeout: 10,
            user_agent: FEED_USER_AGENT.to_string(),
        }
    }
}

/// One feed entry, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RssArticle {
    pub id: String,
    /// Department label, e.g. `통계청`.
    pub source: String,
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Sanitized HTML.
    pub description: String,
}

/// The entry's alternate link, else any link, else an http(s) id.
fn entry_link(entry: &Entry) -> String {
    let href = entry
        .links
        .iter()
        .find(|link| {
            !link.href.trim().is_empty()
                && link.rel.as_deref().is_none_or(|rel| rel.is_empty() || rel.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| entry.links.iter().find(|link| !link.href.trim().is_empty()))
        .map(|link| link.href.trim().to_string());

    href.unwrap_or_else(|| {
        let id = entry.id.trim();
        if id.starts_with("http://") || id.starts_with("https://") { id.to_string() } else { String::new() }
    })
}

fn to_article(entry: &Entry, feed: &FeedSource) -> RssArticle {
    let link = entry_link(entry);
    let raw_title = entry.title.as_ref().map(|t| t.content.as_str()).unwrap_or_default();
    let title = match clean_text(raw_title) {
        cleaned if cleaned.is_empty() => UNTITLED.to_string(),
        cleaned => cleaned,
    };

    let id = [entry.id.trim(), link.as_str(), title.as_str()]
        .into_iter()
        .find(|candidate| !candidate.is_empty())
        .unwrap_or_default()
        .to_string();

    let raw_description = entry
        .summary
        .as_ref()
        .map(|summary| summary.content.clone())
        .or_else(|| entry.content.as_ref().and_then(|content| content.body.clone()))
        .unwrap_or_default();

    RssArticle {
        id,
        source: feed.label.clone(),
        title,
        link,
        published_at: entry.published.or(entry.updated),
        description: clean_html(&raw_description),
    }
}

/// Parses an RSS or Atom payload into articles attributed to `feed`.
pub fn parse_feed(bytes: &[u8], feed: &FeedSource) -> Result<Vec<RssArticle>> {
    let parsed = feed_rs::parser::parse(bytes)
        .map_err(|e| NongjeongError::Feed { url: feed.url.clone(), message: e.to_string() })?;

    Ok(parsed.entries.iter().map(|entry| to_article(entry, feed)).collect())
}

/// Keeps the first article per non-empty link, then sorts newest first with
/// undated articles last. The sort is stable.
pub fn dedup_and_sort(articles: Vec<RssArticle>) -> Vec<RssArticle> {
    let mut seen = HashSet::new();
    let mut unique: Vec<RssArticle> = articles
        .into_iter()
        .filter(|article| article.link.is_empty() || seen.insert(article.link.clone()))
        .collect();

    unique.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    unique
}

/// Fetches and merges the configured feeds.
#[derive(Debug, Clone)]
pub struct FeedAggregator {
    fetcher: Fetcher,
    feeds: Vec<FeedSource>,
}

impl FeedAggregator {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let fetch = FetchConfig { timeout: config.timeout, user_agent: config.user_agent.clone(), ..FetchConfig::default() };
        Ok(Self { fetcher: Fetcher::new(&fetch)?, feeds: config.feeds.clone() })
    }

    pub fn feeds(&self) -> &[FeedSource] {
        &self.feeds
    }

    pub async fn fetch_feed(&self, feed: &FeedSource) -> Result<Vec<RssArticle>> {
        let bytes = self.fetcher.fetch_bytes(&feed.url, Duration::ZERO).await?;
        let articles = parse_feed(&bytes, feed)?;
        debug!(feed = %feed.label, entries = articles.len(), "feed parsed");
        Ok(articles)
    }

    /// All feeds concurrently. Never fails; broken feeds are logged and skipped.
    pub async fn fetch_all(&self) -> Vec<RssArticle> {
        let results = join_all(self.feeds.iter().map(|feed| self.fetch_feed(feed))).await;

        let mut articles = Vec::new();
        for (feed, result) in self.feeds.iter().zip(results) {
            match result {
                Ok(mut entries) => articles.append(&mut entries),
                Err(err) => warn!(feed = %feed.label, url = %feed.url, error = %err, "feed skipped"),
            }
        }

        let merged = dedup_and_sort(articles);
        info!(articles = merged.len(), "feeds merged");
        merged
    }
}
