//! Unified timeline of feed entries and scraped articles.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::article::NewsItem;
use crate::feed::RssArticle;
use crate::sites::Source;

/// Where a timeline entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Origin {
    Rss,
    Scrape,
}

/// One row of the merged timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedItem {
    pub id: String,
    pub from: Origin,
    pub source_key: String,
    pub source_label: String,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

impl From<&RssArticle> for UnifiedItem {
    fn from(article: &RssArticle) -> Self {
        Self {
            id: article.id.clone(),
            from: Origin::Rss,
            source_key: article.source.clone(),
            source_label: article.source.clone(),
            title: article.title.clone(),
            url: article.link.clone(),
            published_at: article.published_at,
            html: non_empty(&article.description),
        }
    }
}

impl From<&NewsItem> for UnifiedItem {
    fn from(item: &NewsItem) -> Self {
        Self {
            id: item.id.clone(),
            from: Origin::Scrape,
            source_key: item.key.clone(),
            source_label: item.source.label().to_string(),
            title: item.title.clone(),
            url: item.url.clone(),
            published_at: item.published_at,
            html: non_empty(&item.content).or_else(|| item.description.clone()),
        }
    }
}

/// What a single [`Timeline::merge`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: usize,
    pub duplicates: usize,
}

/// Accumulates batches, keeping the first entry seen for each URL.
///
/// After every merge the entries are stably re-sorted newest first; undated
/// entries sort oldest. Entries with an empty URL are dropped.
///
/// ```rust
/// use nongjeong_core::merge::{Origin, Timeline, UnifiedItem};
///
/// let item = |url: &str| UnifiedItem {
///     id: url.into(),
///     from: Origin::Rss,
///     source_key: "통계청".into(),
///     source_label: "통계청".into(),
///     title: "보도자료".into(),
///     url: url.into(),
///     published_at: None,
///     html: None,
/// };
///
/// let mut timeline = Timeline::new();
/// timeline.merge(vec![item("https://a"), item("https://b")]);
/// let outcome = timeline.merge(vec![item("https://b")]);
/// assert_eq!(outcome.duplicates, 1);
/// assert_eq!(timeline.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    items: Vec<UnifiedItem>,
    seen: HashSet<String>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge<I>(&mut self, batch: I) -> MergeOutcome
    where
        I: IntoIterator<Item = UnifiedItem>,
    {
        let mut outcome = MergeOutcome::default();
        for item in batch {
            if item.url.is_empty() {
                continue;
            }
            if self.seen.insert(item.url.clone()) {
                self.items.push(item);
                outcome.added += 1;
            } else {
                outcome.duplicates += 1;
            }
        }

        self.items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        outcome
    }

    pub fn merge_rss(&mut self, articles: &[RssArticle]) -> MergeOutcome {
        self.merge(articles.iter().map(UnifiedItem::from))
    }

    pub fn merge_scraped(&mut self, items: &[NewsItem]) -> MergeOutcome {
        self.merge(items.iter().map(UnifiedItem::from))
    }

    pub fn items(&self) -> &[UnifiedItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<UnifiedItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Loading state of one source during incremental rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    #[default]
    Idle,
    Loading,
    Done,
    Error,
}

impl ProgressStatus {
    pub fn icon(self) -> &'static str {
        match self {
            ProgressStatus::Idle => "○",
            ProgressStatus::Loading => "●",
            ProgressStatus::Done => "✔",
            ProgressStatus::Error => "✖",
        }
    }
}

/// Per-source counters shown while a timeline fills in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceProgress {
    pub key: &'static str,
    pub label: &'static str,
    pub status: ProgressStatus,
    /// Items the source returned.
    pub received: usize,
    /// Items that made it into the timeline after deduplication.
    pub shown: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SourceProgress {
    pub fn new(source: Source) -> Self {
        Self {
            key: source.key(),
            label: source.label(),
            status: ProgressStatus::Idle,
            received: 0,
            shown: 0,
            note: None,
        }
    }

    pub fn start(&mut self) {
        self.status = ProgressStatus::Loading;
        self.received = 0;
        self.shown = 0;
        self.note = None;
    }

    pub fn finish(&mut self, received: usize, outcome: MergeOutcome) {
        self.status = ProgressStatus::Done;
        self.received = received;
        self.shown = outcome.added;
    }

    pub fn fail(&mut self, note: impl Into<String>) {
        self.status = ProgressStatus::Error;
        self.note = Some(note.into());
    }
}

impl fmt::Display for SourceProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} 수신 {} / 표시 {}", self.status.icon(), self.label, self.received, self.shown)?;
        if let Some(note) = &self.note {
            write!(f, " ({note})")?;
        }
        Ok(())
    }
}
