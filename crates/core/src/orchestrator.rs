//! Fan-out over the four outlets.
//!
//! [`Scraper::scrape_all`] runs every site concurrently with `join_all`. Each
//! branch owns its own item buffer, so one site's failure (or blown budget)
//! leaves the others untouched. Results are flattened in the fixed site order and are
//! not re-sorted.

use std::fmt;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::article::NewsItem;
use crate::fetch::{FetchConfig, Fetcher};
use crate::readability::Readability;
use crate::scrape::SiteScraper;
use crate::sites::{MAX_PAGES, SiteConfig, Source};
use crate::{NongjeongError, Result};

/// Outcome of one site branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteStatus {
    Done,
    Failed,
    TimedOut,
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteStatus::Done => f.write_str("done"),
            SiteStatus::Failed => f.write_str("failed"),
            SiteStatus::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Per-site summary of an all-sites run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteReport {
    pub key: &'static str,
    #[serde(rename = "label")]
    pub source: Source,
    pub status: SiteStatus,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Items of an all-sites run plus what happened to each site.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeReport {
    pub items: Vec<NewsItem>,
    pub sites: Vec<SiteReport>,
}

impl ScrapeReport {
    /// `완료` when every site finished, otherwise the failed sites are listed,
    /// e.g. `완료 (농민신문 실패, 농정신문 시간 초과)`.
    pub fn status_message(&self) -> String {
        let problems: Vec<String> = self
            .sites
            .iter()
            .filter_map(|site| match site.status {
                SiteStatus::Done => None,
                SiteStatus::Failed => Some(format!("{} 실패", site.source.label())),
                SiteStatus::TimedOut => Some(format!("{} 시간 초과", site.source.label())),
            })
            .collect();

        if problems.is_empty() { "완료".to_string() } else { format!("완료 ({})", problems.join(", ")) }
    }

    pub fn all_done(&self) -> bool {
        self.sites.iter().all(|site| site.status == SiteStatus::Done)
    }
}

/// Holds the shared HTTP client and the per-site configuration.
///
/// # Example
///
/// ```rust,no_run
/// use nongjeong_core::{FetchConfig, Scraper};
///
/// # async fn run() -> nongjeong_core::Result<()> {
/// let scraper = Scraper::new(&FetchConfig::default())?;
/// let items = scraper.scrape_source("agrinet", 1).await?;
/// println!("{} articles", items.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Scraper {
    fetcher: Fetcher,
    sites: Vec<SiteConfig>,
    readability: Readability,
}

impl Scraper {
    /// Scraper over the four built-in outlets.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(config)?,
            sites: Source::ALL.into_iter().map(SiteConfig::for_source).collect(),
            readability: Readability::new(),
        })
    }

    /// Replaces the site table, e.g. to point outlets at a mock server.
    pub fn with_sites(mut self, sites: Vec<SiteConfig>) -> Self {
        self.sites = sites;
        self
    }

    pub fn with_readability(mut self, readability: Readability) -> Self {
        self.readability = readability;
        self
    }

    pub fn sites(&self) -> &[SiteConfig] {
        &self.sites
    }

    pub fn site(&self, source: Source) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| site.source == source)
    }

    /// Scrapes one outlet. Pages are bounded to `1..=MAX_PAGES`; an outlet
    /// missing from the site table yields no items.
    pub async fn scrape_site(&self, source: Source, pages: u32) -> Result<Vec<NewsItem>> {
        let Some(site) = self.site(source) else {
            return Ok(Vec::new());
        };
        let scraper = SiteScraper::new(&self.fetcher, site, &self.readability);
        scraper.scrape(pages.clamp(1, MAX_PAGES)).await
    }

    /// Dispatches on a site key. An unknown key is a no-op returning no items;
    /// callers validate keys before getting here.
    pub async fn scrape_source(&self, key: &str, pages: u32) -> Result<Vec<NewsItem>> {
        match key.parse::<Source>() {
            Ok(source) => self.scrape_site(source, pages).await,
            Err(_) => Ok(Vec::new()),
        }
    }

    /// Every outlet concurrently; failing outlets contribute nothing.
    pub async fn scrape_all(&self, pages: u32) -> Vec<NewsItem> {
        self.scrape_all_report(pages, None).await.items
    }

    /// Like [`Scraper::scrape_all`], with an outcome per site.
    ///
    /// When `budget` is set each site branch is cut off after that long and
    /// reported as timed out. Articles it finished before the cut-off are kept.
    pub async fn scrape_all_report(&self, pages: u32, budget: Option<Duration>) -> ScrapeReport {
        let pages = pages.clamp(1, MAX_PAGES);
        let runs = self.sites.iter().map(|site| async move {
            let scraper = SiteScraper::new(&self.fetcher, site, &self.readability);
            let mut items = Vec::new();
            let result = match budget {
                Some(limit) => tokio::time::timeout(limit, scraper.scrape_into(pages, &mut items)).await.unwrap_or_else(
                    |_| Err(NongjeongError::BudgetExceeded { site: site.source, budget_secs: limit.as_secs() }),
                ),
                None => scraper.scrape_into(pages, &mut items).await,
            };
            (site.source, result, items)
        });

        let mut report = ScrapeReport::default();
        for (source, result, mut items) in join_all(runs).await {
            let count = items.len();
            report.items.append(&mut items);

            let (status, error) = match result {
                Ok(()) => {
                    report.sites.push(SiteReport { key: source.key(), source, status: SiteStatus::Done, count, error: None });
                    continue;
                }
                Err(err @ NongjeongError::BudgetExceeded { .. }) => (SiteStatus::TimedOut, err),
                Err(err) => (SiteStatus::Failed, err),
            };

            warn!(site = source.key(), %status, kept = count, error = %error, "site did not finish");
            report.sites.push(SiteReport { key: source.key(), source, status, count, error: Some(error.to_string()) });
        }

        info!(items = report.items.len(), status = %report.status_message(), "all sites scraped");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(statuses: &[(Source, SiteStatus)]) -> ScrapeReport {
        ScrapeReport {
            items: Vec::new(),
            sites: statuses
                .iter()
                .map(|(source, status)| SiteReport {
                    key: source.key(),
                    source: *source,
                    status: *status,
                    count: 0,
                    error: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_status_message_all_done() {
        let report = report(&[(Source::Nongmin, SiteStatus::Done), (Source::Agrinet, SiteStatus::Done)]);
        assert_eq!(report.status_message(), "완료");
        assert!(report.all_done());
    }

    #[test]
    fn test_status_message_lists_problems() {
        let report = report(&[
            (Source::Nongmin, SiteStatus::Failed),
            (Source::Ikpnews, SiteStatus::Done),
            (Source::Aflnews, SiteStatus::TimedOut),
        ]);
        assert_eq!(report.status_message(), "완료 (농민신문 실패, 농수축산신문 시간 초과)");
        assert!(!report.all_done());
    }

    #[test]
    fn test_site_report_serialization() {
        let site = SiteReport {
            key: "ikpnews",
            source: Source::Ikpnews,
            status: SiteStatus::TimedOut,
            count: 0,
            error: Some("budget".to_string()),
        };
        let json = serde_json::to_value(&site).unwrap();
        assert_eq!(json["key"], "ikpnews");
        assert_eq!(json["label"], "농정신문");
        assert_eq!(json["status"], "timed_out");
        assert_eq!(json["error"], "budget");
    }

    #[test]
    fn test_default_site_table_order() {
        let scraper = Scraper::new(&FetchConfig::default()).unwrap();
        let keys: Vec<_> = scraper.sites().iter().map(|site| site.source.key()).collect();
        assert_eq!(keys, vec!["nongmin", "ikpnews", "agrinet", "aflnews"]);
    }

    #[tokio::test]
    async fn test_unknown_key_is_noop() {
        let scraper = Scraper::new(&FetchConfig::default()).unwrap().with_sites(Vec::new());
        assert!(scraper.scrape_source("dailynews", 1).await.unwrap().is_empty());
        assert!(scraper.scrape_site(Source::Nongmin, 1).await.unwrap().is_empty());
        assert!(scraper.scrape_all(1).await.is_empty());
    }
}
