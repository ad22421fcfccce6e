//! The per-site scrape algorithm shared by all four outlets.
//!
//! For each listing page (sequentially, honouring the site's politeness
//! delays) article links are collected and canonicalized, then every detail
//! page is fetched and turned into a [`NewsItem`]:
//!
//! 1. title via [`pick_title`] over the site's title probes; no title, no item
//! 2. body via the site's [`BodyStrategy`] chain; the first strategy whose
//!    output survives [`clean_html`] wins; no body, no item
//! 3. publication date from metadata, site probes and the page text
//! 4. thumbnail from `og:image`, else the first body image
//!
//! A failing article is logged at debug level and skipped. Parsed documents
//! never live across an `.await`; every parse happens in a synchronous helper
//! that hands back owned data.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::article::NewsItem;
use crate::extract::{ExtractedBody, meta_description, paragraphs, pick_container};
use crate::fetch::Fetcher;
use crate::parse::Document;
use crate::readability::Readability;
use crate::sites::{BodyStrategy, SiteConfig};
use crate::text::{clean_html, pick_title};
use crate::{NongjeongError, Result};

/// Canonical article links of a listing page, deduplicated, in page order.
pub fn collect_links(listing_html: &str, site: &SiteConfig) -> Vec<String> {
    let doc = Document::parse(listing_html);
    let Ok(anchors) = doc.select("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    anchors
        .iter()
        .filter_map(|a| a.attr("href").and_then(|href| site.canonical_link(href)))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Sanitizes a strategy result, rejecting it when nothing survives.
fn sanitized(body: ExtractedBody) -> Option<ExtractedBody> {
    let html = clean_html(&body.html);
    (!html.is_empty()).then_some(ExtractedBody { html, images: body.images })
}

/// Metadata read from a detail page.
#[derive(Debug, Clone, Default)]
struct DetailPage {
    title: String,
    published_at: Option<DateTime<Utc>>,
    og_image: Option<String>,
    description: Option<String>,
}

impl DetailPage {
    fn analyze(html: &str, url: &str, site: &SiteConfig) -> Self {
        let doc = Document::parse_with_url(html, url);
        let title = pick_title(site.title_probes.iter().map(|probe| doc.probe(probe)));
        if title.is_empty() {
            return Self::default();
        }

        Self {
            title,
            published_at: doc.published_at(&site.date_probes),
            og_image: doc.og_image(),
            description: doc.description(),
        }
    }
}

/// Runs a run of strategies that need nothing but the detail page itself.
fn local_body(
    html: &str, url: &str, site: &SiteConfig, readability: &Readability, strategies: &[BodyStrategy],
) -> Option<ExtractedBody> {
    let doc = Document::parse_with_url(html, url);

    strategies.iter().find_map(|strategy| {
        let candidate = match strategy {
            BodyStrategy::Selectors => pick_container(&doc, &site.body_selectors),
            BodyStrategy::Generic => readability.extract(html, url),
            BodyStrategy::Paragraphs => paragraphs(&doc, &site.paragraph_selector),
            BodyStrategy::MetaDescription => meta_description(&doc),
            BodyStrategy::PrintView => None,
        };
        let body = candidate.and_then(sanitized);
        if body.is_some() {
            debug!(site = site.source.key(), url, ?strategy, "body extracted");
        }
        body
    })
}

fn print_body(html: &str, url: &str, selectors: &[String]) -> Option<ExtractedBody> {
    let doc = Document::parse_with_url(html, url);
    pick_container(&doc, selectors).and_then(sanitized)
}

/// Scrapes one outlet.
pub struct SiteScraper<'a> {
    fetcher: &'a Fetcher,
    site: &'a SiteConfig,
    readability: &'a Readability,
}

impl<'a> SiteScraper<'a> {
    pub fn new(fetcher: &'a Fetcher, site: &'a SiteConfig, readability: &'a Readability) -> Self {
        Self { fetcher, site, readability }
    }

    /// Walks listing pages `1..=pages` and returns the accepted items.
    ///
    /// # Errors
    ///
    /// [`NongjeongError::SiteFailure`] when the first listing page cannot be
    /// fetched. A later listing failure ends the run with the items collected
    /// so far; article failures are skipped.
    pub async fn scrape(&self, pages: u32) -> Result<Vec<NewsItem>> {
        let mut items = Vec::new();
        self.scrape_into(pages, &mut items).await?;
        Ok(items)
    }

    /// Same walk as [`SiteScraper::scrape`], pushing each accepted item into
    /// `items` as soon as it is extracted. Items already pushed stay there
    /// when the future is dropped part way, e.g. by a timeout.
    pub async fn scrape_into(&self, pages: u32, items: &mut Vec<NewsItem>) -> Result<()> {
        let key = self.site.source.key();
        let start = items.len();
        let mut attempted: HashSet<String> = HashSet::new();

        'pages: for page in 1..=pages {
            let list_url = self.site.list_url(page)?;
            let listing = match self.fetcher.fetch_html(&list_url, self.site.list_delay).await {
                Ok(html) => html,
                Err(err) if page == 1 => {
                    return Err(NongjeongError::SiteFailure { site: self.site.source, message: err.to_string() });
                }
                Err(err) => {
                    warn!(site = key, page, error = %err, "listing page failed, keeping collected items");
                    break;
                }
            };

            let links = collect_links(&listing, self.site);
            debug!(site = key, page, links = links.len(), "listing parsed");

            let (mut ok, mut skipped) = (0usize, 0usize);
            for url in links {
                if !attempted.insert(url.clone()) {
                    continue;
                }

                match self.scrape_article(&url).await {
                    Ok(Some(item)) => {
                        items.push(item);
                        ok += 1;
                    }
                    Ok(None) => skipped += 1,
                    Err(err) => {
                        debug!(site = key, url = %url, error = %err, "article failed");
                        skipped += 1;
                    }
                }

                if items.len() - start >= self.site.item_cap {
                    info!(site = key, cap = self.site.item_cap, "item cap reached");
                    break 'pages;
                }
            }
            debug!(site = key, page, ok, skipped, "page done");
        }

        info!(site = key, items = items.len() - start, "site scrape finished");
        Ok(())
    }

    /// Fetches and extracts one detail page. `Ok(None)` means the page had no
    /// usable title or body.
    pub async fn scrape_article(&self, url: &str) -> Result<Option<NewsItem>> {
        let html = self.fetcher.fetch_html(url, self.site.detail_delay).await?;

        let page = DetailPage::analyze(&html, url, self.site);
        if page.title.is_empty() {
            debug!(site = self.site.source.key(), url, "no title");
            return Ok(None);
        }

        let Some(body) = self.extract_body(&html, url).await else {
            debug!(site = self.site.source.key(), url, "no body");
            return Ok(None);
        };

        let thumbnail = page.og_image.or_else(|| body.images.first().cloned());
        Ok(Some(NewsItem {
            id: url.to_string(),
            source: self.site.source,
            key: self.site.source.key().to_string(),
            title: page.title,
            url: url.to_string(),
            published_at: page.published_at,
            description: page.description,
            content: body.html,
            images: body.images,
            thumbnail,
        }))
    }

    /// Walks the strategy chain. Consecutive local strategies share one parse;
    /// the print view is the only step that goes back to the network.
    async fn extract_body(&self, html: &str, url: &str) -> Option<ExtractedBody> {
        let mut remaining = self.site.strategies.as_slice();

        while let Some((first, rest)) = remaining.split_first() {
            if *first == BodyStrategy::PrintView {
                if let Some(body) = self.print_view(url).await {
                    debug!(site = self.site.source.key(), url, "body extracted from print view");
                    return Some(body);
                }
                remaining = rest;
                continue;
            }

            let end = remaining
                .iter()
                .position(|strategy| *strategy == BodyStrategy::PrintView)
                .unwrap_or(remaining.len());
            let (local, after) = remaining.split_at(end);
            if let Some(body) = local_body(html, url, self.site, self.readability, local) {
                return Some(body);
            }
            remaining = after;
        }

        None
    }

    /// Tries each printable-page candidate. Missing print views are expected.
    pub async fn print_view(&self, url: &str) -> Option<ExtractedBody> {
        for candidate in self.site.print_view_urls(url) {
            match self.fetcher.fetch_html(&candidate, self.site.print_delay).await {
                Ok(html) => {
                    if let Some(body) = print_body(&html, &candidate, &self.site.print_selectors) {
                        return Some(body);
                    }
                }
                Err(err) => debug!(url = %candidate, error = %err, "print view unavailable"),
            }
        }
        None
    }
}
