//! The four outlets and their scraping configuration.
//!
//! Every outlet is scraped by the same algorithm ([`crate::scrape`]); what
//! differs is captured here: base URL, listing template, which links count as
//! articles, where titles, bodies and dates live, the order in which body
//! strategies are tried, the item cap and the politeness delays.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{NongjeongError, Result};

/// Error text shown to callers that pass an unknown site key.
pub const SOURCE_KEYS_MESSAGE: &str = "source must be one of: nongmin, ikpnews, agrinet, aflnews, all";

pub const DEFAULT_PAGES: u32 = 3;
pub const MAX_PAGES: u32 = 5;

/// Bounds a requested page count to `1..=MAX_PAGES`, defaulting to [`DEFAULT_PAGES`].
pub fn clamp_pages(pages: Option<u32>) -> u32 {
    pages.unwrap_or(DEFAULT_PAGES).clamp(1, MAX_PAGES)
}

static NUMERIC_ARTICLE_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/article/(\d+)").unwrap());

/// A scraped outlet. Serializes as its Korean label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "농민신문")]
    Nongmin,
    #[serde(rename = "농정신문")]
    Ikpnews,
    #[serde(rename = "농어민신문")]
    Agrinet,
    #[serde(rename = "농수축산신문")]
    Aflnews,
}

impl Source {
    /// Fixed order used for fan-out and for flattening results.
    pub const ALL: [Source; 4] = [Source::Nongmin, Source::Ikpnews, Source::Agrinet, Source::Aflnews];

    pub fn key(self) -> &'static str {
        match self {
            Source::Nongmin => "nongmin",
            Source::Ikpnews => "ikpnews",
            Source::Agrinet => "agrinet",
            Source::Aflnews => "aflnews",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Source::Nongmin => "농민신문",
            Source::Ikpnews => "농정신문",
            Source::Agrinet => "농어민신문",
            Source::Aflnews => "농수축산신문",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Source {
    type Err = NongjeongError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        Source::ALL
            .into_iter()
            .find(|source| source.key() == key)
            .ok_or_else(|| NongjeongError::UnknownSource(s.to_string()))
    }
}

/// A single outlet or every outlet, as accepted by the CLI and the HTTP route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSelection {
    One(Source),
    All,
}

impl SourceSelection {
    pub fn sources(self) -> Vec<Source> {
        match self {
            SourceSelection::One(source) => vec![source],
            SourceSelection::All => Source::ALL.to_vec(),
        }
    }
}

impl FromStr for SourceSelection {
    type Err = NongjeongError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(SourceSelection::All);
        }
        s.parse().map(SourceSelection::One)
    }
}

/// Where a title or date candidate is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// `content` of `<meta property=..>` or `<meta name=..>`.
    Meta(String),
    /// Text of the first element matching a CSS selector.
    Text(String),
}

impl Probe {
    pub fn meta(name: &str) -> Self {
        Probe::Meta(name.to_string())
    }

    pub fn text(selector: &str) -> Self {
        Probe::Text(selector.to_string())
    }
}

/// One step of the body extraction chain; the first step producing non-empty
/// sanitized content wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStrategy {
    /// Site container selectors, longest visible text wins.
    Selectors,
    /// Container selection repeated against the printable page.
    PrintView,
    /// Readability-style scoring over the whole document.
    Generic,
    /// Paragraphs found near the expected content area, joined.
    Paragraphs,
    /// The page's meta description.
    MetaDescription,
}

/// Everything the shared scrape algorithm needs to know about one outlet.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub source: Source,
    pub base_url: Url,
    /// Listing path relative to `base_url`; `{page}` is replaced by the 1-based page index.
    pub list_path: String,
    /// Matched against `path[?query]` of a resolved same-host link.
    pub link_pattern: Regex,
    /// Query parameters that identify an article and survive canonicalization.
    pub identity_params: Vec<String>,
    pub title_probes: Vec<Probe>,
    pub body_selectors: Vec<String>,
    pub paragraph_selector: String,
    pub date_probes: Vec<Probe>,
    pub print_selectors: Vec<String>,
    pub strategies: Vec<BodyStrategy>,
    /// Accepted items after which the whole run stops.
    pub item_cap: usize,
    pub list_delay: Duration,
    pub detail_delay: Duration,
    pub print_delay: Duration,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const NDSOFT_LIST_PATH: &str = "/news/articleList.html?page={page}&view_type=sm";
const NDSOFT_ARTICLE_LINK: &str = r"news/articleView\.html";

impl SiteConfig {
    /// Built-in configuration for an outlet.
    pub fn for_source(source: Source) -> Self {
        match source {
            Source::Nongmin => Self::nongmin(),
            Source::Ikpnews => Self::ndsoft(
                source,
                "https://www.ikpnews.net",
                vec![Probe::text("#article-view .title, h3#articleTitle, h1")],
                &[
                    "#article-view-content-div",
                    ".article-body",
                    ".article-content",
                    "#news_body",
                    ".article-text",
                    ".content",
                ],
                "#article-view-content-div p, article p, .content p",
                60,
            ),
            Source::Agrinet => Self::ndsoft(
                source,
                "https://www.agrinet.co.kr",
                vec![Probe::text("#articleTitle, h1, h2")],
                &["#articleBody", ".article-body", ".article-text", ".content", "#news_body"],
                "#articleBody p, article p, .content p",
                60,
            ),
            Source::Aflnews => Self::ndsoft(
                source,
                "https://www.aflnews.co.kr",
                vec![Probe::text("h1, h2")],
                &[
                    "#articleBody",
                    "#articleBodyContents",
                    ".article-body",
                    ".article-text",
                    ".content",
                    "#news_body",
                    ".view_con",
                    ".article_view",
                ],
                "#articleBody p, article p, .content p",
                80,
            ),
        }
    }

    fn nongmin() -> Self {
        Self {
            source: Source::Nongmin,
            base_url: Url::parse("https://www.nongmin.com").unwrap(),
            list_path: "/list/10?page={page}".to_string(),
            link_pattern: Regex::new(r"^/(article|news)/|articleView\.html").unwrap(),
            identity_params: Vec::new(),
            title_probes: vec![
                Probe::meta("og:title"),
                Probe::meta("twitter:title"),
                Probe::text("h1, .title h1, .article-title h1, .view_head h1, .tit-area h1"),
                Probe::text("title"),
            ],
            body_selectors: strings(&[
                ".article-body",
                "#articleBody",
                ".article_view",
                ".view_con",
                ".view-body",
                ".article-detail",
                ".article-content",
                ".post-content",
                ".content-body",
                ".news_body",
                "#news_body",
                ".art_txt",
                ".ct_article",
                "article .article-body",
                "article .content",
                "article .view_body",
            ]),
            paragraph_selector: "article p, .article-body p, .content p".to_string(),
            date_probes: vec![
                Probe::text(".date"),
                Probe::text(".info .date"),
                Probe::text(".byline .date"),
                Probe::text("time"),
                Probe::text(".article-header .date"),
                Probe::text(".view_head .date"),
                Probe::text(".tit-area .date"),
            ],
            print_selectors: strings(&[
                ".print-area",
                ".print_content",
                ".article-body",
                ".content",
                "#content",
                "article",
                ".news_body",
                "#news_body",
            ]),
            strategies: vec![
                BodyStrategy::Selectors,
                BodyStrategy::PrintView,
                BodyStrategy::Generic,
                BodyStrategy::Paragraphs,
                BodyStrategy::MetaDescription,
            ],
            item_cap: 120,
            list_delay: Duration::from_millis(700),
            detail_delay: Duration::from_millis(900),
            print_delay: Duration::ZERO,
        }
    }

    /// The three outlets running the same ndsoft-style CMS.
    fn ndsoft(
        source: Source, base: &str, headings: Vec<Probe>, body: &[&str], paragraphs: &str, item_cap: usize,
    ) -> Self {
        let mut title_probes = vec![Probe::meta("og:title")];
        title_probes.extend(headings);
        title_probes.push(Probe::text("title"));

        Self {
            source,
            base_url: Url::parse(base).unwrap(),
            list_path: NDSOFT_LIST_PATH.to_string(),
            link_pattern: Regex::new(NDSOFT_ARTICLE_LINK).unwrap(),
            identity_params: strings(&["idxno"]),
            title_probes,
            body_selectors: strings(body),
            paragraph_selector: paragraphs.to_string(),
            date_probes: vec![
                Probe::text("ul.infomation li"),
                Probe::text(".info-group .item"),
                Probe::text(".article-head-info"),
                Probe::text(".byline em"),
            ],
            print_selectors: Vec::new(),
            strategies: vec![BodyStrategy::Selectors, BodyStrategy::Paragraphs, BodyStrategy::MetaDescription],
            item_cap,
            list_delay: Duration::from_millis(700),
            detail_delay: Duration::from_millis(900),
            print_delay: Duration::ZERO,
        }
    }

    /// Points the outlet at another origin, e.g. a local mock server.
    pub fn with_base_url(mut self, base: &str) -> Result<Self> {
        self.base_url = Url::parse(base).map_err(|e| NongjeongError::InvalidUrl(format!("{base}: {e}")))?;
        Ok(self)
    }

    pub fn with_delays(mut self, list: Duration, detail: Duration) -> Self {
        self.list_delay = list;
        self.detail_delay = detail;
        self
    }

    pub fn with_item_cap(mut self, cap: usize) -> Self {
        self.item_cap = cap;
        self
    }

    pub fn with_list_path(mut self, path: &str) -> Self {
        self.list_path = path.to_string();
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<BodyStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn list_url(&self, page: u32) -> Result<String> {
        let path = self.list_path.replace("{page}", &page.to_string());
        self.base_url
            .join(&path)
            .map(String::from)
            .map_err(|e| NongjeongError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Resolves a listing `href` to the canonical article URL, or `None` when
    /// the link is off-site or not an article.
    ///
    /// The fragment is dropped and the query is reduced to the identity
    /// parameters, so `?from=main` and `?from=rank` variants collapse.
    pub fn canonical_link(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }

        let mut url = self.base_url.join(href).ok()?;
        if !matches!(url.scheme(), "http" | "https")
            || url.host_str() != self.base_url.host_str()
            || url.port_or_known_default() != self.base_url.port_or_known_default()
        {
            return None;
        }

        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        if !self.link_pattern.is_match(&target) {
            return None;
        }

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| self.identity_params.iter().any(|param| param == name))
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();

        url.set_fragment(None);
        url.set_query(None);
        if !kept.is_empty() {
            url.query_pairs_mut().extend_pairs(kept);
        }

        Some(url.into())
    }

    /// Printable-page candidates for a detail URL, most specific first.
    ///
    /// Not every article has a working print view; callers treat failures as expected.
    pub fn print_view_urls(&self, url: &str) -> Vec<String> {
        let Ok(parsed) = Url::parse(url) else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        if let Some(caps) = NUMERIC_ARTICLE_PATH.captures(parsed.path()) {
            let mut print = parsed.clone();
            print.set_path(&format!("/article/{}/print", &caps[1]));
            print.set_query(None);
            candidates.push(String::from(print));
        }

        let separator = if parsed.query().is_some() { '&' } else { '?' };
        candidates.push(format!("{url}{separator}output=print"));

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("nongmin", Source::Nongmin)]
    #[case("IKPNEWS", Source::Ikpnews)]
    #[case(" agrinet ", Source::Agrinet)]
    #[case("aflnews", Source::Aflnews)]
    fn test_source_from_key(#[case] key: &str, #[case] expected: Source) {
        assert_eq!(key.parse::<Source>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_source() {
        assert!(matches!("farmnews".parse::<Source>(), Err(NongjeongError::UnknownSource(_))));
        assert!("all".parse::<Source>().is_err());
    }

    #[test]
    fn test_selection_all() {
        assert_eq!("all".parse::<SourceSelection>().unwrap(), SourceSelection::All);
        assert_eq!(SourceSelection::All.sources(), Source::ALL.to_vec());
        assert_eq!(
            "agrinet".parse::<SourceSelection>().unwrap().sources(),
            vec![Source::Agrinet]
        );
    }

    #[test]
    fn test_source_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Source::Aflnews).unwrap(), "\"농수축산신문\"");
        assert_eq!(Source::Ikpnews.to_string(), "농정신문");
    }

    #[rstest]
    #[case(None, 3)]
    #[case(Some(0), 1)]
    #[case(Some(2), 2)]
    #[case(Some(9), 5)]
    fn test_clamp_pages(#[case] requested: Option<u32>, #[case] expected: u32) {
        assert_eq!(clamp_pages(requested), expected);
    }

    #[test]
    fn test_list_url() {
        let nongmin = SiteConfig::for_source(Source::Nongmin);
        assert_eq!(nongmin.list_url(2).unwrap(), "https://www.nongmin.com/list/10?page=2");

        let agrinet = SiteConfig::for_source(Source::Agrinet);
        assert_eq!(
            agrinet.list_url(1).unwrap(),
            "https://www.agrinet.co.kr/news/articleList.html?page=1&view_type=sm"
        );
    }

    #[test]
    fn test_canonical_link_strips_query_and_fragment() {
        let site = SiteConfig::for_source(Source::Nongmin);
        let a = site.canonical_link("/article/20240305500123?from=main#top");
        let b = site.canonical_link("https://www.nongmin.com/article/20240305500123?from=rank");
        assert_eq!(a.as_deref(), Some("https://www.nongmin.com/article/20240305500123"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_canonical_link_keeps_identity_param() {
        let site = SiteConfig::for_source(Source::Ikpnews);
        let link = site.canonical_link("/news/articleView.html?idxno=51234&replyAll=&reply_sc_order_by=I");
        assert_eq!(link.as_deref(), Some("https://www.ikpnews.net/news/articleView.html?idxno=51234"));
    }

    #[test]
    fn test_canonical_link_rejects_foreign_and_non_article_links() {
        let site = SiteConfig::for_source(Source::Ikpnews);
        assert_eq!(site.canonical_link("https://www.example.com/news/articleView.html?idxno=1"), None);
        assert_eq!(site.canonical_link("/news/articleList.html?sc_section_code=S1N1"), None);
        assert_eq!(site.canonical_link("#"), None);
        assert_eq!(site.canonical_link("javascript:void(0)"), None);
    }

    #[test]
    fn test_print_view_urls() {
        let site = SiteConfig::for_source(Source::Nongmin);
        assert_eq!(
            site.print_view_urls("https://www.nongmin.com/article/20240305500123"),
            vec![
                "https://www.nongmin.com/article/20240305500123/print".to_string(),
                "https://www.nongmin.com/article/20240305500123?output=print".to_string(),
            ]
        );
        assert_eq!(
            site.print_view_urls("https://www.nongmin.com/news/view?id=7"),
            vec!["https://www.nongmin.com/news/view?id=7&output=print".to_string()]
        );
    }

    #[test]
    fn test_with_base_url_override() {
        let site = SiteConfig::for_source(Source::Aflnews).with_base_url("http://127.0.0.1:4321").unwrap();
        assert_eq!(
            site.canonical_link("/news/articleView.html?idxno=9").as_deref(),
            Some("http://127.0.0.1:4321/news/articleView.html?idxno=9")
        );
        assert!(SiteConfig::for_source(Source::Aflnews).with_base_url("not a url").is_err());
    }
}
