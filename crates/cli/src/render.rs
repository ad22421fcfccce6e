//! Plain-text rendering of results for terminals.

use chrono::{DateTime, FixedOffset, Utc};
use nongjeong_core::{NewsItem, RssArticle, SiteConfig, UnifiedItem, text::excerpt};

const EXCERPT_CHARS: usize = 120;

fn kst(published: Option<DateTime<Utc>>) -> String {
    let Some(offset) = FixedOffset::east_opt(9 * 3600) else {
        return String::new();
    };
    published
        .map(|at| at.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "날짜 없음".to_string())
}

pub fn news_items(items: &[NewsItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "[{}] {}\n  {}  {}\n  {}\n",
                item.source.label(),
                item.title,
                kst(item.published_at),
                item.url,
                item.excerpt(EXCERPT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn rss_articles(articles: &[RssArticle]) -> String {
    articles
        .iter()
        .map(|article| {
            format!(
                "[{}] {}\n  {}  {}\n  {}\n",
                article.source,
                article.title,
                kst(article.published_at),
                article.link,
                excerpt(&article.description, EXCERPT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn timeline(items: &[UnifiedItem]) -> String {
    items
        .iter()
        .map(|item| {
            let origin = match item.from {
                nongjeong_core::Origin::Rss => "RSS",
                nongjeong_core::Origin::Scrape => "SCRAPE",
            };
            format!(
                "[{origin} · {}] {}\n  {}  {}\n",
                item.source_label,
                item.title,
                kst(item.published_at),
                item.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn sources(sites: &[SiteConfig]) -> String {
    sites
        .iter()
        .map(|site| format!("{:<8} {:<8} {}\n", site.source.key(), site.source.label(), site.base_url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nongjeong_core::Source;

    #[test]
    fn test_kst_formatting() {
        let at: DateTime<Utc> = "2024-03-05T05:30:00Z".parse().unwrap();
        assert_eq!(kst(Some(at)), "2024-03-05 14:30");
        assert_eq!(kst(None), "날짜 없음");
    }

    #[test]
    fn test_sources_table() {
        let table = sources(&[SiteConfig::for_source(Source::Nongmin)]);
        assert!(table.starts_with("nongmin"));
        assert!(table.contains("농민신문"));
        assert!(table.contains("https://www.nongmin.com/"));
    }
}
