//! Markup cleanup applied before content is measured or scored.
//!
//! Two presets cover the callers: [`PreprocessConfig::container`] for a body
//! container picked by a site selector, and [`PreprocessConfig::document`]
//! for a whole page handed to the generic extractor.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Tags whose content is never article text.
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "svg", "canvas"];

const PAGE_CHROME_TAGS: &[&str] = &["header", "footer", "nav"];

/// Share bars, tag clouds, related-article rails, ad slots, bylines and comment blocks.
pub const CHROME_SELECTORS: &[&str] = &[
    ".sns",
    ".share",
    ".share_wrap",
    ".tag",
    ".keyword",
    ".related",
    ".related-articles",
    ".relate",
    ".ad",
    ".ads",
    ".banner",
    ".author",
    ".byline",
    ".reporter",
    ".comment",
    ".reply",
];

static COMMENTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static UNLIKELY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|related|remark|rss|shoutbox|sidebar|sponsor|ad-break|agegate|pagination|pager|popup|share|sns)").unwrap()
});

static POSITIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(article|body|content|entry|main|page|post|text|story|view|news)").unwrap());

static HIDDEN_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Remove script, style, noscript, iframe, svg and canvas elements
    pub remove_non_content: bool,
    /// Remove header, footer and nav elements
    pub remove_page_chrome: bool,
    /// Remove elements matching [`CHROME_SELECTORS`]
    pub remove_chrome_blocks: bool,
    /// Remove elements, content included, whose class or id looks like navigation or widgets
    pub remove_unlikely: bool,
    /// Keep unlikely elements whose class or id also looks like content
    pub keep_positive: bool,
    /// Remove elements hidden with inline styles
    pub remove_hidden: bool,
    /// Copy `data-src`, `data-original` or `data-lazy` into `src`
    pub promote_lazy_images: bool,
    /// Base URL for converting relative links and image sources
    pub base_url: Option<Url>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            remove_non_content: true,
            remove_page_chrome: true,
            remove_chrome_blocks: true,
            remove_unlikely: false,
            keep_positive: true,
            remove_hidden: true,
            promote_lazy_images: true,
            base_url: None,
        }
    }
}

impl PreprocessConfig {
    /// Cleanup for a body container chosen by a site selector.
    pub fn container(base_url: Option<Url>) -> Self {
        Self { base_url, ..Default::default() }
    }

    /// Cleanup for a full page before readability scoring.
    pub fn document(base_url: Option<Url>) -> Self {
        Self { remove_unlikely: true, base_url, ..Default::default() }
    }
}

/// Preprocess HTML by removing unwanted elements and normalizing the document
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = COMMENTS.replace_all(html, "").into_owned();

    if config.remove_non_content || config.remove_page_chrome || config.remove_chrome_blocks {
        processed = remove_tags(&processed, config);
    }

    if config.remove_unlikely {
        processed = remove_unlikely_candidates(&processed, config.keep_positive);
    }

    if config.remove_hidden {
        processed = remove_hidden_elements(&processed);
    }

    if config.promote_lazy_images || config.base_url.is_some() {
        processed = rewrite_media(&processed, config.promote_lazy_images, config.base_url.as_ref());
    }

    WHITESPACE.replace_all(&processed, " ").trim().to_string()
}

fn remove_tags(html: &str, config: &PreprocessConfig) -> String {
    let mut selectors: Vec<&str> = Vec::new();
    if config.remove_non_content {
        selectors.extend(NON_CONTENT_TAGS);
    }
    if config.remove_page_chrome {
        selectors.extend(PAGE_CHROME_TAGS);
    }
    if config.remove_chrome_blocks {
        selectors.extend(CHROME_SELECTORS);
    }

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: selectors
                .into_iter()
                .map(|selector| {
                    lol_html::element!(selector, |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    match rewriter.end() {
        Ok(_) => output,
        Err(_) => html.to_string(),
    }
}

fn is_unlikely(value: &str, keep_positive: bool) -> bool {
    UNLIKELY.is_match(value) && (!keep_positive || !POSITIVE.is_match(value))
}

/// Removes elements matching unlikely candidate patterns together with their content.
fn remove_unlikely_candidates(html: &str, keep_positive: bool) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("*", |el| {
                if matches!(el.tag_name().as_str(), "html" | "body" | "article" | "main") {
                    return Ok(());
                }

                if let Some(id) = el.get_attribute("id")
                    && is_unlikely(&id, keep_positive)
                {
                    el.remove();
                    return Ok(());
                }

                if let Some(class) = el.get_attribute("class")
                    && class.split_whitespace().any(|name| is_unlikely(name, keep_positive))
                {
                    el.remove();
                }

                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    match rewriter.end() {
        Ok(_) => output,
        Err(_) => html.to_string(),
    }
}

/// Remove elements with display:none or visibility:hidden styles
fn remove_hidden_elements(html: &str) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("[style]", |el| {
                if let Some(style) = el.get_attribute("style")
                    && HIDDEN_STYLE.is_match(&style)
                {
                    el.remove();
                }
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    match rewriter.end() {
        Ok(_) => output,
        Err(_) => html.to_string(),
    }
}

fn resolve(base_url: Option<&Url>, value: &str) -> Option<String> {
    let base = base_url?;
    let value = value.trim();
    if value.is_empty() || value.starts_with('#') || value.starts_with("data:") {
        return None;
    }
    base.join(value).ok().map(String::from)
}

/// Promotes lazy image sources and resolves relative `href`/`src` values.
fn rewrite_media(html: &str, promote_lazy: bool, base_url: Option<&Url>) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                lol_html::element!("img", |el| {
                    let lazy = if promote_lazy {
                        ["data-src", "data-original", "data-lazy"]
                            .iter()
                            .filter_map(|name| el.get_attribute(name))
                            .find(|value| !value.trim().is_empty())
                    } else {
                        None
                    };

                    if let Some(src) = lazy.or_else(|| el.get_attribute("src")) {
                        let resolved = resolve(base_url, &src).unwrap_or_else(|| src.trim().to_string());
                        el.set_attribute("src", &resolved)?;
                    }
                    Ok(())
                }),
                lol_html::element!("a[href]", |el| {
                    if let Some(href) = el.get_attribute("href")
                        && let Some(absolute) = resolve(base_url, &href)
                    {
                        el.set_attribute("href", &absolute)?;
                    }
                    Ok(())
                }),
            ],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    match rewriter.end() {
        Ok(_) => output,
        Err(_) => html.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_drops_non_content_and_chrome() {
        let html = r#"
            <div class="article-body">
                <script>track();</script>
                <style>p{color:red}</style>
                <nav><a href="/">홈</a></nav>
                <p>비료 가격이 크게 올랐다.</p>
                <div class="share_wrap"><a href="https://sns">공유하기</a></div>
                <div class="byline">홍길동 기자</div>
                <ul class="related"><li>관련 기사</li></ul>
                <!-- 광고 -->
            </div>
        "#;

        let result = preprocess_html(html, &PreprocessConfig::container(None));
        assert!(result.contains("비료 가격이 크게 올랐다."));
        for gone in ["track()", "color:red", "홈", "공유하기", "홍길동", "관련 기사", "광고"] {
            assert!(!result.contains(gone), "{gone} should be removed");
        }
    }

    #[test]
    fn test_remove_hidden_elements() {
        let html = r#"<div style="display:none">숨김</div><div style="visibility: hidden">안보임</div><div>보임</div>"#;
        let result = remove_hidden_elements(html);
        assert!(!result.contains("숨김"));
        assert!(!result.contains("안보임"));
        assert!(result.contains("보임"));
    }

    #[test]
    fn test_lazy_images_promoted_and_resolved() {
        let base = Url::parse("https://www.agrinet.co.kr/news/articleView.html?idxno=1").unwrap();
        let html = r#"<p><img src="/img/blank.gif" data-original="/photos/a.jpg"><img src="b.png"><a href="/news/articleView.html?idxno=2">다음</a></p>"#;

        let result = preprocess_html(html, &PreprocessConfig::container(Some(base)));
        assert!(result.contains(r#"src="https://www.agrinet.co.kr/photos/a.jpg""#));
        assert!(result.contains(r#"src="https://www.agrinet.co.kr/news/b.png""#));
        assert!(result.contains(r#"href="https://www.agrinet.co.kr/news/articleView.html?idxno=2""#));
    }

    #[test]
    fn test_document_unlikely_candidates() {
        let html = r#"
            <body>
                <div id="sidebar">많이 본 뉴스</div>
                <div class="menu-wrap">전체메뉴</div>
                <div class="article-view">쌀 생산량이 늘었다.</div>
            </body>
        "#;

        let result = preprocess_html(html, &PreprocessConfig::document(None));
        assert!(!result.contains("많이 본 뉴스"));
        assert!(!result.contains("전체메뉴"));
        assert!(result.contains("쌀 생산량이 늘었다."));
    }

    #[test]
    fn test_comments_and_whitespace() {
        let html = "<p>첫째</p>\n\n   <!-- hidden\nnote -->\t<p>둘째</p>";
        let config = PreprocessConfig { promote_lazy_images: false, ..PreprocessConfig::container(None) };
        assert_eq!(preprocess_html(html, &config), "<p>첫째</p> <p>둘째</p>");
    }
}
