//! Body extraction strategies.
//!
//! Each strategy is a pure function of an already fetched page and returns
//! `None` when it finds nothing. The scraper walks a site's strategy chain and
//! keeps the first result that survives sanitization.

use url::Url;

use crate::parse::{Document, absolutize};
use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::text::visible_text_len;

/// Upper bound on images kept per article.
pub const MAX_IMAGES: usize = 6;

/// Unsanitized body markup plus the images found inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedBody {
    pub html: String,
    pub images: Vec<String>,
}

impl ExtractedBody {
    pub fn new(html: String, base_url: Option<&Url>) -> Self {
        let images = images_from(&html, base_url, MAX_IMAGES);
        Self { html, images }
    }
}

/// Tries every selector and keeps the container with the longest visible text.
///
/// Only the first match of each selector is considered. Containers are cleaned
/// with [`PreprocessConfig::container`] before measuring, so a wrapper that holds
/// nothing but share buttons and bylines loses to the real body.
pub fn pick_container(doc: &Document, selectors: &[String]) -> Option<ExtractedBody> {
    let config = PreprocessConfig::container(doc.base_url().cloned());

    let mut best: Option<(usize, String)> = None;
    for selector in selectors {
        let Some(root) = doc.select_first(selector) else {
            continue;
        };

        let cleaned = preprocess_html(&root.inner_html(), &config);
        let len = visible_text_len(&cleaned);
        if len > best.as_ref().map_or(0, |(best_len, _)| *best_len) {
            best = Some((len, cleaned));
        }
    }

    best.map(|(_, html)| ExtractedBody::new(html, doc.base_url()))
}

/// Joins the inner HTML of every paragraph matching `selector`.
pub fn paragraphs(doc: &Document, selector: &str) -> Option<ExtractedBody> {
    let joined = doc
        .select(selector)
        .ok()?
        .iter()
        .map(|p| p.inner_html())
        .filter(|inner| !inner.trim().is_empty())
        .map(|inner| format!("<p>{inner}</p>"))
        .collect::<Vec<_>>()
        .join("\n");

    if joined.is_empty() {
        return None;
    }

    let cleaned = preprocess_html(&joined, &PreprocessConfig::container(doc.base_url().cloned()));
    Some(ExtractedBody::new(cleaned, doc.base_url()))
}

/// The page description as a single escaped paragraph.
pub fn meta_description(doc: &Document) -> Option<ExtractedBody> {
    doc.description().map(|desc| ExtractedBody {
        html: format!("<p>{}</p>", html_escape::encode_text(&desc)),
        images: Vec::new(),
    })
}

/// Absolute, deduplicated image URLs in document order.
///
/// `src` is preferred, then `data-src` and `data-original`. `data:` URIs and
/// non-http schemes are skipped.
pub fn images_from(html: &str, base_url: Option<&Url>, limit: usize) -> Vec<String> {
    let doc = Document::parse(html);
    let Ok(images) = doc.select("img") else {
        return Vec::new();
    };

    let mut found: Vec<String> = Vec::new();
    for img in images {
        let resolved = ["src", "data-src", "data-original"]
            .iter()
            .filter_map(|attr| img.attr(attr))
            .find_map(|src| absolutize(base_url, src));

        if let Some(src) = resolved
            && !found.contains(&src)
        {
            found.push(src);
            if found.len() == limit {
                break;
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = r#"
        <html><body>
            <div class="article-body">
                <div class="share"><a href="https://sns.example.com">공유하기 페이스북 트위터 카카오톡 링크복사</a></div>
            </div>
            <div id="articleBody">
                <p>한우 도매가격이 한 달 사이 10% 넘게 떨어졌다.</p>
                <img data-src="/photo/hanwoo.jpg" src="data:image/gif;base64,R0lGOD">
                <div class="byline">홍길동 기자</div>
            </div>
        </body></html>
    "#;

    fn selectors(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pick_container_prefers_longest_cleaned_text() {
        let doc = Document::parse_with_url(DETAIL, "https://www.nongmin.com/article/1");
        let body = pick_container(&doc, &selectors(&[".article-body", "#articleBody"])).unwrap();

        assert!(body.html.contains("한우 도매가격"));
        assert!(!body.html.contains("홍길동"));
        assert_eq!(body.images, vec!["https://www.nongmin.com/photo/hanwoo.jpg".to_string()]);
    }

    #[test]
    fn test_pick_container_none_when_nothing_matches_or_is_empty() {
        let doc = Document::parse(DETAIL);
        assert_eq!(pick_container(&doc, &selectors(&[".missing", "[[bad"])), None);

        let empty = Document::parse(r#"<div class="article-body"><div class="ad">광고</div></div>"#);
        assert_eq!(pick_container(&empty, &selectors(&[".article-body"])), None);
    }

    #[test]
    fn test_paragraphs_joined() {
        let doc = Document::parse(r#"<article><p>첫 문단</p><p> </p><p>둘째 <b>문단</b></p></article>"#);
        let body = paragraphs(&doc, "article p").unwrap();
        assert_eq!(body.html, "<p>첫 문단</p> <p>둘째 <b>문단</b></p>");
        assert!(paragraphs(&doc, ".content p").is_none());
    }

    #[test]
    fn test_meta_description_is_escaped() {
        let doc = Document::parse(r#"<html><head><meta name="description" content="쌀값 <급등> & 대책"></head></html>"#);
        let body = meta_description(&doc).unwrap();
        assert_eq!(body.html, "<p>쌀값 &lt;급등&gt; &amp; 대책</p>");
        assert!(body.images.is_empty());
    }

    #[test]
    fn test_images_from_dedup_and_limit() {
        let base = Url::parse("https://www.aflnews.co.kr/news/articleView.html?idxno=3").unwrap();
        let html = (1..=8)
            .map(|i| format!(r#"<img src="/p/{i}.jpg"><img src="/p/{i}.jpg">"#))
            .collect::<String>();

        let images = images_from(&html, Some(&base), MAX_IMAGES);
        assert_eq!(images.len(), 6);
        assert_eq!(images[0], "https://www.aflnews.co.kr/p/1.jpg");
        assert_eq!(images[5], "https://www.aflnews.co.kr/p/6.jpg");
    }
}
