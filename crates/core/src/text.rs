//! Text normalization and HTML sanitization.
//!
//! [`clean_html`] is the only path by which scraped or fed markup reaches a
//! caller: lazy images are promoted, chrome blocks (share bars, ad slots,
//! related-article rails) are dropped, and what remains is reduced to a small
//! allow-list of tags and attributes with ammonia.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;
use scraper::Html;

static INVISIBLE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{200B}-\x{200D}\x{FEFF}\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Words that mark a class token as page chrome rather than article content.
const CHROME_WORDS: &[&str] = &["sns", "share", "ad", "ads", "banner", "related", "relate", "keyword", "keywords"];

/// Boilerplate strings that show up where a headline is expected.
const BAD_TITLES: &[&str] = &[
    "상단영역",
    "하단영역",
    "전체메뉴",
    "메뉴",
    "메뉴열기",
    "검색",
    "검색어입력",
    "바로가기",
    "본문건너뛰기",
    "skip to content",
    "skip navigation",
    "menu",
    "search",
];

static SANITIZER: LazyLock<ammonia::Builder<'static>> = LazyLock::new(|| {
    let tags: HashSet<&str> = [
        "p", "br", "ul", "ol", "li", "b", "strong", "i", "em", "u", "blockquote", "a", "h3", "h4", "img", "figure",
        "figcaption",
    ]
    .into_iter()
    .collect();

    let tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::from([
        ("a", HashSet::from(["href", "title"])),
        ("img", HashSet::from(["src", "alt", "title"])),
    ]);

    let mut builder = ammonia::Builder::default();
    builder
        .tags(tags)
        .tag_attributes(tag_attributes)
        .generic_attributes(HashSet::new())
        .url_schemes(HashSet::from(["http", "https", "mailto"]))
        .link_rel(Some("nofollow noopener noreferrer"))
        .set_tag_attribute_value("a", "target", "_blank")
        .set_tag_attribute_value("img", "loading", "lazy")
        .set_tag_attribute_value("img", "decoding", "async");
    builder
});

/// Strips zero-width and control characters, collapses whitespace and trims.
pub fn clean_weird_chars(s: &str) -> String {
    let visible = INVISIBLE_CHARS.replace_all(s, "");
    WHITESPACE.replace_all(&visible, " ").trim().to_string()
}

/// Plain-text cleanup for titles and descriptions.
///
/// Entities are decoded and the middle-dot separator becomes a space.
pub fn clean_text(s: &str) -> String {
    let decoded = decode_html_entities(s);
    clean_weird_chars(&decoded.replace('·', " "))
}

fn is_bad_title(title: &str) -> bool {
    let lowered = title.to_lowercase();
    BAD_TITLES.iter().any(|bad| *bad == lowered)
}

/// Returns the first candidate that survives [`clean_text`], is at least two
/// characters long and is not a known boilerplate string.
///
/// An empty result means title extraction failed and the article is skipped.
pub fn pick_title<I, S>(candidates: I) -> String
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .flatten()
        .map(|candidate| clean_text(candidate.as_ref()))
        .find(|title| title.chars().count() >= 2 && !is_bad_title(title))
        .unwrap_or_default()
}

/// True when any `-`/`_`-separated word of any class token is a chrome marker.
pub fn is_chrome_class(class: &str) -> bool {
    class.split_whitespace().any(|token| {
        token
            .split(['-', '_'])
            .any(|word| CHROME_WORDS.iter().any(|marker| word.eq_ignore_ascii_case(marker)))
    })
}

/// Feeds sometimes ship their markup entity-escaped. Only then is it decoded
/// before parsing; decoding real markup would turn escaped text into tags.
fn needs_entity_decode(html: &str) -> bool {
    !html.contains('<') && html.contains("&lt;")
}

/// Tagless output spells `<` as `&#60;` so it never looks entity-escaped to
/// [`needs_entity_decode`] on a second pass.
fn settle_escapes(sanitized: String) -> String {
    if sanitized.contains('<') { sanitized } else { sanitized.replace("&lt;", "&#60;") }
}

/// Promotes lazy image sources and drops chrome-classed elements.
fn rewrite_for_sanitizer(html: &str) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                lol_html::element!("[class]", |el| {
                    if let Some(class) = el.get_attribute("class")
                        && is_chrome_class(&class)
                    {
                        el.remove();
                    }
                    Ok(())
                }),
                lol_html::element!("img", |el| {
                    let lazy = el.get_attribute("data-src").or_else(|| el.get_attribute("data-original"));
                    if let Some(src) = lazy.filter(|src| !src.trim().is_empty()) {
                        el.set_attribute("src", src.trim())?;
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

/// Sanitizes an HTML fragment to the display allow-list.
///
/// Allowed tags: `p br ul ol li b strong i em u blockquote a h3 h4 img figure
/// figcaption`. Anchors open in a new context with
/// `rel="nofollow noopener noreferrer"`, images get `loading="lazy"` and
/// `decoding="async"`, URLs are limited to http, https and mailto. The result
/// is idempotent: `clean_html(&clean_html(x)) == clean_html(x)`.
pub fn clean_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let decoded = if needs_entity_decode(html) { decode_html_entities(html).into_owned() } else { html.to_string() };
    let rewritten = rewrite_for_sanitizer(&decoded);
    let sanitized = SANITIZER.clean(&rewritten).to_string();

    settle_escapes(clean_weird_chars(&sanitized))
}

/// Visible text of an HTML fragment with whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    clean_weird_chars(&text)
}

/// First `max_chars` characters of the visible text, with an ellipsis when cut.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let text = html_to_text(html);
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

/// Character count of [`html_to_text`], used to rank candidate containers.
pub fn visible_text_len(html: &str) -> usize {
    html_to_text(html).chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_clean_weird_chars() {
        assert_eq!(clean_weird_chars("\u{200B}농민\u{FEFF}  신문\u{0007}\n\t기사 "), "농민 신문 기사");
    }

    #[test]
    fn test_clean_text_decodes_and_normalizes_middot() {
        assert_eq!(clean_text("쌀값&middot;한우값 &amp; 비료"), "쌀값 한우값 & 비료");
        assert_eq!(clean_text("농협 · 정부"), "농협 정부");
    }

    #[test]
    fn test_pick_title_skips_boilerplate() {
        assert_eq!(pick_title([None, Some("메뉴"), Some("실제 기사 제목")]), "실제 기사 제목");
    }

    #[test]
    fn test_pick_title_empty_when_nothing_qualifies() {
        assert_eq!(pick_title([None, Some(""), Some("가"), Some("검색"), Some("  Skip to content ")]), "");
        assert_eq!(pick_title(Vec::<Option<&str>>::new()), "");
    }

    #[test]
    fn test_pick_title_cleans_winner() {
        assert_eq!(
            pick_title([Some("  한우&middot;한돈   수급 동향\u{200B} ".to_string())]),
            "한우 한돈 수급 동향"
        );
    }

    #[test]
    fn test_chrome_class_tokens() {
        assert!(is_chrome_class("article-share"));
        assert!(is_chrome_class("box sns_area"));
        assert!(is_chrome_class("AD"));
        assert!(is_chrome_class("related-articles"));
        assert!(!is_chrome_class("header"));
        assert!(!is_chrome_class("article-body"));
        assert!(!is_chrome_class("shadow"));
    }

    #[test]
    fn test_clean_html_removes_scripts_and_handlers() {
        let html = r#"<p onclick="steal()">본문</p><script>alert(1)</script><style>p{}</style><img src="x.jpg" onerror="alert(2)">"#;
        let cleaned = clean_html(html);
        assert!(!cleaned.contains("<script"));
        assert!(!cleaned.contains("<style"));
        assert!(!cleaned.contains("onclick="));
        assert!(!cleaned.contains("onerror="));
        assert!(!cleaned.contains("alert"));
        assert!(cleaned.contains("<p>본문</p>"));
    }

    #[test]
    fn test_clean_html_rewrites_anchors() {
        let cleaned = clean_html(r#"<a href="https://www.nongmin.com/article/1" class="link">기사</a>"#);
        assert!(cleaned.contains(r#"href="https://www.nongmin.com/article/1""#));
        assert!(cleaned.contains(r#"target="_blank""#));
        assert!(cleaned.contains(r#"rel="nofollow noopener noreferrer""#));
        assert!(!cleaned.contains("class="));
    }

    #[test]
    fn test_clean_html_blocks_javascript_urls() {
        let cleaned = clean_html(r#"<a href="javascript:alert(1)">x</a>"#);
        assert!(!cleaned.contains("javascript"));
    }

    #[test]
    fn test_clean_html_promotes_lazy_images() {
        let cleaned = clean_html(r#"<img src="/img/blank.gif" data-src="https://cdn.example.com/cow.jpg" alt="소">"#);
        assert!(cleaned.contains(r#"src="https://cdn.example.com/cow.jpg""#));
        assert!(cleaned.contains(r#"loading="lazy""#));
        assert!(cleaned.contains(r#"decoding="async""#));
        assert!(!cleaned.contains("data-src"));
    }

    #[test]
    fn test_clean_html_drops_chrome_blocks() {
        let html = r#"<div class="header"><p>머리말</p></div><div class="share_wrap"><a href="https://sns">공유</a></div><p>본문</p>"#;
        let cleaned = clean_html(html);
        assert!(cleaned.contains("머리말"));
        assert!(cleaned.contains("본문"));
        assert!(!cleaned.contains("공유"));
    }

    #[test]
    fn test_clean_html_decodes_escaped_markup() {
        let cleaned = clean_html("&lt;p&gt;보도자료&lt;/p&gt;&lt;script&gt;x()&lt;/script&gt;");
        assert_eq!(cleaned, "<p>보도자료</p>");
    }

    #[test]
    fn test_clean_html_double_escaped_text_stays_text() {
        let once = clean_html("x &lt; &amp;lt;b&amp;gt;y");
        assert_eq!(once, "x &#60; &#60;b&gt;y");
        assert_eq!(clean_html(&once), once);
        assert!(!clean_html(&once).contains("<b>"));
    }

    #[test]
    fn test_clean_html_empty() {
        assert_eq!(clean_html(""), "");
        assert_eq!(clean_html("   \n"), "");
    }

    #[rstest]
    #[case("<p>쌀 수확량 <b>증가</b></p>")]
    #[case(r#"<div class="article-body"><p>본문&nbsp;내용</p><img data-original="/a.jpg"></div>"#)]
    #[case("1 &lt; 2 그리고 3 &gt; 2")]
    #[case("&lt;p&gt;escaped&lt;/p&gt;")]
    #[case(r#"<p>unclosed <a href="https://a.kr">link<p>next"#)]
    #[case("<ul><li>하나</li><li>둘</li></ul>\n\n<script>bad()</script>")]
    #[case("<table><tr><td>표 안의 글</td></tr></table>")]
    #[case("x &lt; &amp;lt;b&amp;gt;y")]
    #[case("&amp;lt;script&amp;gt;alert(1)&amp;lt;/script&amp;gt;")]
    fn test_clean_html_idempotent(#[case] html: &str) {
        let once = clean_html(html);
        assert_eq!(clean_html(&once), once);
    }

    #[test]
    fn test_excerpt_cuts_on_characters() {
        assert_eq!(excerpt("<p>쌀값이 3주 연속 올랐다</p>", 5), "쌀값이 3…");
        assert_eq!(excerpt("<p>양파 </p><p>가격</p>", 3), "양파…");
        assert_eq!(excerpt("<p>짧다</p>", 10), "짧다");
    }

    #[test]
    fn test_visible_text_len() {
        assert_eq!(visible_text_len("<div> <p>가나</p>\n<p>다</p> </div>"), "가나 다".chars().count());
        assert_eq!(visible_text_len("<div><img src=a.jpg></div>"), 0);
    }
}
