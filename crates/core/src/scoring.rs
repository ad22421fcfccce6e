//! Element scoring for the generic content extractor.

use std::sync::LazyLock;

use regex::Regex;

use crate::parse::Element;

/// Configuration for content scoring algorithm
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// Weight for positive class/ID patterns
    pub positive_weight: f64,
    /// Weight for negative class/ID patterns
    pub negative_weight: f64,
    /// Maximum content density score from character count
    pub max_char_density_score: f64,
    /// Maximum content density score from comma count
    pub max_comma_density_score: f64,
    /// Characters per point for content density scoring
    pub chars_per_point: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            positive_weight: 25.0,
            negative_weight: -25.0,
            max_char_density_score: 3.0,
            max_comma_density_score: 3.0,
            chars_per_point: 100,
        }
    }
}

/// Result of scoring an element
#[derive(Debug, Clone)]
pub struct ScoreResult {
    pub base_score: f64,
    pub class_weight: f64,
    pub content_density: f64,
    /// Link density (0.0 to 1.0)
    pub link_density: f64,
    pub final_score: f64,
}

/// Base score by tag: containers score up, lists and headings score down.
pub fn base_tag_score(element: &Element<'_>) -> f64 {
    match element.tag_name().as_str() {
        "article" => 10.0,
        "section" | "main" => 8.0,
        "div" => 5.0,
        "td" | "blockquote" => 3.0,
        "p" | "pre" => 0.0,
        "form" | "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" | "header" | "footer" | "nav" | "aside" => -5.0,
        _ => 0.0,
    }
}

/// Class or id fragments that suggest article content, including the Korean CMS names
/// (`articleBody`, `view_con`, `news_body`).
static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(article|body|content|entry|main|page|post|text|story|view_con|news_body|art_txt)").unwrap()
});

static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|related|remark|rss|shoutbox|sidebar|sponsor|ad-break|agegate|pagination|pager|popup|share|sns|reply|copyright)").unwrap()
});

/// Returns the positive weight when the id or a class name looks like content,
/// the negative weight when it looks like chrome, zero otherwise. The id is
/// checked first.
pub fn class_id_weight(element: &Element<'_>, config: &ScoreConfig) -> f64 {
    let names = element
        .attr("id")
        .into_iter()
        .chain(element.attr("class").into_iter().flat_map(str::split_whitespace));

    for name in names {
        if POSITIVE.is_match(name) {
            return config.positive_weight;
        }
        if NEGATIVE.is_match(name) {
            return config.negative_weight;
        }
    }

    0.0
}

/// One point per `chars_per_point` characters plus one per comma, each capped.
pub fn content_density_score(element: &Element<'_>, config: &ScoreConfig) -> f64 {
    let text = element.text();
    let char_score = ((text.chars().count() / config.chars_per_point) as f64).min(config.max_char_density_score);
    let comma_count = text.matches([',', '，']).count();
    let comma_score = (comma_count as f64).min(config.max_comma_density_score);

    char_score + comma_score
}

/// Ratio of link text to all text, from 0.0 (no links) to 1.0 (only links).
pub fn link_density(element: &Element<'_>) -> f64 {
    let text_length = element.text().chars().count();
    if text_length == 0 {
        return 0.0;
    }

    let link_text_length = element
        .select("a")
        .unwrap_or_default()
        .iter()
        .map(|link| link.text().chars().count())
        .sum::<usize>();

    (link_text_length as f64 / text_length as f64).min(1.0)
}

/// Combines tag, class/id and density scores, then scales by `1 - link_density`.
///
/// The link penalty is halved for elements with a content-like class or more
/// than 500 characters of text.
pub fn calculate_score(element: &Element<'_>, config: &ScoreConfig) -> ScoreResult {
    let base_score = base_tag_score(element);
    let class_weight = class_id_weight(element, config);
    let content_density = content_density_score(element, config);
    let ld = link_density(element);

    let content_rich = element.text().chars().count() > 500;
    let link_penalty = if class_weight > 0.0 || content_rich { 1.0 - ld * 0.5 } else { 1.0 - ld };

    let final_score = (base_score + class_weight + content_density) * link_penalty;

    ScoreResult { base_score, class_weight, content_density, link_density: ld, final_score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Document;

    fn score_first(html: &str, selector: &str) -> ScoreResult {
        let doc = Document::parse(html);
        let element = doc.select_first(selector).unwrap();
        calculate_score(&element, &ScoreConfig::default())
    }

    #[test]
    fn test_base_tag_scores() {
        let doc = Document::parse("<article>a</article><section>b</section><div>c</div><td>d</td><nav>e</nav><ul><li>f</li></ul>");
        let score = |sel: &str| base_tag_score(&doc.select_first(sel).unwrap());
        assert_eq!(score("article"), 10.0);
        assert_eq!(score("section"), 8.0);
        assert_eq!(score("div"), 5.0);
        assert_eq!(score("nav"), -5.0);
        assert_eq!(score("ul"), -3.0);
    }

    #[test]
    fn test_class_weight_korean_cms_names() {
        let doc = Document::parse(
            r#"<div id="articleBody">a</div><div class="view_con">b</div><div class="sns_area">c</div><div class="wrap">d</div>"#,
        );
        let config = ScoreConfig::default();
        let weight = |sel: &str| class_id_weight(&doc.select_first(sel).unwrap(), &config);

        assert_eq!(weight("#articleBody"), 25.0);
        assert_eq!(weight(".view_con"), 25.0);
        assert_eq!(weight(".sns_area"), -25.0);
        assert_eq!(weight(".wrap"), 0.0);
    }

    #[test]
    fn test_class_weight_id_checked_first() {
        let doc = Document::parse(r#"<div id="sidebar" class="content">a</div>"#);
        assert_eq!(class_id_weight(&doc.select_first("div").unwrap(), &ScoreConfig::default()), -25.0);
    }

    #[test]
    fn test_content_density_counts_chars_and_commas() {
        let config = ScoreConfig::default();
        let long = format!("<div>{}</div>", "가".repeat(250));
        let doc = Document::parse(&long);
        assert_eq!(content_density_score(&doc.select_first("div").unwrap(), &config), 2.0);

        let doc = Document::parse("<div>쌀, 보리, 밀, 콩, 옥수수</div>");
        assert_eq!(content_density_score(&doc.select_first("div").unwrap(), &config), 3.0);
    }

    #[test]
    fn test_link_density() {
        let doc = Document::parse(r##"<div id="a"><a href="#">전부 링크</a></div><div id="b">본문 <a href="#">링크</a> 본문</div><div id="c"></div>"##);
        assert_eq!(link_density(&doc.select_first("#a").unwrap()), 1.0);
        let mixed = link_density(&doc.select_first("#b").unwrap());
        assert!(mixed > 0.0 && mixed < 1.0);
        assert_eq!(link_density(&doc.select_first("#c").unwrap()), 0.0);
    }

    #[test]
    fn test_article_outscores_navigation() {
        let article = score_first(
            r#"<article class="article-body">정부는 올해 쌀 수급 안정을 위해, 비축미 5만 톤을 방출하고, 농가 지원을 늘리기로 했다.</article>"#,
            "article",
        );
        let nav = score_first(r##"<nav class="menu">메뉴 <a href="#">정치</a><a href="#">경제</a></nav>"##, "nav");

        assert!(article.final_score > 35.0);
        assert!(nav.final_score < 0.0);
    }

    #[test]
    fn test_link_penalty_applied() {
        let result = score_first(r##"<div><a href="#">하나 둘</a> <a href="#">셋 넷</a> 끝</div>"##, "div");
        assert!((result.link_density - 0.7).abs() < 1e-9);
        assert!(result.final_score < result.base_score);
    }
}
