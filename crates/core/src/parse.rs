//! HTML parsing and DOM navigation.
//!
//! [`Document`] wraps a parsed page together with the URL it was fetched from,
//! so relative links and image sources can be resolved where they are read.
//!
//! # Example
//!
//! ```rust
//! use nongjeong_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><meta property="og:title" content="쌀값 안정 대책"></head>
//!         <body><p class="lead">정부가 비축미를 방출한다.</p></body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html);
//! assert_eq!(doc.meta_content("og:title").as_deref(), Some("쌀값 안정 대책"));
//! assert_eq!(doc.select("p.lead").unwrap().len(), 1);
//! ```

use std::hash::Hash;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::sites::Probe;
use crate::text::clean_weird_chars;
use crate::{NongjeongError, Result};

/// A parsed HTML document.
///
/// Not `Send`: keep a `Document` inside synchronous code and hand owned
/// strings across `.await` points.
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html), base_url: None }
    }

    /// Parses a page fetched from `url`; unparsable URLs leave relative links unresolved.
    pub fn parse_with_url(html: &str, url: &str) -> Self {
        Self { html: Html::parse_document(html), base_url: Url::parse(url).ok() }
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`NongjeongError::HtmlParse`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// First element matching `selector` in document order.
    ///
    /// An invalid selector is logged and treated as matching nothing.
    pub fn select_first(&'_ self, selector: &str) -> Option<Element<'_>> {
        match parse_selector(selector) {
            Ok(sel) => self.html.select(&sel).next().map(|el| Element { element: el }),
            Err(err) => {
                debug!(selector, error = %err, "skipping selector");
                None
            }
        }
    }

    /// Gets the content of the `<title>` element.
    pub fn title(&self) -> Option<String> {
        self.select_first("title").map(|el| el.text())
    }

    /// Visible text of `<body>`, whitespace collapsed. Script and style text is excluded.
    pub fn body_text(&self) -> String {
        let Some(body) = self.select_first("body") else {
            return String::new();
        };

        let text: Vec<&str> = body
            .element
            .descendants()
            .filter_map(|node| {
                let text = node.value().as_text()?;
                let parent = node.parent().and_then(ElementRef::wrap)?;
                match parent.value().name() {
                    "script" | "style" | "noscript" => None,
                    _ => Some(&**text),
                }
            })
            .collect();

        clean_weird_chars(&text.join(" "))
    }

    /// `content` of `<meta name=..>` or `<meta property=..>`.
    pub fn meta_content(&self, attr: &str) -> Option<String> {
        ["name", "property"].iter().find_map(|kind| {
            self.select_first(&format!("meta[{kind}=\"{attr}\"]"))
                .and_then(|el| el.attr("content").map(str::trim).map(str::to_string))
                .filter(|content| !content.is_empty())
        })
    }

    /// Reads a title or date candidate.
    pub fn probe(&self, probe: &Probe) -> Option<String> {
        match probe {
            Probe::Meta(name) => self.meta_content(name),
            Probe::Text(selector) => self.select_first(selector).map(|el| el.text()),
        }
    }

    /// Every candidate a probe can see: the meta value, or the text of each
    /// matching element in document order.
    pub fn probe_all(&self, probe: &Probe) -> Vec<String> {
        match probe {
            Probe::Meta(name) => self.meta_content(name).into_iter().collect(),
            Probe::Text(selector) => match self.select(selector) {
                Ok(elements) => elements.iter().map(Element::text).collect(),
                Err(err) => {
                    debug!(selector = selector.as_str(), error = %err, "skipping selector");
                    Vec::new()
                }
            },
        }
    }

    /// Resolves `href` against the document URL; only http(s) results are returned.
    pub fn absolutize(&self, href: &str) -> Option<String> {
        absolutize(self.base_url.as_ref(), href)
    }
}

/// Resolves `href` against `base`, keeping only http(s) URLs.
pub fn absolutize(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("data:") {
        return None;
    }

    let resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };

    matches!(resolved.scheme(), "http" | "https").then(|| resolved.into())
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| NongjeongError::HtmlParse(format!("Invalid selector {selector:?}: {e}")))
}

/// A wrapper around scraper's ElementRef.
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Concatenation of all text nodes within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    /// Lowercase tag name (e.g. "div", "a", "span").
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Stable identity of this node inside its document, usable as a map key.
    pub fn id(&self) -> impl Hash + Eq + Copy + use<> {
        self.element.id()
    }

    pub fn parent(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(ElementRef::wrap).map(|element| Element { element })
    }

    /// Direct child elements, in document order.
    pub fn children(&self) -> Vec<Element<'a>> {
        self.element.children().filter_map(ElementRef::wrap).map(|element| Element { element }).collect()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`NongjeongError::HtmlParse`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|element| Element { element }).collect())
    }
}
