//! Page metadata read from article detail pages.
//!
//! Publication dates are searched in a fixed priority order:
//! 1. JSON-LD `datePublished`, `dateCreated`, `uploadDate`
//! 2. Meta `article:published_time`, `pubdate`, `date`
//! 3. `<time datetime="">` element
//! 4. Site-specific date elements
//! 5. An `입력:` stamp (or any bare date) in the page text
//!
//! Every candidate goes through [`parse_published`]; the first one that parses wins.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

use crate::date::parse_published;
use crate::parse::Document;
use crate::sites::Probe;
use crate::text::clean_text;

const JSON_LD_DATE_KEYS: &[&str] = &["datePublished", "dateCreated", "uploadDate"];
const META_DATE_KEYS: &[&str] = &["article:published_time", "pubdate", "date"];

/// "입력 : 2024.03.05 14:30" as printed in bylines; capture stops at the next word.
static INPUT_STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"입력\s*[:：]?\s*([0-9.\-/년월일시분초:\s]+)").unwrap());

static BARE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}[.\-/년\s]+\d{1,2}[.\-/월\s]+\d{1,2}(?:\s*[일.]?\s*\d{1,2}:\d{1,2}(?::\d{1,2})?)?").unwrap()
});

impl Document {
    /// All JSON-LD objects on the page; top-level arrays and `@graph` lists are flattened.
    /// Blocks that fail to parse are ignored.
    pub fn json_ld_objects(&self) -> Vec<Value> {
        let Ok(scripts) = self.select("script[type=\"application/ld+json\"]") else {
            return Vec::new();
        };

        let mut objects = Vec::new();
        for script in scripts {
            let Ok(value) = serde_json::from_str::<Value>(script.text().trim()) else {
                continue;
            };
            match value {
                Value::Array(items) => objects.extend(items),
                Value::Object(mut obj) => match obj.remove("@graph") {
                    Some(Value::Array(graph)) => objects.extend(graph),
                    _ => objects.push(Value::Object(obj)),
                },
                other => objects.push(other),
            }
        }
        objects
    }

    /// Structured and tagged date candidates, before any page-text scan.
    fn structured_date_candidates(&self, site_probes: &[Probe]) -> Vec<String> {
        let mut candidates: Vec<String> = self
            .json_ld_objects()
            .iter()
            .filter_map(|obj| {
                JSON_LD_DATE_KEYS
                    .iter()
                    .find_map(|key| obj.get(*key).and_then(Value::as_str).map(str::to_string))
            })
            .collect();

        candidates.extend(META_DATE_KEYS.iter().filter_map(|key| self.meta_content(key)));

        if let Some(datetime) = self
            .select_first("time[datetime]")
            .and_then(|el| el.attr("datetime").map(str::to_string))
        {
            candidates.push(datetime);
        }

        candidates.extend(site_probes.iter().flat_map(|probe| self.probe_all(probe)));
        candidates
    }

    /// Publication instant, or `None` when no candidate parses.
    pub fn published_at(&self, site_probes: &[Probe]) -> Option<DateTime<Utc>> {
        if let Some(found) = self
            .structured_date_candidates(site_probes)
            .iter()
            .find_map(|candidate| parse_published(candidate))
        {
            return Some(found);
        }

        let text = self.body_text();
        INPUT_STAMP
            .captures(&text)
            .and_then(|caps| parse_published(&caps[1]))
            .or_else(|| BARE_DATE.find(&text).and_then(|m| parse_published(m.as_str())))
    }

    /// Absolute `og:image` URL.
    pub fn og_image(&self) -> Option<String> {
        self.meta_content("og:image").and_then(|src| self.absolutize(&src))
    }

    /// Cleaned `description` or `og:description`.
    pub fn description(&self) -> Option<String> {
        ["description", "og:description"]
            .iter()
            .filter_map(|key| self.meta_content(key))
            .map(|raw| clean_text(&raw))
            .find(|desc| !desc.is_empty())
    }
}
