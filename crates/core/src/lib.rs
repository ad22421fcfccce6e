pub mod article;
pub mod date;
pub mod error;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod merge;
pub mod metadata;
pub mod orchestrator;
pub mod parse;
pub mod preprocess;
pub mod readability;
pub mod scoring;
pub mod scrape;
pub mod sites;
pub mod text;

pub use article::NewsItem;
pub use date::{parse_korean_date, parse_published};
pub use error::{NongjeongError, Result};
#[doc(hidden)]
pub use extract::{ExtractedBody, meta_description, paragraphs, pick_container};
pub use feed::{FeedAggregator, FeedConfig, FeedSource, RssArticle, parse_feed};
pub use fetch::{FetchConfig, Fetcher, decode_html, resolve_charset};
pub use merge::{MergeOutcome, Origin, ProgressStatus, SourceProgress, Timeline, UnifiedItem};
pub use orchestrator::{ScrapeReport, Scraper, SiteReport, SiteStatus};
pub use parse::Document;
#[doc(hidden)]
pub use preprocess::{PreprocessConfig, preprocess_html};
pub use readability::{Readability, ReadabilityConfig, ReadabilityConfigBuilder};
#[doc(hidden)]
pub use scoring::{
    ScoreConfig, ScoreResult, base_tag_score, calculate_score, class_id_weight, content_density_score, link_density,
};
pub use scrape::{SiteScraper, collect_links};
pub use sites::{BodyStrategy, Probe, SiteConfig, Source, SourceSelection, clamp_pages};
pub use text::{clean_html, clean_text, pick_title};
