//! Error types for nongjeong operations.
//!
//! [`NongjeongError`] covers the failures that can escape a fetch, a feed read
//! or a whole per-site run. A missing title, an empty body or an unparseable
//! date are not errors: those paths return `Option` and the caller skips the
//! article or leaves the timestamp empty.
//!
//! # Example
//!
//! ```rust
//! use nongjeong_core::{NongjeongError, Result, Source};
//!
//! fn lookup(key: &str) -> Result<Source> {
//!     key.parse::<Source>()
//! }
//!
//! assert!(matches!(lookup("dailynews"), Err(NongjeongError::UnknownSource(_))));
//! ```

use thiserror::Error;

use crate::sites::Source;

/// Main error type for fetching and scraping.
#[derive(Error, Debug)]
pub enum NongjeongError {
    /// Transport errors from reqwest: DNS, connection resets, body reads.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request exceeded the configured network timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The server answered with a non-2xx status.
    #[error("fetch failed {status} for {url}")]
    Status { status: u16, url: String },

    /// A URL could not be parsed or joined against a base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid CSS selector or unusable markup.
    #[error("Failed to parse HTML: {0}")]
    HtmlParse(String),

    /// An RSS/Atom document could not be parsed.
    #[error("Feed {url} could not be read: {message}")]
    Feed { url: String, message: String },

    /// A site key outside the fixed outlet list.
    #[error("source must be one of: nongmin, ikpnews, agrinet, aflnews, all (got {0:?})")]
    UnknownSource(String),

    /// An entire per-site run failed, e.g. its first listing page was unreachable.
    #[error("{site} scrape failed: {message}")]
    SiteFailure { site: Source, message: String },

    /// A per-site run did not finish inside the caller's wall-clock budget.
    #[error("{site} scrape exceeded its {budget_secs}s budget")]
    BudgetExceeded { site: Source, budget_secs: u64 },
}

/// Result type alias for NongjeongError.
pub type Result<T> = std::result::Result<T, NongjeongError>;
