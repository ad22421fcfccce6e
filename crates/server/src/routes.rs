//! HTTP routes.
//!
//! | route | response |
//! |---|---|
//! | `GET /health` | `ok` |
//! | `GET /api/scrape/{source}?pages=N` | `[NewsItem]` |
//! | `GET /api/rss` | `[RssArticle]` |
//! | `GET /api/timeline?pages=N` | `{ items, sites, status }` |

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use nongjeong_core::{
    FeedAggregator, FeedConfig, FetchConfig, NewsItem, RssArticle, Scraper, SiteReport, SourceSelection, Timeline,
    UnifiedItem, clamp_pages,
};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;

/// Shared, read-only handles used by every request.
#[derive(Clone)]
pub struct AppState {
    scraper: Arc<Scraper>,
    feeds: Arc<FeedAggregator>,
    scrape_budget: Duration,
}

impl AppState {
    pub fn new(scrape_budget: Duration) -> nongjeong_core::Result<Self> {
        let scraper = Scraper::new(&FetchConfig::default())?;
        let feeds = FeedAggregator::new(&FeedConfig::default())?;
        Ok(Self::with_parts(scraper, feeds, scrape_budget))
    }

    pub fn with_parts(scraper: Scraper, feeds: FeedAggregator, scrape_budget: Duration) -> Self {
        Self { scraper: Arc::new(scraper), feeds: Arc::new(feeds), scrape_budget }
    }
}

/// `pages` is read leniently: anything that is not a number falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct PagesQuery {
    pages: Option<String>,
}

impl PagesQuery {
    fn pages(&self) -> u32 {
        clamp_pages(self.pages.as_deref().and_then(|raw| raw.trim().parse().ok()))
    }
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    items: Vec<UnifiedItem>,
    sites: Vec<SiteReport>,
    status: String,
}

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/scrape/{source}", get(scrape))
        .route("/api/rss", get(rss))
        .route("/api/timeline", get(timeline))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

async fn scrape(
    State(state): State<AppState>, Path(source): Path<String>, Query(query): Query<PagesQuery>,
) -> Result<Json<Vec<NewsItem>>, ApiError> {
    let selection: SourceSelection = source.parse().map_err(|_| ApiError::unknown_source())?;
    let pages = query.pages();

    let items = match selection {
        SourceSelection::One(site) => state.scraper.scrape_site(site, pages).await?,
        SourceSelection::All => {
            let report = state.scraper.scrape_all_report(pages, Some(state.scrape_budget)).await;
            info!(status = %report.status_message(), items = report.items.len(), "all outlets scraped");
            report.items
        }
    };

    Ok(Json(items))
}

async fn rss(State(state): State<AppState>) -> Json<Vec<RssArticle>> {
    Json(state.feeds.fetch_all().await)
}

async fn timeline(State(state): State<AppState>, Query(query): Query<PagesQuery>) -> Json<TimelineResponse> {
    let (articles, report) = tokio::join!(
        state.feeds.fetch_all(),
        state.scraper.scrape_all_report(query.pages(), Some(state.scrape_budget))
    );

    let mut timeline = Timeline::new();
    timeline.merge_rss(&articles);
    timeline.merge_scraped(&report.items);

    Json(TimelineResponse { status: report.status_message(), items: timeline.into_items(), sites: report.sites })
}
