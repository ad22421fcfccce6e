use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;

use config::ServerConfig;
use routes::{AppState, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env()?;
    let state = AppState::new(config.scrape_budget)?;
    let app = router(state, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(
        addr = %config.addr,
        request_timeout = config.request_timeout.as_secs(),
        scrape_budget = config.scrape_budget.as_secs(),
        "listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
