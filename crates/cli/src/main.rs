use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use nongjeong_core::{
    FeedAggregator, FeedConfig, FetchConfig, Scraper, SiteConfig, Source, SourceProgress, SourceSelection, Timeline,
    UnifiedItem,
};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

mod echo;
mod render;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(format!("Invalid format: {}. Valid options: json, text", s)),
        }
    }
}

#[derive(ClapArgs, Debug)]
struct OutputArgs {
    /// Output format (json, text)
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape one outlet, or all of them
    Scrape {
        /// nongmin, ikpnews, agrinet, aflnews or all
        #[arg(value_name = "SOURCE")]
        source: SourceSelection,

        /// Listing pages per outlet
        #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=5))]
        pages: u32,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Fetch the government RSS feeds
    Rss {
        #[command(flatten)]
        out: OutputArgs,
    },

    /// RSS plus every outlet, merged newest first
    Timeline {
        /// Listing pages per outlet
        #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=5))]
        pages: u32,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// List the outlets and their sites
    Sources {
        #[command(flatten)]
        out: OutputArgs,
    },
}

/// Collect Korean agricultural news from outlet websites and government feeds
#[derive(Parser, Debug)]
#[command(name = "nongjeong")]
#[command(version)]
#[command(about = "Collect Korean agricultural news", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// HTTP timeout in seconds
    #[arg(long, global = true, default_value = "20", value_name = "SECS")]
    timeout: u64,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "nongjeong_core=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn emit<T: Serialize + ?Sized>(value: &T, text: impl FnOnce() -> String, out: &OutputArgs) -> anyhow::Result<()> {
    let rendered = match out.format {
        OutputFormat::Json => serde_json::to_string_pretty(value).context("Failed to serialize output")? + "\n",
        OutputFormat::Text => text(),
    };

    match &out.output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

async fn scrape(args: &Args, source: SourceSelection, pages: u32, out: &OutputArgs) -> anyhow::Result<()> {
    let scraper = Scraper::new(&FetchConfig { timeout: args.timeout, ..FetchConfig::default() })
        .context("Failed to build HTTP client")?;
    let started = Instant::now();

    let items = match source {
        SourceSelection::One(site) => {
            echo::print_step(1, 2, &format!("Scraping {} ({} pages)", site.label(), pages));
            scraper
                .scrape_site(site, pages)
                .await
                .with_context(|| format!("Failed to scrape {}", site.key()))?
        }
        SourceSelection::All => {
            echo::print_step(1, 2, &format!("Scraping all outlets ({} pages each)", pages));
            let report = scraper.scrape_all_report(pages, None).await;
            echo::print_site_reports(&report.sites);
            if !report.all_done() {
                echo::print_warning(&report.status_message());
            }
            report.items
        }
    };

    echo::print_step(2, 2, &format!("{} articles", items.len()));
    if args.verbose {
        echo::print_timing("Scrape", started.elapsed());
    }
    emit(&items, || render::news_items(&items), out)
}

async fn rss(out: &OutputArgs) -> anyhow::Result<()> {
    let aggregator = FeedAggregator::new(&FeedConfig::default()).context("Failed to build HTTP client")?;

    echo::print_step(1, 1, &format!("Fetching {} feeds", aggregator.feeds().len()));
    let articles = aggregator.fetch_all().await;
    echo::print_success(&format!("{} feed entries", articles.len()));

    emit(&articles, || render::rss_articles(&articles), out)
}

/// RSS first, then one outlet at a time, merging as results arrive.
async fn timeline(args: &Args, pages: u32, out: &OutputArgs) -> anyhow::Result<()> {
    let feeds = FeedAggregator::new(&FeedConfig::default()).context("Failed to build HTTP client")?;
    let scraper = Scraper::new(&FetchConfig { timeout: args.timeout, ..FetchConfig::default() })
        .context("Failed to build HTTP client")?;
    let total = scraper.sites().len() + 1;
    let started = Instant::now();

    let mut timeline = Timeline::new();

    echo::print_step(1, total, "RSS");
    let articles = feeds.fetch_all().await;
    let outcome = timeline.merge_rss(&articles);
    echo::print_info(&format!("RSS 준비 완료: {} / {}", outcome.added, articles.len()));

    let mut failures = Vec::new();
    for (index, site) in scraper.sites().iter().enumerate() {
        let mut progress = SourceProgress::new(site.source);
        progress.start();
        echo::print_step(index + 2, total, site.source.label());

        match scraper.scrape_site(site.source, pages).await {
            Ok(items) => {
                let outcome = timeline.merge_scraped(&items);
                progress.finish(items.len(), outcome);
            }
            Err(err) => {
                failures.push(format!("{} 실패", site.source.label()));
                progress.fail(err.to_string());
            }
        }
        echo::print_progress(&progress);
    }

    if failures.is_empty() {
        echo::print_success(&format!("완료: {} items", timeline.len()));
    } else {
        echo::print_warning(&format!("완료 ({})", failures.join(", ")));
    }
    if args.verbose {
        echo::print_timing("Timeline", started.elapsed());
    }

    let items: Vec<UnifiedItem> = timeline.into_items();
    emit(&items, || render::timeline(&items), out)
}

fn sources(out: &OutputArgs) -> anyhow::Result<()> {
    let sites: Vec<SiteConfig> = Source::ALL.into_iter().map(SiteConfig::for_source).collect();
    let rows: Vec<_> = sites
        .iter()
        .map(|site| json!({ "key": site.source.key(), "label": site.source.label(), "url": site.base_url.as_str() }))
        .collect();
    emit(&rows, || render::sources(&sites), out)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    tracing::debug!(command = ?args.command, timeout = args.timeout, "starting");

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    match &args.command {
        Command::Scrape { source, pages, out } => scrape(&args, *source, *pages, out).await,
        Command::Rss { out } => rss(out).await,
        Command::Timeline { pages, out } => timeline(&args, *pages, out).await,
        Command::Sources { out } => sources(out),
    }
}
