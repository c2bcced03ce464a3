//! # Climate Scraper
//!
//! Crawls the news-list pages of configured climate and weather sites,
//! follows links to article pages and extracts one structured record per
//! article: url, header, tags, body text, date and a dedup index.
//!
//! ## Usage
//!
//! ```sh
//! climate_scraper -c config.yaml -o ./out
//! ```
//!
//! ## Architecture
//!
//! For every configured spider:
//! 1. **Index loading**: read the indexes scraped during the past week
//! 2. **Indexing**: fetch the news-list page and keep links to new articles
//! 3. **Fetching**: download the article pages concurrently
//! 4. **Extraction**: classify article body blocks and rebuild the text
//! 5. **Output**: write the run's records as a JSON session file

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod error;
mod extract;
mod fetch;
mod index;
mod index_service;
mod models;
mod outputs;
mod spider;
mod utils;

use cli::Cli;
use config::Config;
use fetch::{FetchAsync, HttpFetcher, RetryFetch};
use index_service::IndexService;
use outputs::{json, session::StorageSession};
use spider::Spider;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("climate_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration: every spider is compiled before any request ----
    let config = config::load_config(&args.config).await?;
    let spiders = config
        .select_spiders(&args.spiders)?
        .into_iter()
        .map(|spider| Spider::from_config(spider, &config.format, &config.storage.date_format))
        .collect::<Result<Vec<_>, _>>()?;
    info!(count = spiders.len(), "Spiders ready");

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let index_service = match (&args.index_url, args.no_dedup) {
        (_, true) => IndexService::Disabled,
        (Some(url), false) => IndexService::http(url.clone()),
        (None, false) => IndexService::archive(&args.output_dir),
    };

    let fetcher = RetryFetch::new(
        HttpFetcher::new(&config.crawl)?,
        config.crawl.max_retries,
        Duration::from_millis(config.crawl.retry_base_delay_ms),
    );
    let concurrency = args.concurrency.unwrap_or(config.crawl.concurrency);

    let mut total = 0usize;
    let mut failed = 0usize;
    for spider in &spiders {
        match run_spider(spider, &config, &index_service, &fetcher, concurrency, &args).await {
            Ok(count) => total += count,
            Err(e) => {
                failed += 1;
                error!(spider = %spider.name(), error = %e, "Spider run failed");
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        articles = total,
        spiders = spiders.len(),
        failed_spiders = failed,
        "Execution complete"
    );

    Ok(())
}

/// Load known indexes, crawl, and store one spider's session.
#[instrument(level = "info", skip_all, fields(spider = %spider.name()))]
async fn run_spider<F: FetchAsync>(
    spider: &Spider,
    config: &Config,
    index_service: &IndexService,
    fetcher: &F,
    concurrency: usize,
    args: &Cli,
) -> Result<usize, Box<dyn Error>> {
    let known = index_service.fetch_known_indexes(spider.name()).await?;

    let mut session = StorageSession::open(spider.name(), &config.storage);
    session.extend(spider::crawl(spider, fetcher, &known, concurrency).await?);
    let count = session.len();

    let path = json::write_session(&session.close(), &args.output_dir).await?;
    info!(path = %path.display(), articles = count, "Spider run stored");
    Ok(count)
}
