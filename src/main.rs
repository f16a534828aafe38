mod cli;
mod error;
mod models;
mod pipeline;
mod query;
mod scrapers;
mod store;

use cli::{Args, Engine};
use scrapers::{ChromeFetcher, HttpFetcher, ListingSelectors, PageFetcher};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse_with_legacy_flags();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("🏠 StreetEasy Scout");
    info!("==================");

    // Reject bad parameters before a browser is started
    let request = args.search_request()?;
    let selectors = ListingSelectors::streeteasy()?;
    let options = args.run_options();

    let fetcher: Box<dyn PageFetcher> = match args.engine {
        Engine::Chrome => Box::new(ChromeFetcher::launch(args.fetch_settings())?),
        Engine::Http => Box::new(HttpFetcher::new(args.fetch_settings())?),
    };

    // The browser session is dropped, and closed, on every path out of here.
    let summary = pipeline::run_query(fetcher.as_ref(), &selectors, &request, &options).await?;
    drop(fetcher);

    if summary.pages_loaded == 0 {
        warn!("No pages loaded; the site may be blocking requests");
    } else if summary.outcome.result_set.is_empty() {
        warn!("No listings found for this query");
    }
    info!(
        "✅ Extracted {} listings from {} pages, {} unique",
        summary.records_extracted,
        summary.pages_loaded,
        summary.outcome.result_set.len()
    );
    info!("Query: {}", summary.query.query_id);
    info!("💾 Results in {}", summary.outcome.path.display());

    Ok(())
}
