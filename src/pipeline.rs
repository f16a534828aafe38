use crate::models::SearchRequest;
use crate::query::{self, EncodedQuery};
use crate::scrapers::{ListingSelectors, PageFetcher, ResultPages};
use crate::store::{self, MergeOutcome, RemovedListings};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Settings for one run that are not part of the query itself
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub site: String,
    pub output_dir: PathBuf,
    pub check_diff: bool,
    pub page_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            site: query::DEFAULT_SITE.to_string(),
            output_dir: PathBuf::from("."),
            check_diff: false,
            page_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub query: EncodedQuery,
    pub pages_loaded: u32,
    pub records_extracted: usize,
    pub outcome: MergeOutcome,
}

/// Encode the request, walk its result pages and persist what was found.
pub async fn run_query(
    fetcher: &dyn PageFetcher,
    selectors: &ListingSelectors,
    request: &SearchRequest,
    options: &RunOptions,
) -> Result<RunSummary> {
    let encoded = query::encode(&options.site, request);
    info!("Query {} via {}", encoded.query_id, fetcher.engine_name());

    let mut pages = ResultPages::new(fetcher, selectors, &encoded.url, Some(request.max_pages))
        .with_page_delay(options.page_delay);
    let records = pages.collect_all().await?;
    let records_extracted = records.len();

    let path = options
        .output_dir
        .join(query::results_file_name(&encoded.query_id));
    let outcome = store::merge(&path, records, &encoded.query_id, options.check_diff)
        .await
        .context("Failed to persist results")?;

    if let Some(removed) = &outcome.removed {
        report_removed(removed)?;
    }

    Ok(RunSummary {
        query: encoded,
        pages_loaded: pages.pages_loaded(),
        records_extracted,
        outcome,
    })
}

/// Print listings that vanished since the previous run.
fn report_removed(removed: &RemovedListings) -> Result<()> {
    match removed.previous_run {
        Some(when) => info!(
            "{} listings gone since run at {}",
            removed.entries.len(),
            when.format("%Y-%m-%d %H:%M:%S")
        ),
        None => info!("{} listings gone since previous run", removed.entries.len()),
    }
    println!("{}", serde_json::to_string_pretty(&removed.entries)?);
    Ok(())
}
