use crate::error::FetchError;
use async_trait::async_trait;

/// Loads one search-results page and hands back the result-list container.
///
/// Each browser engine gets its own implementation; the extraction logic only
/// sees the container markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Navigate to `page_url`, wait for the result container and return its
    /// outer HTML.
    async fn fetch_container(&self, page_url: &str) -> Result<String, FetchError>;

    /// Name of the engine behind this fetcher
    fn engine_name(&self) -> &'static str;
}
