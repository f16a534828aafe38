use crate::error::FetchError;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::FetchSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Page fetcher that downloads result pages without a browser.
///
/// Only useful when the site serves the result list in the initial HTML.
pub struct HttpFetcher {
    client: Client,
    container: Selector,
    settings: FetchSettings,
}

impl HttpFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.wait_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        let container = Selector::parse(&settings.container_selector).map_err(|_| {
            anyhow::anyhow!(
                "invalid container selector `{}`",
                settings.container_selector
            )
        })?;

        Ok(Self {
            client,
            container,
            settings,
        })
    }

    /// Cut the result container out of a full page.
    fn container_html(&self, page_url: &str, html: &str) -> Result<String, FetchError> {
        let document = Html::parse_document(html);
        document
            .select(&self.container)
            .next()
            .map(|container| container.html())
            .ok_or_else(|| FetchError::ContainerMissing {
                url: page_url.to_string(),
                selector: self.settings.container_selector.clone(),
                reason: "not present in page".to_string(),
            })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_container(&self, page_url: &str) -> Result<String, FetchError> {
        debug!("Fetching URL: {}", page_url);

        let navigation = |reason: String| FetchError::Navigation {
            url: page_url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(page_url)
            .send()
            .await
            .map_err(|e| navigation(e.to_string()))?;

        if !response.status().is_success() {
            warn!("Site returned status: {}", response.status());
            return Err(navigation(format!("status {}", response.status())));
        }

        let html = response.text().await.map_err(|e| navigation(e.to_string()))?;
        debug!("Downloaded {} bytes of HTML", html.len());

        self.container_html(page_url, &html)
    }

    fn engine_name(&self) -> &'static str {
        "http"
    }
}
