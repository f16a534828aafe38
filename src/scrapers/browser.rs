use crate::error::FetchError;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::FetchSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Page fetcher backed by a Chrome session.
///
/// The session lives as long as this value; dropping it closes the tab and
/// shuts the browser down.
pub struct ChromeFetcher {
    // Owns the Chrome process; it exits when this is dropped.
    _browser: Browser,
    tab: Arc<Tab>,
    settings: FetchSettings,
}

impl ChromeFetcher {
    /// Launch Chrome and open the tab used for every page of the run
    pub fn launch(settings: FetchSettings) -> Result<Self> {
        info!(
            "Launching {} Chrome...",
            if settings.headful { "visible" } else { "headless" }
        );

        let options = LaunchOptions::default_builder()
            .headless(!settings.headful)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;

        Ok(Self {
            _browser: browser,
            tab,
            settings,
        })
    }

    fn load(tab: &Tab, settings: &FetchSettings, page_url: &str) -> Result<String, FetchError> {
        let navigation = |e: anyhow::Error| FetchError::Navigation {
            url: page_url.to_string(),
            reason: e.to_string(),
        };

        tab.navigate_to(page_url).map_err(navigation)?;
        tab.wait_until_navigated().map_err(navigation)?;

        let container = tab
            .wait_for_element_with_custom_timeout(
                &settings.container_selector,
                settings.wait_timeout,
            )
            .map_err(|e| FetchError::ContainerMissing {
                url: page_url.to_string(),
                selector: settings.container_selector.clone(),
                reason: e.to_string(),
            })?;

        container
            .get_content()
            .map_err(|e| FetchError::Unavailable(format!("reading result container: {}", e)))
    }
}

#[async_trait]
impl PageFetcher for ChromeFetcher {
    async fn fetch_container(&self, page_url: &str) -> Result<String, FetchError> {
        debug!("Opening {}", page_url);

        let tab = Arc::clone(&self.tab);
        let settings = self.settings.clone();
        let url = page_url.to_string();

        let html = tokio::task::spawn_blocking(move || Self::load(&tab, &settings, &url))
            .await
            .map_err(|e| FetchError::Unavailable(format!("browser task failed: {}", e)))??;

        debug!("Result container is {} bytes", html.len());
        Ok(html)
    }

    fn engine_name(&self) -> &'static str {
        "chrome"
    }
}

impl Drop for ChromeFetcher {
    fn drop(&mut self) {
        info!("Closing browser session");
        if let Err(e) = self.tab.close(false) {
            warn!("Failed to close tab cleanly: {}", e);
        }
    }
}
