use crate::error::ConfigError;
use scraper::Selector;
use std::time::Duration;

/// Class of the element wrapping the search result cards
pub const CONTAINER_SELECTOR: &str = ".searchCardList";

/// How a fetcher loads result pages
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// CSS selector of the result-list container to wait for
    pub container_selector: String,
    /// Upper bound on waiting for the container to appear
    pub wait_timeout: Duration,
    /// Show the browser window instead of running headless
    pub headful: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            container_selector: CONTAINER_SELECTOR.to_string(),
            wait_timeout: Duration::from_secs(3),
            headful: false,
        }
    }
}

/// Compiled selectors for the fields of one listing card
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    pub item: Selector,
    pub link: Selector,
    /// Tried in order; later entries are descriptive fallbacks
    pub address: Vec<Selector>,
    pub price: Selector,
}

impl ListingSelectors {
    pub fn new(item: &str, link: &str, address: &[&str], price: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            item: compile(item)?,
            link: compile(link)?,
            address: address
                .iter()
                .map(|css| compile(css))
                .collect::<Result<_, _>>()?,
            price: compile(price)?,
        })
    }

    /// Selectors matching the current search-card markup.
    pub fn streeteasy() -> Result<Self, ConfigError> {
        Self::new(
            "li",
            "a.listingCard-globalLink",
            &[".listingCard-addressLabel", ".listingCard-title"],
            ".price",
        )
    }
}

fn compile(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|_| ConfigError::Selector(css.to_string()))
}
