use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a page fetcher.
///
/// `Navigation` and `ContainerMissing` mean the site has no more result pages
/// for this query; the extractor treats them as the end of the sequence.
/// Anything else is fatal.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("result container `{selector}` not found on {url}: {reason}")]
    ContainerMissing {
        url: String,
        selector: String,
        reason: String,
    },

    #[error("page fetcher unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    pub fn is_end_of_results(&self) -> bool {
        matches!(
            self,
            FetchError::Navigation { .. } | FetchError::ContainerMissing { .. }
        )
    }
}

/// Rejected search parameters. Raised before any browser session is opened.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("price upper bound {upper} is below lower bound {lower}")]
    InvertedPriceRange { lower: u32, upper: u32 },

    #[error("number of pages must be at least 1")]
    NoPages,

    #[error("invalid CSS selector `{0}`")]
    Selector(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read previous results at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("previous results at {path} are corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to write results to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}
