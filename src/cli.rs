use crate::error::ConfigError;
use crate::models::SearchRequest;
use crate::pipeline::RunOptions;
use crate::query::DEFAULT_SITE;
use crate::scrapers::FetchSettings;
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Two-letter single-dash flags accepted alongside the long forms
const LEGACY_SHORT_FLAGS: &[(&str, &str)] = &[
    ("-pl", "--price-lower-bound"),
    ("-pu", "--price-upper-bound"),
    ("-nb", "--num-bedrooms"),
    ("-hf", "--has-fee"),
    ("-cd", "--check-diff"),
    ("-np", "--num-pages"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Engine {
    /// Headless Chrome
    Chrome,
    /// Plain HTTP requests, no JavaScript
    Http,
}

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Parse StreetEasy rental results for a given query with given parameters."
)]
pub struct Args {
    /// Location to search for
    #[clap(short, long, default_value = "ues")]
    pub location: String,

    /// Lower bound of rental price
    #[clap(long, default_value_t = 0)]
    pub price_lower_bound: u32,

    /// Upper bound of rental price
    #[clap(long, default_value_t = 3000)]
    pub price_upper_bound: u32,

    /// Number of bedrooms
    #[clap(long, default_value_t = 1)]
    pub num_bedrooms: u32,

    /// Include apartments that have a signing fee
    #[clap(long)]
    pub has_fee: bool,

    /// Check diff between queries if the same query file has been created before
    #[clap(long)]
    pub check_diff: bool,

    /// Number of pages to iterate through
    #[clap(long, default_value_t = 1)]
    pub num_pages: u32,

    /// Browser engine used to load result pages
    #[clap(long, value_enum, default_value_t = Engine::Chrome)]
    pub engine: Engine,

    /// Show the browser window
    #[clap(long)]
    pub headful: bool,

    /// Site root
    #[clap(long, default_value = DEFAULT_SITE)]
    pub site: String,

    /// Seconds to wait for the result list to appear
    #[clap(long, default_value_t = 3)]
    pub wait_timeout_secs: u64,

    /// Delay before each page request, in milliseconds
    #[clap(long, default_value_t = 1000)]
    pub page_delay_ms: u64,

    /// Directory results files are written to
    #[clap(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Log per-listing detail
    #[clap(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse process arguments, accepting the two-letter short flags.
    pub fn parse_with_legacy_flags() -> Self {
        Self::parse_from(expand_legacy_flags(std::env::args_os()))
    }

    pub fn search_request(&self) -> Result<SearchRequest, ConfigError> {
        SearchRequest::new(
            self.location.clone(),
            self.price_lower_bound,
            self.price_upper_bound,
            self.num_bedrooms,
            self.has_fee,
            self.num_pages,
        )
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            wait_timeout: Duration::from_secs(self.wait_timeout_secs),
            headful: self.headful,
            ..FetchSettings::default()
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            site: self.site.clone(),
            output_dir: self.output_dir.clone(),
            check_diff: self.check_diff,
            page_delay: Duration::from_millis(self.page_delay_ms),
        }
    }
}

/// Rewrite `-pl 100` / `-pl=100` style flags to their long names.
pub fn expand_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| legacy_replacement(&arg).unwrap_or(arg))
        .collect()
}

fn legacy_replacement(arg: &OsString) -> Option<OsString> {
    let text = arg.to_str()?;
    let (flag, value) = match text.split_once('=') {
        Some((flag, value)) => (flag, Some(value)),
        None => (text, None),
    };
    let (_, long) = LEGACY_SHORT_FLAGS.iter().find(|(short, _)| *short == flag)?;

    Some(match value {
        Some(value) => OsString::from(format!("{}={}", long, value)),
        None => OsString::from(*long),
    })
}
