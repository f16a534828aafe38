pub mod browser;
pub mod extract;
pub mod http;
pub mod traits;
pub mod types;

pub use browser::ChromeFetcher;
pub use extract::ResultPages;
pub use http::HttpFetcher;
pub use traits::PageFetcher;
pub use types::{FetchSettings, ListingSelectors};
