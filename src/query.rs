use crate::models::SearchRequest;
use sha1::{Digest, Sha1};

pub const DEFAULT_SITE: &str = "https://streeteasy.com";

/// Search URL and the query identifier derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedQuery {
    pub url: String,
    pub query_id: String,
}

/// Build the rental search URL and query identifier for a request.
pub fn encode(site: &str, req: &SearchRequest) -> EncodedQuery {
    let mut filters = format!(
        "{}/price:{}-{}|beds:{}",
        req.location, req.price_lower_bound, req.price_upper_bound, req.bedrooms
    );
    if !req.include_fee {
        filters.push_str("|no_fee");
    }

    EncodedQuery {
        url: format!("{}/for-rent/{}", site.trim_end_matches('/'), filters),
        query_id: format!("{}|{}", filters, req.max_pages),
    }
}

/// URL of one results page (1-based).
pub fn page_url(url: &str, page: u32) -> String {
    format!("{}/?page={}", url, page)
}

/// Output file name for a query: `results-{sha1 hex}.json`.
pub fn results_file_name(query_id: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(query_id.as_bytes());
    format!("results-{:x}.json", hasher.finalize())
}

/// Drop everything from the first `?` onward.
pub fn sanitize_link(link: &str) -> &str {
    link.split('?').next().unwrap_or_default()
}
