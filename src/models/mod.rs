use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Search parameters for one rental query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Neighborhood or area code, passed to the site verbatim
    pub location: String,
    pub price_lower_bound: u32,
    pub price_upper_bound: u32,
    pub bedrooms: u32,
    /// When false the `no_fee` filter is applied
    pub include_fee: bool,
    pub max_pages: u32,
}

impl SearchRequest {
    pub fn new(
        location: impl Into<String>,
        price_lower_bound: u32,
        price_upper_bound: u32,
        bedrooms: u32,
        include_fee: bool,
        max_pages: u32,
    ) -> Result<Self, ConfigError> {
        if price_upper_bound < price_lower_bound {
            return Err(ConfigError::InvertedPriceRange {
                lower: price_lower_bound,
                upper: price_upper_bound,
            });
        }
        if max_pages == 0 {
            return Err(ConfigError::NoPages);
        }

        Ok(Self {
            location: location.into(),
            price_lower_bound,
            price_upper_bound,
            bedrooms,
            include_fee,
            max_pages,
        })
    }
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            location: "ues".to_string(),
            price_lower_bound: 0,
            price_upper_bound: 3000,
            bedrooms: 1,
            include_fee: false,
            max_pages: 1,
        }
    }
}

/// One listing card pulled from a results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub link: String,
    pub address: String,
    pub price: String,
}

/// Stored value for a listing link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingDetails {
    pub address: String,
    pub price: String,
}

/// All listings found for one query, keyed by sanitized link.
///
/// Serializes as a flat JSON object: one entry per link plus the `"query"` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultSet {
    #[serde(flatten)]
    pub listings: BTreeMap<String, ListingDetails>,
    pub query: String,
}

impl ResultSet {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            listings: BTreeMap::new(),
            query: query.into(),
        }
    }

    /// Insert a record, replacing any earlier record with the same link.
    pub fn insert(&mut self, record: ListingRecord) {
        self.listings.insert(
            record.link,
            ListingDetails {
                address: record.address,
                price: record.price,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

impl Extend<ListingRecord> for ResultSet {
    fn extend<I: IntoIterator<Item = ListingRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}
