use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One catalog product as observed on a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Deduplication key: the final path segment of `product_url`.
    /// Empty only when the listing block had no product link.
    pub identity_key: String,
    pub name: String,
    /// Display-formatted price, kept exactly as the site renders it
    pub price: String,
    /// Highest-resolution photo URL, empty when the block has no image
    pub photo_url: String,
    pub product_url: String,
    pub is_sold_out: bool,
}

impl Item {
    /// Build an item whose identity key is derived from `product_url`
    pub fn new(
        name: impl Into<String>,
        price: impl Into<String>,
        photo_url: impl Into<String>,
        product_url: impl Into<String>,
        is_sold_out: bool,
    ) -> Self {
        let product_url = product_url.into();
        Self {
            identity_key: identity_key_from_url(&product_url),
            name: name.into(),
            price: price.into(),
            photo_url: photo_url.into(),
            product_url,
            is_sold_out,
        }
    }

    /// Line used in notifications: `"{name} - {price}"`
    pub fn summary_line(&self) -> String {
        format!("{} - {}", self.name, self.price)
    }
}

/// Derive the identity key of a product from its canonical URL.
///
/// The key is everything after the last `/`, so `https://host/products/abc`
/// yields `abc`. An empty URL yields an empty key.
pub fn identity_key_from_url(product_url: &str) -> String {
    product_url
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Summary of the generation currently flagged as latest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationInfo {
    pub generation: i64,
    pub recorded_at: DateTime<Utc>,
    pub item_count: u64,
}
