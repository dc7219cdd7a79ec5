//! Parsing configuration for HTML extraction
//!
//! The listing markup contract of the tracked storefront, in one place.

use serde::{Deserialize, Serialize};

use crate::infrastructure::config::defaults;

/// Main parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Origin prefixed to relative product links
    pub origin: String,

    /// Placeholder in lazy-loaded image URLs replaced by `photo_width`
    pub width_placeholder: String,

    /// Width substituted into image URLs (largest the CDN serves)
    pub photo_width: String,

    /// Attribute holding the lazy-load image URL
    pub image_source_attribute: String,

    /// Text of the label marking an item as sold out
    pub sold_out_text: String,

    pub selectors: CatalogSelectors,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            origin: defaults::ORIGIN.to_string(),
            width_placeholder: "{width}".to_string(),
            photo_width: "1200".to_string(),
            image_source_attribute: "data-src".to_string(),
            sold_out_text: "売り切れ".to_string(),
            selectors: CatalogSelectors::default(),
        }
    }
}

impl ParsingConfig {
    /// Default markup contract with a different origin
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }
}

/// CSS selectors for catalog listing pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSelectors {
    /// One element per product listing
    pub listing_block: String,
    /// First match inside a block is the product link
    pub product_link: String,
    pub image: String,
    pub name: String,
    pub price: String,
    pub label: String,
    pub pagination_root: String,
    pub pagination_number: String,
}

impl Default for CatalogSelectors {
    fn default() -> Self {
        Self {
            listing_block: "div.product--root".to_string(),
            product_link: "a[href]".to_string(),
            image: "img.lazyload".to_string(),
            name: "h2.product_name".to_string(),
            price: "div.product_price".to_string(),
            label: "div.product--label".to_string(),
            pagination_root: "div.pagination--root".to_string(),
            pagination_number: "li.pagination--number".to_string(),
        }
    }
}
