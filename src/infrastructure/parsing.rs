//! HTML parsing infrastructure for catalog listing pages

pub mod catalog_page_parser;
pub mod config;
pub mod error;

pub use catalog_page_parser::CatalogPageParser;
pub use config::{CatalogSelectors, ParsingConfig};
pub use error::{ParsingError, ParsingResult};

use crate::domain::Item;

/// Turns one listing page's markup into canonical items.
///
/// Implementations are pure: no network or storage access.
pub trait CatalogExtractor: Send + Sync {
    /// Items in document order
    fn extract_items(&self, html: &str) -> ParsingResult<Vec<Item>>;

    /// Total number of catalog pages announced by the pagination markup;
    /// `1` when the page has no pagination
    fn page_count(&self, html: &str) -> ParsingResult<u32>;
}
