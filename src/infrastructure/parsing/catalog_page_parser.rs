//! Catalog listing page parser
//!
//! Extracts one [`Item`] per listing block and reads the page count from the
//! pagination bar.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::config::ParsingConfig;
use super::{CatalogExtractor, ParsingError, ParsingResult};
use crate::domain::{Item, identity_key_from_url};

/// Parser for the storefront's collection listing pages
pub struct CatalogPageParser {
    config: ParsingConfig,
    listing_block: Selector,
    product_link: Selector,
    image: Selector,
    name: Selector,
    price: Selector,
    label: Selector,
    pagination_root: Selector,
    pagination_number: Selector,
}

impl CatalogPageParser {
    /// Create a parser with the default markup contract
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(ParsingConfig::default())
    }

    /// Create a parser from an explicit configuration
    pub fn with_config(config: ParsingConfig) -> ParsingResult<Self> {
        let selectors = &config.selectors;
        Ok(Self {
            listing_block: compile(&selectors.listing_block)?,
            product_link: compile(&selectors.product_link)?,
            image: compile(&selectors.image)?,
            name: compile(&selectors.name)?,
            price: compile(&selectors.price)?,
            label: compile(&selectors.label)?,
            pagination_root: compile(&selectors.pagination_root)?,
            pagination_number: compile(&selectors.pagination_number)?,
            config,
        })
    }

    fn extract_item(&self, block: &ElementRef, index: usize) -> Item {
        let product_url = self.extract_product_url(block);
        let photo_url = self.extract_photo_url(block);
        let name = text_of(block, &self.name);
        let price = text_of(block, &self.price);

        for (field, missing) in [
            ("product_url", product_url.is_none()),
            ("photo_url", photo_url.is_none()),
            ("name", name.is_none()),
            ("price", price.is_none()),
        ] {
            if missing {
                debug!("Listing block {} has no {}; using empty value", index, field);
            }
        }

        let product_url = product_url.unwrap_or_default();
        Item {
            identity_key: identity_key_from_url(&product_url),
            name: name.unwrap_or_default(),
            price: price.unwrap_or_default(),
            photo_url: photo_url.unwrap_or_default(),
            product_url,
            is_sold_out: self.is_sold_out(block),
        }
    }

    fn extract_product_url(&self, block: &ElementRef) -> Option<String> {
        let href = block
            .select(&self.product_link)
            .find_map(|anchor| anchor.value().attr("href"))?;
        Some(self.resolve_url(href))
    }

    /// Absolute hrefs pass through; anything else is joined to the origin
    fn resolve_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.config.origin.trim_end_matches('/'), href)
        } else {
            format!("{}/{}", self.config.origin.trim_end_matches('/'), href)
        }
    }

    fn extract_photo_url(&self, block: &ElementRef) -> Option<String> {
        block
            .select(&self.image)
            .next()
            .and_then(|img| img.value().attr(&self.config.image_source_attribute))
            .map(|src| src.replace(&self.config.width_placeholder, &self.config.photo_width))
    }

    fn is_sold_out(&self, block: &ElementRef) -> bool {
        block
            .select(&self.label)
            .any(|label| label.text().collect::<String>().trim() == self.config.sold_out_text)
    }
}

impl CatalogExtractor for CatalogPageParser {
    fn extract_items(&self, html: &str) -> ParsingResult<Vec<Item>> {
        let document = Html::parse_document(html);
        let blocks: Vec<ElementRef> = document.select(&self.listing_block).collect();

        if blocks.is_empty() {
            return Err(ParsingError::NoListingBlocks {
                selector: self.config.selectors.listing_block.clone(),
            });
        }

        let items: Vec<Item> = blocks
            .iter()
            .enumerate()
            .map(|(index, block)| self.extract_item(block, index))
            .collect();

        debug!("Extracted {} items from listing page", items.len());
        Ok(items)
    }

    fn page_count(&self, html: &str) -> ParsingResult<u32> {
        let document = Html::parse_document(html);
        let Some(root) = document.select(&self.pagination_root).next() else {
            return Ok(1);
        };

        let text = root
            .select(&self.pagination_number)
            .last()
            .map(|number| number.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        match text.parse::<u32>() {
            Ok(count) if count >= 1 => Ok(count),
            _ => Err(ParsingError::InvalidPagination { text }),
        }
    }
}

fn compile(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

/// Trimmed text of the first match, `None` when nothing matches
fn text_of(block: &ElementRef, selector: &Selector) -> Option<String> {
    block
        .select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
}
