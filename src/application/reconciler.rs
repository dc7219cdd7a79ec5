//! Catalog reconciliation
//!
//! One call compares the first listing page with the latest stored snapshot
//! and, when page 1 holds unseen items, replaces the snapshot with the full
//! fetched catalog and publishes a [`CatalogEvent::NewItems`].

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::{CatalogEvent, Item, SnapshotStore, StorageError, known_identity_keys, unseen_items};
use crate::infrastructure::{CatalogExtractor, CatalogSource, FetchError, ParsingError};

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Failed to fetch page {page}: {source}")]
    Fetch {
        page: u32,
        #[source]
        source: FetchError,
    },

    #[error("Failed to parse page {page}: {source}")]
    Parse {
        page: u32,
        #[source]
        source: ParsingError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Page 1 held nothing unseen; storage was not touched
    NoUpdate,
    Updated {
        /// Unseen items from page 1, in page order
        new_items: Vec<Item>,
        /// Size of the full catalog written as the new generation
        stored_count: usize,
        generation: i64,
        page_count: u32,
    },
}

impl ReconcileOutcome {
    pub fn new_item_count(&self) -> usize {
        match self {
            Self::NoUpdate => 0,
            Self::Updated { new_items, .. } => new_items.len(),
        }
    }
}

pub struct Reconciler {
    source: Arc<dyn CatalogSource>,
    extractor: Arc<dyn CatalogExtractor>,
    store: Arc<dyn SnapshotStore>,
    events: broadcast::Sender<CatalogEvent>,
}

impl Reconciler {
    #[must_use]
    pub fn new(
        source: Arc<dyn CatalogSource>,
        extractor: Arc<dyn CatalogExtractor>,
        store: Arc<dyn SnapshotStore>,
        events: broadcast::Sender<CatalogEvent>,
    ) -> Self {
        Self {
            source,
            extractor,
            store,
            events,
        }
    }

    pub async fn reconcile(&self) -> Result<ReconcileOutcome, ReconcileError> {
        let first_page = self.fetch(1).await?;
        let page_count = self
            .extractor
            .page_count(&first_page)
            .map_err(|source| ReconcileError::Parse { page: 1, source })?;
        info!("Found {} pages of items", page_count);

        let first_page_items = self.extract(1, &first_page)?;
        let known_keys = known_identity_keys(&self.store.read_latest().await?);
        let new_items = unseen_items(&first_page_items, &known_keys);

        if new_items.is_empty() {
            info!("No new items on page 1");
            return Ok(ReconcileOutcome::NoUpdate);
        }
        info!("{} new items on page 1, fetching the full catalog", new_items.len());

        let mut full_catalog = first_page_items;
        for page in 2..=page_count {
            let html = self.fetch(page).await?;
            full_catalog.extend(self.extract(page, &html)?);
        }

        let generation = self.store.replace_latest(&full_catalog).await?;
        info!(
            "Stored generation {} with {} items",
            generation,
            full_catalog.len()
        );

        let event = CatalogEvent::NewItems {
            items: new_items.clone(),
            generation,
            stored_count: full_catalog.len(),
            committed_at: Utc::now(),
        };
        if self.events.send(event).is_err() {
            warn!("No subscriber for catalog events; generation {} not announced", generation);
        }

        Ok(ReconcileOutcome::Updated {
            new_items,
            stored_count: full_catalog.len(),
            generation,
            page_count,
        })
    }

    async fn fetch(&self, page: u32) -> Result<String, ReconcileError> {
        debug!("Fetching page {}", page);
        self.source
            .fetch_page(page)
            .await
            .map_err(|source| ReconcileError::Fetch { page, source })
    }

    fn extract(&self, page: u32, html: &str) -> Result<Vec<Item>, ReconcileError> {
        self.extractor
            .extract_items(html)
            .map_err(|source| ReconcileError::Parse { page, source })
    }
}
