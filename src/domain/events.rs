//! Events published by the reconciliation pipeline
//!
//! Events are only sent after the snapshot they describe has been committed,
//! so consumers never see an update that storage later rolled back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::Item;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEvent {
    /// A new latest generation was committed and page 1 held unseen items
    NewItems {
        /// Unseen items from the first page only, in page order
        items: Vec<Item>,
        generation: i64,
        /// Size of the full catalog stored with this generation
        stored_count: usize,
        committed_at: DateTime<Utc>,
    },
}

impl CatalogEvent {
    pub fn new_items(&self) -> &[Item] {
        match self {
            Self::NewItems { items, .. } => items,
        }
    }
}
