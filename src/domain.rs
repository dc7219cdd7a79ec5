//! Domain module - catalog items, snapshot generations and the store contract
//!
//! Everything in here is free of network and database access. Infrastructure
//! adapters implement the traits declared in [`repositories`].

pub mod catalog_diff;
pub mod events;
pub mod item;
pub mod repositories;
pub mod stock_filter;

pub use catalog_diff::{known_identity_keys, unseen_items};
pub use events::CatalogEvent;
pub use item::{GenerationInfo, Item, identity_key_from_url};
pub use repositories::{SnapshotStore, StorageError, StorageResult};
pub use stock_filter::StockFilter;
