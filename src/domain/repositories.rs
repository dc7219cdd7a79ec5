//! Repository interfaces for the catalog snapshot
//!
//! The store keeps every generation ever written; only the generation flagged
//! as latest is visible through [`SnapshotStore::read_latest`].

use async_trait::async_trait;
use thiserror::Error;

use super::item::{GenerationInfo, Item};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to prepare database location {path}: {source}")]
    Location {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored row is corrupt: {0}")]
    CorruptRow(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Create the schema if missing. Safe to call on every start.
    async fn initialize(&self) -> StorageResult<()>;

    /// All items of the latest generation; empty before the first replace
    async fn read_latest(&self) -> StorageResult<Vec<Item>>;

    /// Latest items together with their generation info, read as one
    /// consistent view
    async fn read_latest_snapshot(&self) -> StorageResult<(Vec<Item>, Option<GenerationInfo>)> {
        let items = self.read_latest().await?;
        let latest = self.latest_generation().await?;
        Ok((items, latest))
    }

    /// Atomically retire the current latest generation and store `items` as
    /// the new one. Returns the new generation number.
    ///
    /// On error nothing changes: the previous latest generation stays visible.
    async fn replace_latest(&self, items: &[Item]) -> StorageResult<i64>;

    /// Generation number, timestamp and size of the latest generation
    async fn latest_generation(&self) -> StorageResult<Option<GenerationInfo>>;
}
