//! Shared application context
//!
//! Built once at startup and handed to the scheduler and the read view.
//! Cloning is cheap; every clone sees the same store and tick record.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::SnapshotStore;

/// How a scheduler tick ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TickStatus {
    NoUpdate,
    Updated { new_items: usize, generation: i64 },
    Failed { error: String },
}

/// Outcome of the most recent scheduler tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRecord {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: TickStatus,
}

#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn SnapshotStore>,
    pub check_interval: Duration,
    last_tick: Arc<RwLock<Option<TickRecord>>>,
}

impl AppContext {
    #[must_use]
    pub fn new(store: Arc<dyn SnapshotStore>, check_interval: Duration) -> Self {
        Self {
            store,
            check_interval,
            last_tick: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn record_tick(&self, record: TickRecord) {
        *self.last_tick.write().await = Some(record);
    }

    pub async fn last_tick(&self) -> Option<TickRecord> {
        self.last_tick.read().await.clone()
    }
}
