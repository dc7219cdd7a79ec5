//! SQLite implementation of the catalog snapshot store
//!
//! One table holds every generation ever written. A replace runs in a single
//! transaction: retire the current latest rows, insert the new generation,
//! commit. Readers on other connections keep seeing the old generation until
//! the commit lands (WAL mode), and a failed replace rolls back completely.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::domain::{GenerationInfo, Item, SnapshotStore, StorageError, StorageResult};

const SCHEMA: [&str; 3] = [
    r"
    CREATE TABLE IF NOT EXISTS snapshot_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        generation INTEGER NOT NULL,
        identity_key TEXT NOT NULL,
        name TEXT NOT NULL,
        price TEXT NOT NULL,
        photo_url TEXT NOT NULL,
        product_url TEXT NOT NULL,
        is_sold_out INTEGER NOT NULL DEFAULT 0,
        is_latest INTEGER NOT NULL DEFAULT 0,
        recorded_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_snapshot_items_latest ON snapshot_items (is_latest)",
    "CREATE INDEX IF NOT EXISTS idx_snapshot_items_generation ON snapshot_items (generation, identity_key)",
];

/// Snapshot store backed by the `snapshot_items` table
#[derive(Clone)]
pub struct SqliteSnapshotStore {
    pool: SqlitePool,
}

impl SqliteSnapshotStore {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn item_from_row(row: &SqliteRow) -> StorageResult<Item> {
        Ok(Item {
            identity_key: row.try_get("identity_key")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            photo_url: row.try_get("photo_url")?,
            product_url: row.try_get("product_url")?,
            is_sold_out: row.try_get("is_sold_out")?,
        })
    }

    async fn fetch_latest_items(conn: &mut SqliteConnection) -> StorageResult<Vec<Item>> {
        let rows = sqlx::query(
            r"
            SELECT identity_key, name, price, photo_url, product_url, is_sold_out
            FROM snapshot_items
            WHERE is_latest = 1
            ORDER BY id ASC
            ",
        )
        .fetch_all(&mut *conn)
        .await?;

        rows.iter().map(Self::item_from_row).collect()
    }

    async fn fetch_latest_generation(conn: &mut SqliteConnection) -> StorageResult<Option<GenerationInfo>> {
        let row = sqlx::query(
            r"
            SELECT generation, recorded_at,
                   (SELECT COUNT(*) FROM snapshot_items WHERE is_latest = 1) AS item_count
            FROM snapshot_items
            WHERE is_latest = 1
            ORDER BY id ASC
            LIMIT 1
            ",
        )
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_count: i64 = row.try_get("item_count")?;
        let recorded_at: DateTime<Utc> = row.try_get("recorded_at")?;
        Ok(Some(GenerationInfo {
            generation: row.try_get("generation")?,
            recorded_at,
            item_count: u64::try_from(item_count)
                .map_err(|_| StorageError::CorruptRow(format!("negative item count {item_count}")))?,
        }))
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn initialize(&self) -> StorageResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Snapshot schema ready");
        Ok(())
    }

    async fn read_latest(&self) -> StorageResult<Vec<Item>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_latest_items(&mut *conn).await
    }

    async fn read_latest_snapshot(&self) -> StorageResult<(Vec<Item>, Option<GenerationInfo>)> {
        let mut tx = self.pool.begin().await?;
        let items = Self::fetch_latest_items(&mut *tx).await?;
        let latest = Self::fetch_latest_generation(&mut *tx).await?;
        tx.commit().await?;
        Ok((items, latest))
    }

    async fn replace_latest(&self, items: &[Item]) -> StorageResult<i64> {
        let mut tx = self.pool.begin().await?;

        let generation: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(generation), 0) + 1 FROM snapshot_items")
                .fetch_one(&mut *tx)
                .await?;

        let retired = sqlx::query("UPDATE snapshot_items SET is_latest = 0 WHERE is_latest = 1")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let recorded_at = Utc::now();
        for item in items {
            sqlx::query(
                r"
                INSERT INTO snapshot_items
                (generation, identity_key, name, price, photo_url, product_url, is_sold_out, is_latest, recorded_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)
                ",
            )
            .bind(generation)
            .bind(&item.identity_key)
            .bind(&item.name)
            .bind(&item.price)
            .bind(&item.photo_url)
            .bind(&item.product_url)
            .bind(item.is_sold_out)
            .bind(recorded_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            "Committed snapshot generation {} ({} items, {} rows retired)",
            generation,
            items.len(),
            retired
        );
        Ok(generation)
    }

    async fn latest_generation(&self) -> StorageResult<Option<GenerationInfo>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_latest_generation(&mut *conn).await
    }
}
