//! Test utilities for market-tracker
//!
//! Isolated databases, listing-page fixtures and in-process fakes for the
//! catalog source and the snapshot store.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::domain::{GenerationInfo, Item, SnapshotStore, StorageError, StorageResult};
use crate::infrastructure::{CatalogSource, DatabaseConnection, FetchError};

/// File-backed SQLite database in a private temporary directory
pub struct TestDatabase {
    _dir: TempDir,
    connection: DatabaseConnection,
}

impl TestDatabase {
    pub async fn new() -> StorageResult<Self> {
        let dir = tempfile::tempdir().map_err(|source| StorageError::Location {
            path: std::env::temp_dir().display().to_string(),
            source,
        })?;
        let url = format!("sqlite:{}", dir.path().join("test.db").display());
        let connection = DatabaseConnection::new(&url).await?;
        Ok(Self {
            _dir: dir,
            connection,
        })
    }

    pub fn pool(&self) -> SqlitePool {
        self.connection.pool().clone()
    }
}

/// Item as the default parser reads it from `ListingFixture::new(key)`
pub fn item(key: &str) -> Item {
    Item::new(
        format!("Item {key}"),
        "¥1,000",
        format!("//cdn.example/files/{key}_1200x.jpg"),
        format!("https://chiikawamarket.jp/products/{key}"),
        false,
    )
}

/// One `div.product--root` listing block
#[derive(Debug, Clone)]
pub struct ListingFixture {
    key: String,
    sold_out: bool,
    image: bool,
    link: bool,
}

impl ListingFixture {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            sold_out: false,
            image: true,
            link: true,
        }
    }

    #[must_use]
    pub const fn sold_out(mut self) -> Self {
        self.sold_out = true;
        self
    }

    #[must_use]
    pub const fn without_image(mut self) -> Self {
        self.image = false;
        self
    }

    #[must_use]
    pub const fn without_link(mut self) -> Self {
        self.link = false;
        self
    }

    fn write_html(&self, out: &mut String) {
        let key = &self.key;
        out.push_str("<div class=\"product--root\">\n");
        if self.sold_out {
            out.push_str("  <div class=\"product--label\"> 売り切れ </div>\n");
        }
        if self.link {
            let _ = writeln!(out, "  <a href=\"/products/{key}\">");
        } else {
            out.push_str("  <div>\n");
        }
        if self.image {
            let _ = writeln!(
                out,
                "    <img class=\"lazyload\" data-src=\"//cdn.example/files/{key}_{{width}}x.jpg\" alt=\"\">"
            );
        }
        let _ = writeln!(out, "    <h2 class=\"product_name\"> Item {key} </h2>");
        out.push_str("    <div class=\"product_price\">¥1,000</div>\n");
        out.push_str(if self.link { "  </a>\n" } else { "  </div>\n" });
        out.push_str("</div>\n");
    }
}

/// A full listing page; `max_page` adds a pagination bar ending at that number
pub fn catalog_page_html(blocks: &[ListingFixture], max_page: Option<u32>) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html><body>\n<div class=\"collection\">\n");
    for block in blocks {
        block.write_html(&mut html);
    }
    html.push_str("</div>\n");

    if let Some(max_page) = max_page {
        html.push_str("<div class=\"pagination--root\"><ul>\n");
        for page in 1..=max_page.min(3) {
            let _ = writeln!(html, "<li class=\"pagination--number\">{page}</li>");
        }
        if max_page > 3 {
            html.push_str("<li class=\"pagination--ellipsis\">…</li>\n");
            let _ = writeln!(html, "<li class=\"pagination--number\">{max_page}</li>");
        }
        html.push_str("</ul></div>\n");
    }

    html.push_str("</body></html>\n");
    html
}

/// Scripted [`CatalogSource`] that records every requested page
#[derive(Default)]
pub struct FakeCatalogSource {
    pages: HashMap<u32, Option<String>>,
    requested: Mutex<Vec<u32>>,
}

impl FakeCatalogSource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, page: u32, html: String) -> Self {
        self.pages.insert(page, Some(html));
        self
    }

    /// Requests for `page` answer 503
    #[must_use]
    pub fn with_failure(mut self, page: u32) -> Self {
        self.pages.insert(page, None);
        self
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for FakeCatalogSource {
    async fn fetch_page(&self, page: u32) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(page);
        let url = format!("fake://catalog?page={page}");
        match self.pages.get(&page) {
            Some(Some(html)) => Ok(html.clone()),
            Some(None) => Err(FetchError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                url,
            }),
            None => Err(FetchError::Status {
                status: StatusCode::NOT_FOUND,
                url,
            }),
        }
    }
}

/// [`SnapshotStore`] kept in memory; `failing()` errors on every call
#[derive(Default)]
pub struct InMemorySnapshotStore {
    latest: Mutex<Option<(GenerationInfo, Vec<Item>)>>,
    fail: bool,
}

impl InMemorySnapshotStore {
    pub fn failing() -> Self {
        Self {
            latest: Mutex::new(None),
            fail: true,
        }
    }

    /// Store `items` as the next generation
    pub fn seed(&self, items: Vec<Item>) -> i64 {
        let mut latest = self.latest.lock().unwrap();
        let generation = latest.as_ref().map_or(0, |(info, _)| info.generation) + 1;
        let info = GenerationInfo {
            generation,
            recorded_at: Utc::now(),
            item_count: items.len() as u64,
        };
        *latest = Some((info, items));
        generation
    }

    fn check(&self) -> StorageResult<()> {
        if self.fail {
            Err(StorageError::CorruptRow("store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn initialize(&self) -> StorageResult<()> {
        self.check()
    }

    async fn read_latest(&self) -> StorageResult<Vec<Item>> {
        self.check()?;
        Ok(self
            .latest
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, items)| items.clone())
            .unwrap_or_default())
    }

    async fn read_latest_snapshot(&self) -> StorageResult<(Vec<Item>, Option<GenerationInfo>)> {
        self.check()?;
        Ok(match self.latest.lock().unwrap().as_ref() {
            Some((info, items)) => (items.clone(), Some(info.clone())),
            None => (Vec::new(), None),
        })
    }

    async fn replace_latest(&self, items: &[Item]) -> StorageResult<i64> {
        self.check()?;
        Ok(self.seed(items.to_vec()))
    }

    async fn latest_generation(&self) -> StorageResult<Option<GenerationInfo>> {
        self.check()?;
        Ok(self.latest.lock().unwrap().as_ref().map(|(info, _)| info.clone()))
    }
}
