//! HTTP access to the catalog listing pages
//!
//! One GET per page, no retries: a failed fetch aborts the reconcile tick and
//! the next tick starts over.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::config::{SiteConfig, catalog_page_url};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status}: {url}")]
    Status { status: StatusCode, url: String },
}

/// Source of raw listing-page markup
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the markup of listing page `page` (1-based)
    async fn fetch_page(&self, page: u32) -> Result<String, FetchError>;
}

/// Configuration for the catalog HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub catalog_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl From<&SiteConfig> for HttpClientConfig {
    fn from(site: &SiteConfig) -> Self {
        Self {
            catalog_url: site.catalog_url.clone(),
            user_agent: site.user_agent.clone(),
            timeout_seconds: site.request_timeout_seconds,
        }
    }
}

/// reqwest-backed [`CatalogSource`]
#[derive(Clone)]
pub struct HttpCatalogFetcher {
    client: Client,
    config: HttpClientConfig,
}

impl HttpCatalogFetcher {
    pub fn new(config: HttpClientConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self { client, config })
    }

    pub fn page_url(&self, page: u32) -> String {
        catalog_page_url(&self.config.catalog_url, page)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogFetcher {
    async fn fetch_page(&self, page: u32) -> Result<String, FetchError> {
        let url = self.page_url(page);
        info!("🌐 HTTP GET: {}", url);

        let transport = |source| FetchError::Transport {
            url: url.clone(),
            source,
        };

        let response = self.client.get(&url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!("❌ HTTP error {}: {}", status, url);
            return Err(FetchError::Status { status, url });
        }

        let body = response.text().await.map_err(transport)?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::Query;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use std::collections::HashMap;

    /// Serve `/collections/newitems` locally; `?page=9` answers 503
    async fn spawn_catalog() -> String {
        async fn listing(Query(params): Query<HashMap<String, String>>) -> (AxumStatus, String) {
            match params.get("page").map(String::as_str) {
                Some("9") => (AxumStatus::SERVICE_UNAVAILABLE, String::new()),
                Some(page) => (AxumStatus::OK, format!("page {page}")),
                None => (AxumStatus::OK, "page 1".to_string()),
            }
        }

        let app = Router::new().route("/collections/newitems", get(listing));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/collections/newitems")
    }

    fn fetcher(catalog_url: String) -> HttpCatalogFetcher {
        HttpCatalogFetcher::new(HttpClientConfig {
            catalog_url,
            user_agent: "market-tracker-test".to_string(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[test]
    fn config_follows_site_settings() {
        let site = SiteConfig::default();
        let config = HttpClientConfig::from(&site);
        assert_eq!(config.catalog_url, site.catalog_url);
        assert_eq!(config.timeout_seconds, site.request_timeout_seconds);
    }

    #[test]
    fn page_urls_add_query_after_first_page() {
        let fetcher = fetcher("https://example.com/c".to_string());
        assert_eq!(fetcher.page_url(1), "https://example.com/c");
        assert_eq!(fetcher.page_url(2), "https://example.com/c?page=2");
    }

    #[tokio::test]
    async fn fetches_first_and_later_pages() {
        let fetcher = fetcher(spawn_catalog().await);

        assert_eq!(fetcher.fetch_page(1).await.unwrap(), "page 1");
        assert_eq!(fetcher.fetch_page(3).await.unwrap(), "page 3");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let fetcher = fetcher(spawn_catalog().await);

        let err = fetcher.fetch_page(9).await.unwrap_err();

        assert!(matches!(
            err,
            FetchError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = fetcher(format!("http://{addr}/c")).fetch_page(1).await.unwrap_err();

        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
