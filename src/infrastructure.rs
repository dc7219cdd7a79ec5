//! Infrastructure layer: configuration, logging, storage, HTTP, parsing and
//! notification adapters behind the domain traits.

pub mod config;
pub mod database_connection;
pub mod http_client;
pub mod logging;
pub mod notification;
pub mod parsing;
pub mod parsing_error;
pub mod snapshot_repository;

pub use config::{AppConfig, ConfigError, catalog_page_url};
pub use database_connection::DatabaseConnection;
pub use http_client::{CatalogSource, FetchError, HttpCatalogFetcher, HttpClientConfig};
pub use logging::{get_log_directory, init_logging, log_system_info};
pub use notification::{CommandSink, LogSink, Notification, NotificationSink, NotifyError, open_in_browser};
pub use parsing::{CatalogExtractor, CatalogPageParser, ParsingConfig, ParsingError, ParsingResult};
pub use snapshot_repository::SqliteSnapshotStore;
