//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (see [`defaults`])
//! 2. An optional config file (`--config PATH`, or `market-tracker.toml` if present)
//! 3. `MARKET_TRACKER__*` environment variables, `__` separating nested keys

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub scheduler: SchedulerConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub notification: NotificationConfig,
    pub logging: LoggingConfig,
}

/// Where and how the catalog is fetched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Listing URL of the tracked collection (page 1, no query)
    pub catalog_url: String,
    /// Origin prefixed to the relative product links found in listings
    pub origin: String,
    pub user_agent: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Period between reconcile ticks
    pub check_interval_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// sqlx SQLite URL; empty means the platform data directory
    pub database_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Open the read view in a browser whenever new items are found
    pub open_viewer_on_update: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub title: String,
    /// Shell command run per notification with `MARKET_TRACKER_TITLE`,
    /// `MARKET_TRACKER_BODY` and `MARKET_TRACKER_URL` set, e.g. a call to
    /// `notify-send` or `terminal-notifier`
    pub command: Option<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,
    pub json_format: bool,
    pub console_output: bool,
    pub file_output: bool,
    /// Directory for log files; empty means `logs/` next to the executable
    pub log_dir: String,
    /// Number of log files kept in `log_dir`; older ones are deleted on startup
    pub max_files: u32,
}

/// Default values, kept in one place
pub mod defaults {
    pub const CATALOG_URL: &str = "https://chiikawamarket.jp/collections/newitems";
    pub const ORIGIN: &str = "https://chiikawamarket.jp";
    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    pub const CHECK_INTERVAL_SECS: u64 = 5 * 60;

    pub const DATABASE_FILE: &str = "market_tracker.db";

    pub const BIND: &str = "127.0.0.1:3001";
    pub const OPEN_VIEWER_ON_UPDATE: bool = true;

    pub const NOTIFICATION_TITLE: &str = "New Chiikawa Items!";

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = true;
    pub const LOG_MAX_FILES: u32 = 5;

    pub const CONFIG_FILE: &str = "market-tracker.toml";
    pub const ENV_PREFIX: &str = "MARKET_TRACKER";
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            catalog_url: defaults::CATALOG_URL.to_string(),
            origin: defaults::ORIGIN.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: defaults::CHECK_INTERVAL_SECS,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::BIND.to_string(),
            open_viewer_on_update: defaults::OPEN_VIEWER_ON_UPDATE,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: defaults::NOTIFICATION_TITLE.to_string(),
            command: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: String::new(),
            max_files: defaults::LOG_MAX_FILES,
        }
    }
}

impl AppConfig {
    /// Load defaults, then the optional file, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?);

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder.add_source(config::File::with_name(defaults::CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate settings that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.check_interval_secs == 0 {
            return Err(ConfigError::Validation {
                message: "scheduler.check_interval_secs must be greater than 0".to_string(),
            });
        }

        if url::Url::parse(&self.site.catalog_url).is_err() {
            return Err(ConfigError::Validation {
                message: format!("site.catalog_url is not a valid URL: '{}'", self.site.catalog_url),
            });
        }

        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation {
                message: format!("server.bind is not a socket address: '{}'", self.server.bind),
            });
        }

        Ok(())
    }

    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.check_interval_secs)
    }

    /// Address the read view listens on (checked by [`AppConfig::validate`])
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.bind.parse().map_err(|_| ConfigError::Validation {
            message: format!("server.bind is not a socket address: '{}'", self.server.bind),
        })
    }

    /// URL of the read view as a browser would open it
    pub fn viewer_url(&self) -> String {
        format!("http://{}", self.server.bind)
    }

    /// Resolve the database URL, falling back to the platform data directory
    pub fn database_url(&self) -> String {
        if !self.storage.database_url.is_empty() {
            return self.storage.database_url.clone();
        }
        let path = get_app_data_dir().join(defaults::DATABASE_FILE);
        info!("No database URL configured, using {}", path.display());
        format!("sqlite:{}", path.display())
    }
}

/// Application data directory (`<data_local_dir>/market-tracker`)
pub fn get_app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("market-tracker")
}

/// Build the listing URL for a page; page 1 carries no `page` parameter
pub fn catalog_page_url(catalog_url: &str, page: u32) -> String {
    if page <= 1 {
        catalog_url.to_string()
    } else {
        format!("{catalog_url}?page={page}")
    }
}
