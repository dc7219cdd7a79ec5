//! Desktop-facing notification sinks
//!
//! A sink delivers one formatted [`Notification`]. Delivery failures are
//! reported to the caller, which logs them; they never reach the reconcile
//! pipeline.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}")]
    ExitStatus {
        program: String,
        status: std::process::ExitStatus,
    },

    #[error("Failed to open '{url}': {source}")]
    Open {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// A user-facing alert about newly listed items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    /// One `"{name} - {price}"` line per new item
    pub body: String,
    /// Page the alert should open when clicked
    pub open_url: Option<String>,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the application log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!("🔔 {}", notification.title);
        for line in notification.body.lines() {
            info!("  {}", line);
        }
        Ok(())
    }
}

/// Runs a shell command per notification.
///
/// The command sees `MARKET_TRACKER_TITLE`, `MARKET_TRACKER_BODY` and
/// `MARKET_TRACKER_URL` in its environment.
#[derive(Debug, Clone)]
pub struct CommandSink {
    command: String,
}

impl CommandSink {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for CommandSink {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        debug!("Running notification hook: {}", self.command);
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env("MARKET_TRACKER_TITLE", &notification.title)
            .env("MARKET_TRACKER_BODY", &notification.body)
            .env(
                "MARKET_TRACKER_URL",
                notification.open_url.as_deref().unwrap_or_default(),
            )
            .status()
            .await
            .map_err(|source| NotifyError::Spawn {
                program: self.command.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(NotifyError::ExitStatus {
                program: self.command.clone(),
                status,
            })
        }
    }
}

/// Open `url` with the platform's default browser without waiting on it
pub fn open_in_browser(url: &str) -> Result<(), NotifyError> {
    debug!("Opening {} in the default browser", url);
    open::that_detached(url).map_err(|source| NotifyError::Open {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Notification {
        Notification {
            title: "New Chiikawa Items!".to_string(),
            body: "Pouch - ¥1,650\nSticker - ¥440".to_string(),
            open_url: Some("https://example.com/collections/newitems".to_string()),
        }
    }

    #[tokio::test]
    async fn log_sink_always_succeeds() {
        assert!(LogSink.deliver(&sample()).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_sink_passes_notification_through_environment() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("hook.txt");
        let sink = CommandSink::new(format!(
            "printf '%s|%s|%s' \"$MARKET_TRACKER_TITLE\" \"$MARKET_TRACKER_BODY\" \"$MARKET_TRACKER_URL\" > '{}'",
            out.display()
        ));

        sink.deliver(&sample()).await.unwrap();

        let written = std::fs::read_to_string(out).unwrap();
        assert_eq!(
            written,
            "New Chiikawa Items!|Pouch - ¥1,650\nSticker - ¥440|https://example.com/collections/newitems"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_sink_reports_failing_hook() {
        let err = CommandSink::new("exit 3").deliver(&sample()).await.unwrap_err();
        assert!(matches!(err, NotifyError::ExitStatus { .. }));
    }

    #[test]
    fn open_error_names_the_url() {
        let err = NotifyError::Open {
            url: "http://127.0.0.1:3001".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("Failed to open 'http://127.0.0.1:3001'"));
    }
}
