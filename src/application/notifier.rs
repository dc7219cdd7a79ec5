//! Turns committed catalog updates into user notifications

use std::sync::Arc;

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{CatalogEvent, Item};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::{CommandSink, LogSink, Notification, NotificationSink, open_in_browser};

pub struct Notifier {
    title: String,
    /// Catalog page the notification points at
    catalog_url: String,
    /// Read view opened after each notification, if set
    viewer_url: Option<String>,
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl Notifier {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        catalog_url: impl Into<String>,
        viewer_url: Option<String>,
        sinks: Vec<Arc<dyn NotificationSink>>,
    ) -> Self {
        Self {
            title: title.into(),
            catalog_url: catalog_url.into(),
            viewer_url,
            sinks,
        }
    }

    /// Log sink always, command sink when configured
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let mut sinks: Vec<Arc<dyn NotificationSink>> = vec![Arc::new(LogSink)];
        if let Some(command) = config.notification.command.as_deref().filter(|c| !c.trim().is_empty()) {
            sinks.push(Arc::new(CommandSink::new(command)));
        }

        Self::new(
            config.notification.title.clone(),
            config.site.catalog_url.clone(),
            config.server.open_viewer_on_update.then(|| config.viewer_url()),
            sinks,
        )
    }

    /// Skip opening the read view, e.g. when it is not being served
    #[must_use]
    pub fn without_viewer(mut self) -> Self {
        self.viewer_url = None;
        self
    }

    #[must_use]
    pub fn build_notification(&self, items: &[Item]) -> Notification {
        Notification {
            title: self.title.clone(),
            body: items.iter().map(Item::summary_line).collect::<Vec<_>>().join("\n"),
            open_url: Some(self.catalog_url.clone()),
        }
    }

    /// Deliver one event to every sink; failures are logged and skipped
    pub async fn handle(&self, event: &CatalogEvent) {
        let items = event.new_items();
        if items.is_empty() {
            return;
        }
        info!("New items found: {}", items.len());

        let notification = self.build_notification(items);
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(&notification).await {
                warn!("Notification sink '{}' failed: {}", sink.name(), e);
            }
        }

        if let Some(url) = &self.viewer_url {
            if let Err(e) = open_in_browser(url) {
                warn!("Could not open {}: {}", url, e);
            }
        }
    }

    /// Consume events until the channel closes or `cancel` fires.
    ///
    /// On cancel, events already queued are still delivered before returning.
    pub async fn run(self, mut events: broadcast::Receiver<CatalogEvent>, cancel: CancellationToken) {
        loop {
            let event = tokio::select! {
                biased;
                event = events.recv() => event,
                () = cancel.cancelled() => {
                    self.drain(&mut events).await;
                    break;
                }
            };

            match event {
                Ok(event) => self.handle(&event).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Notifier lagged, {} catalog events dropped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Notifier stopped");
    }

    async fn drain(&self, events: &mut broadcast::Receiver<CatalogEvent>) {
        loop {
            match events.try_recv() {
                Ok(event) => self.handle(&event).await,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Notifier lagged, {} catalog events dropped", skipped);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::NotifyError;
    use crate::test_utils::item;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.delivered.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn deliver(&self, _notification: &Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Spawn {
                program: "missing".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    fn event(items: Vec<Item>) -> CatalogEvent {
        CatalogEvent::NewItems {
            items,
            generation: 1,
            stored_count: 10,
            committed_at: Utc::now(),
        }
    }

    fn notifier(sinks: Vec<Arc<dyn NotificationSink>>) -> Notifier {
        Notifier::new("New Chiikawa Items!", "https://example.com/collections/newitems", None, sinks)
    }

    #[test]
    fn body_has_one_name_price_line_per_item() {
        let mut sold_out = item("b");
        sold_out.is_sold_out = true;

        let notification = notifier(Vec::new()).build_notification(&[item("a"), sold_out]);

        assert_eq!(notification.title, "New Chiikawa Items!");
        assert_eq!(notification.body, "Item a - ¥1,000\nItem b - ¥1,000");
        assert_eq!(
            notification.open_url.as_deref(),
            Some("https://example.com/collections/newitems")
        );
    }

    #[tokio::test]
    async fn failing_sink_does_not_block_others() {
        let recording = Arc::new(RecordingSink::default());
        let sinks: Vec<Arc<dyn NotificationSink>> = vec![Arc::new(FailingSink), recording.clone()];
        let notifier = notifier(sinks);

        notifier.handle(&event(vec![item("a")])).await;

        assert_eq!(recording.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn run_delivers_events_until_the_channel_closes() {
        let recording = Arc::new(RecordingSink::default());
        let (tx, rx) = broadcast::channel(4);
        let sinks: Vec<Arc<dyn NotificationSink>> = vec![recording.clone()];
        let task = tokio::spawn(notifier(sinks).run(rx, CancellationToken::new()));

        tx.send(event(vec![item("a"), item("b")])).unwrap();
        tx.send(event(Vec::new())).unwrap();
        drop(tx);
        task.await.unwrap();

        let delivered = recording.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].body.lines().count(), 2);
    }

    #[tokio::test]
    async fn queued_events_are_delivered_after_cancel() {
        for _ in 0..20 {
            let recording = Arc::new(RecordingSink::default());
            let (tx, rx) = broadcast::channel(4);
            let cancel = CancellationToken::new();
            let sinks: Vec<Arc<dyn NotificationSink>> = vec![recording.clone()];

            tx.send(event(vec![item("a")])).unwrap();
            tx.send(event(vec![item("b")])).unwrap();
            cancel.cancel();
            let task = tokio::spawn(notifier(sinks).run(rx, cancel));
            drop(tx);
            task.await.unwrap();

            assert_eq!(recording.delivered.lock().unwrap().len(), 2);
        }
    }

    #[tokio::test]
    async fn run_stops_on_cancel_while_senders_remain() {
        let (tx, rx) = broadcast::channel::<CatalogEvent>(4);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(notifier(Vec::new()).run(rx, cancel.clone()));

        cancel.cancel();
        task.await.unwrap();
        drop(tx);
    }

    #[test]
    fn config_without_command_uses_log_sink_only() {
        let mut config = AppConfig::default();
        config.server.open_viewer_on_update = false;
        let notifier = Notifier::from_config(&config);
        assert_eq!(notifier.sinks.len(), 1);
        assert!(notifier.viewer_url.is_none());

        config.notification.command = Some("true".to_string());
        config.server.open_viewer_on_update = true;
        let notifier = Notifier::from_config(&config);
        assert_eq!(notifier.sinks.len(), 2);
        assert_eq!(notifier.viewer_url.as_deref(), Some("http://127.0.0.1:3001"));
        assert!(notifier.without_viewer().viewer_url.is_none());
    }
}
