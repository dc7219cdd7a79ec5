//! Market Tracker - periodic new-arrivals watcher for an e-commerce catalog
//!
//! A scheduler reconciles the storefront's listing pages against the latest
//! stored snapshot, a notifier announces newly listed items, and a small HTTP
//! view serves the latest snapshot with a stock filter.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::{AppContext, Notifier, Reconciler, SchedulerDriver, TickStatus};
use crate::domain::SnapshotStore;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::{
    CatalogPageParser, DatabaseConnection, HttpCatalogFetcher, HttpClientConfig, ParsingConfig,
    SqliteSnapshotStore,
};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Wire storage, pipeline, notifier and view together and run until Ctrl+C.
///
/// With `once`, run a single reconcile tick without the view and return.
pub async fn run(config: AppConfig, once: bool) -> Result<()> {
    let database_url = config.database_url();
    let db = DatabaseConnection::new(&database_url)
        .await
        .with_context(|| format!("Failed to open database {database_url}"))?;
    let store = Arc::new(SqliteSnapshotStore::new(db.pool().clone()));
    store.initialize().await.context("Failed to initialize schema")?;

    let source = HttpCatalogFetcher::new(HttpClientConfig::from(&config.site))?;
    let extractor = CatalogPageParser::with_config(ParsingConfig::with_origin(&config.site.origin))?;

    let (events_tx, events_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let reconciler = Arc::new(Reconciler::new(
        Arc::new(source),
        Arc::new(extractor),
        store.clone(),
        events_tx,
    ));

    let context = AppContext::new(store, config.check_interval());
    let cancel = CancellationToken::new();

    let mut notifier = Notifier::from_config(&config);
    if once {
        notifier = notifier.without_viewer();
    }
    let notifier_task = tokio::spawn(notifier.run(events_rx, cancel.clone()));

    let scheduler = SchedulerDriver::new(context.clone(), cancel.clone());
    let mut job = {
        let reconciler = reconciler.clone();
        move || {
            let reconciler = reconciler.clone();
            async move { reconciler.reconcile().await }
        }
    };

    if once {
        let status = scheduler.run_tick(&mut job).await;
        // Closing the event channel lets the notifier drain and stop
        drop(job);
        drop(reconciler);
        join_notifier(notifier_task).await;
        if let TickStatus::Failed { error } = status {
            bail!("Reconcile tick failed: {error}");
        }
        return Ok(());
    }

    let bind_addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    let view_task = tokio::spawn(presentation::serve(listener, context, cancel.clone()));

    tokio::spawn(shutdown_on_ctrl_c(cancel.clone()));

    scheduler.run(&mut job).await;

    drop(job);
    drop(reconciler);
    join_notifier(notifier_task).await;
    match view_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Read view failed: {}", e),
        Err(e) => warn!("Read view task ended abnormally: {}", e),
    }

    info!("Market tracker stopped");
    Ok(())
}

async fn join_notifier(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        warn!("Notifier task ended abnormally: {}", e);
    }
}

async fn shutdown_on_ctrl_c(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    info!("Ctrl+C received, shutting down after the current tick");
    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn panicked_notifier_is_logged_not_propagated() {
        let task: JoinHandle<()> = tokio::spawn(async { panic!("sink exploded") });
        join_notifier(task).await;
    }
}
