//! Periodic driver for the reconcile job
//!
//! The first tick fires immediately, then one tick per `check_interval`.
//! Ticks are awaited inline so two never overlap; an overrunning tick pushes
//! the next one back instead of triggering a burst.

use std::future::Future;

use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use super::context::{AppContext, TickRecord, TickStatus};
use super::reconciler::{ReconcileError, ReconcileOutcome};

pub struct SchedulerDriver {
    context: AppContext,
    cancel: CancellationToken,
}

impl SchedulerDriver {
    #[must_use]
    pub const fn new(context: AppContext, cancel: CancellationToken) -> Self {
        Self { context, cancel }
    }

    /// Tick until the cancellation token fires. A tick already in progress
    /// finishes first.
    pub async fn run<F, Fut>(&self, mut job: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ReconcileOutcome, ReconcileError>>,
    {
        let mut ticker = interval(self.context.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Scheduler started, checking every {}s",
            self.context.check_interval.as_secs()
        );

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!("Scheduler stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_tick(&mut job).await;
                }
            }
        }
    }

    /// Run the job once and record how it ended
    pub async fn run_tick<F, Fut>(&self, job: &mut F) -> TickStatus
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ReconcileOutcome, ReconcileError>>,
    {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("tick", run_id = %run_id);
        let started_at = Utc::now();

        let status = match job().instrument(span.clone()).await {
            Ok(ReconcileOutcome::NoUpdate) => TickStatus::NoUpdate,
            Ok(ReconcileOutcome::Updated {
                new_items, generation, ..
            }) => TickStatus::Updated {
                new_items: new_items.len(),
                generation,
            },
            Err(e) => {
                span.in_scope(|| error!("Reconcile tick failed: {}", e));
                TickStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        self.context
            .record_tick(TickRecord {
                run_id,
                started_at,
                finished_at: Utc::now(),
                status: status.clone(),
            })
            .await;
        status
    }
}
