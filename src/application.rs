//! Application layer: the reconcile pipeline, its scheduler and the
//! notification consumer, wired around a shared [`AppContext`].

pub mod context;
pub mod notifier;
pub mod reconciler;
pub mod scheduler;

pub use context::{AppContext, TickRecord, TickStatus};
pub use notifier::Notifier;
pub use reconciler::{ReconcileError, ReconcileOutcome, Reconciler};
pub use scheduler::SchedulerDriver;
