//! # Application Layer
//!
//! Use cases orchestrating the domain ports: the embedding pipeline
//! (progress coordination, worker contract, reprocess planning, status
//! queries) and the scheduled-task scheduler (cron projection, tick,
//! dispatch, callback reconciliation).
//!
//! This crate depends on `embedflow-domain` only; provider implementations
//! are injected as `Arc<dyn Port>` and appear here solely in tests.

/// Cron projection through user timezones
pub mod scheduling;
/// Pipeline and scheduler use cases
pub mod use_cases;

pub use use_cases::embedding_worker::{EmbeddingWorker, EmbeddingWorkerDeps};
pub use use_cases::progress_coordinator::ProgressCoordinator;
pub use use_cases::reprocess_planner::{CleanupDecision, ReprocessPlanner};
pub use use_cases::scheduler_tick::SchedulerTick;
pub use use_cases::status_query::StatusQueryService;
pub use use_cases::task_callback::{DispatchedTask, TaskCallbackSink};
pub use use_cases::task_dispatcher::{DispatchOutcome, TaskDispatcher};
