//! Pipeline and scheduler use cases.

/// Embedding worker (queue message contract)
pub mod embedding_worker;
/// Progress coordinator (two-level status machine)
pub mod progress_coordinator;
/// Reprocess planner (selective vs full cleanup)
pub mod reprocess_planner;
/// Scheduler tick (scan, project, claim)
pub mod scheduler_tick;
/// Status query fan-out
pub mod status_query;
/// Task callback sink (success/failure reconciliation)
pub mod task_callback;
/// Task dispatcher (credential resolution + enqueue)
pub mod task_dispatcher;
