//! Scheduling defaults.

/// Timezone used when a task's `timeZone` attribute is absent or invalid.
pub const DEFAULT_TIMEZONE: &str = "America/Chicago";

/// Source tag stamped on everything the scheduler produces.
pub const SCHEDULED_TASK_SOURCE: &str = "scheduled-task";
