//! Cron projection through user timezones.

/// Due-instance computation
pub mod due;

pub use due::{due_instances, parse_timezone, within_date_range, DueInstances};
