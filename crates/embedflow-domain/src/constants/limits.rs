//! Shared numeric limits.

/// Maximum concurrent lookups in the status query fan-out.
pub const STATUS_QUERY_CONCURRENCY: usize = 10;

/// An image older than this that still has its original content type is
/// considered to have failed processing.
pub const IMAGE_PROCESSING_WINDOW_SECS: i64 = 300;

/// Due-instance backlog size at which the safety cap engages.
pub const DUE_BACKLOG_LIMIT: usize = 1000;

/// Number of most-recent due instances kept when the cap engages.
pub const DUE_BACKLOG_KEEP: usize = 100;

/// Delay between a child completion and the parent aggregation read,
/// narrowing the read-after-write window on the progress record.
pub const PARENT_AGGREGATION_DELAY_MS: u64 = 100;
