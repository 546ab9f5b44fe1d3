//! Queue defaults.

/// Default receive batch size for queue consumers.
pub const DEFAULT_RECEIVE_BATCH: usize = 10;

/// Poll interval when the queue is empty, in milliseconds.
pub const EMPTY_POLL_INTERVAL_MS: u64 = 250;
