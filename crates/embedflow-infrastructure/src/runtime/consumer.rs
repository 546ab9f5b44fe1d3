//! Chunk queue consumer pool.

use std::sync::Arc;
use std::time::Duration;

use embedflow_application::EmbeddingWorker;
use embedflow_domain::ports::providers::QueueProvider;
use embedflow_providers::constants::queue::{DEFAULT_RECEIVE_BATCH, EMPTY_POLL_INTERVAL_MS};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawn `count` consumers over the chunk queue. Each consumer processes
/// one message end-to-end before taking the next; the queue itself is the
/// backpressure. Consumers drain until the token is cancelled.
pub fn run_consumer_pool(
    queue: Arc<dyn QueueProvider>,
    worker: Arc<EmbeddingWorker>,
    count: usize,
    shutdown: CancellationToken,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|index| {
            let queue = Arc::clone(&queue);
            let worker = Arc::clone(&worker);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                info!(consumer = index, "Consumer started");
                loop {
                    if shutdown.is_cancelled() {
                        break;
                    }
                    let messages = match queue.receive(DEFAULT_RECEIVE_BATCH).await {
                        Ok(messages) => messages,
                        Err(e) => {
                            warn!(consumer = index, error = %e, "Receive failed");
                            Vec::new()
                        }
                    };
                    if messages.is_empty() {
                        tokio::select! {
                            () = shutdown.cancelled() => break,
                            () = tokio::time::sleep(Duration::from_millis(EMPTY_POLL_INTERVAL_MS)) => {}
                        }
                        continue;
                    }
                    for message in messages {
                        worker.process_message(message).await;
                    }
                }
                info!(consumer = index, "Consumer stopped");
            })
        })
        .collect()
}
