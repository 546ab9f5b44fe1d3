//! Scheduler timer loop.

use std::sync::Arc;
use std::time::Duration;

use embedflow_domain::ports::services::SchedulerInterface;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Spawn the periodic scheduler tick. Ticks run back-to-back at the
/// configured interval until the token is cancelled; a slow tick delays
/// the next one rather than overlapping it in-process (clustered instances
/// still overlap - the claim condition handles those).
pub fn run_scheduler_loop(
    scheduler: Arc<dyn SchedulerInterface>,
    interval_secs: u64,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(interval_secs, "Scheduler loop started");
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let report = scheduler.tick().await;
                    info!(
                        status = report.status_code,
                        message = %report.body.message,
                        "Scheduler tick complete"
                    );
                }
            }
        }
        info!("Scheduler loop stopped");
    })
}
