//! Periodic processing runs.

use crate::processor::MergeService;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Start a run now and then every `period` until `cancel` fires.
///
/// A tick that finds a run still active is skipped.
pub async fn run_periodically(service: Arc<MergeService>, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!("Processing every {:?}", period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match service.spawn_run(cancel.child_token()) {
                    Some(handle) => {
                        tokio::spawn(async move {
                            match handle.await {
                                Ok(report) => tracing::debug!("Scheduled run finished: {}", report.summary()),
                                Err(e) => tracing::error!("Scheduled run panicked: {}", e),
                            }
                        });
                    }
                    None => tracing::info!("Scheduled run skipped, processing is already running"),
                }
            }
        }
    }

    tracing::info!("Scheduler stopped");
}
