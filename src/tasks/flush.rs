//! Telemetry Flush Task
//!
//! Background task that flushes the telemetry buffer on an interval, so
//! records reach the sink even when traffic is too light to hit the batch
//! threshold.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::telemetry::TelemetryCollector;

/// Spawns a background task that periodically flushes buffered telemetry.
///
/// # Arguments
/// * `telemetry` - Shared collector
/// * `interval_secs` - Seconds between flushes
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
/// The shutdown path performs one final flush after aborting.
pub fn spawn_flush_task(telemetry: Arc<TelemetryCollector>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(interval_secs, "starting telemetry flush task");

        loop {
            tokio::time::sleep(interval).await;

            match telemetry.flush().await {
                Ok(0) => debug!("telemetry flush found no records"),
                Ok(flushed) => debug!(flushed, "telemetry flushed"),
                Err(err) => debug!(error = %err, "telemetry flush failed"),
            }
        }
    })
}
