//! Stats Aggregator Module
//!
//! Read-only view combining cache, queue, and telemetry statistics into one
//! document for external monitoring. Holds no state of its own.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheStats, CacheStore};
use crate::queue::{QueueManager, QueueStats};
use crate::telemetry::{TelemetryCollector, TelemetryStats};

// == System Stats ==
/// One aggregated snapshot across all components.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStats {
    /// Snapshot time, RFC 3339
    pub timestamp: String,
    pub cache: CacheStats,
    pub queues: QueueStats,
    pub telemetry: TelemetryStats,
}

// == Stats Aggregator ==
pub struct StatsAggregator {
    cache: Arc<CacheStore>,
    queues: Arc<QueueManager>,
    telemetry: Arc<TelemetryCollector>,
}

impl StatsAggregator {
    pub fn new(
        cache: Arc<CacheStore>,
        queues: Arc<QueueManager>,
        telemetry: Arc<TelemetryCollector>,
    ) -> Self {
        Self {
            cache,
            queues,
            telemetry,
        }
    }

    /// Collects current statistics from every component.
    pub async fn snapshot(&self) -> SystemStats {
        SystemStats {
            timestamp: chrono::Utc::now().to_rfc3339(),
            cache: self.cache.stats(None).await,
            queues: self.queues.stats(None).await,
            telemetry: self.telemetry.stats().await,
        }
    }
}
