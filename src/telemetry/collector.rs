//! Telemetry Collector Module
//!
//! Buffered metric/event recording with batched flushing and cumulative
//! statistics. Recording never blocks on the sink: when the buffer hits its
//! hard cap the oldest records are dropped and counted instead.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::Config;
use crate::error::Result;
use crate::telemetry::{
    TelemetryEvent, TelemetryLevel, TelemetryMetric, TelemetryRecord, TelemetrySink,
};

// == Telemetry Config ==
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Buffer length that triggers an inline flush
    pub batch_size: usize,
    /// Hard cap on buffered records before oldest are dropped
    pub buffer_max: usize,
}

impl TelemetryConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.telemetry_batch_size,
            buffer_max: config.telemetry_buffer_max,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            buffer_max: 10_000,
        }
    }
}

// == Telemetry Stats ==
/// Cumulative counters, independent of buffer state: flushing does not
/// reset them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetryStats {
    /// Records captured per metric name
    pub metrics: HashMap<String, u64>,
    /// Records captured per event name
    pub events: HashMap<String, u64>,
    /// Events captured per severity level
    pub levels: HashMap<String, u64>,
    /// Total records ever captured
    pub recorded: u64,
    /// Total records delivered to the sink
    pub flushed: u64,
    /// Total records dropped to buffer overflow
    pub dropped: u64,
    /// Records currently waiting in the buffer
    pub buffered: usize,
}

// == Telemetry Collector ==
pub struct TelemetryCollector {
    buffer: Mutex<VecDeque<TelemetryRecord>>,
    counters: Mutex<TelemetryStats>,
    sink: Arc<dyn TelemetrySink>,
    config: TelemetryConfig,
}

impl TelemetryCollector {
    // == Constructor ==
    pub fn new(sink: Arc<dyn TelemetrySink>, config: TelemetryConfig) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::new()),
            counters: Mutex::new(TelemetryStats::default()),
            sink,
            config,
        }
    }

    // == Record Metric ==
    /// Captures a numeric measurement.
    pub async fn record_metric(&self, name: &str, value: f64, tags: HashMap<String, String>) {
        let metric = TelemetryMetric::new(name, value, tags);
        {
            let mut counters = self.counters.lock().await;
            *counters.metrics.entry(name.to_string()).or_insert(0) += 1;
            counters.recorded += 1;
        }
        self.push(TelemetryRecord::Metric(metric)).await;
    }

    // == Record Event ==
    /// Captures a structured event at the given severity.
    pub async fn record_event(
        &self,
        name: &str,
        properties: Map<String, Value>,
        level: TelemetryLevel,
    ) {
        let event = TelemetryEvent::new(name, properties, level);
        self.count_event(&event).await;
        self.push(TelemetryRecord::Event(event)).await;
    }

    // == Record Error ==
    /// Captures an error occurrence as an error-level event with the error
    /// text merged into the context.
    pub async fn record_error(&self, name: &str, error: &str, context: Map<String, Value>) {
        let event = TelemetryEvent::from_error(name, error, context);
        self.count_event(&event).await;
        self.push(TelemetryRecord::Event(event)).await;
    }

    async fn count_event(&self, event: &TelemetryEvent) {
        let mut counters = self.counters.lock().await;
        *counters.events.entry(event.name.clone()).or_insert(0) += 1;
        *counters
            .levels
            .entry(event.level.as_str().to_string())
            .or_insert(0) += 1;
        counters.recorded += 1;
    }

    // == Buffering ==
    /// Appends a record, dropping the oldest when the hard cap is reached,
    /// then flushes inline once the batch threshold is met.
    async fn push(&self, record: TelemetryRecord) {
        let (dropped, should_flush) = {
            let mut buffer = self.buffer.lock().await;
            let mut dropped = 0u64;
            while buffer.len() >= self.config.buffer_max {
                buffer.pop_front();
                dropped += 1;
            }
            buffer.push_back(record);
            (dropped, buffer.len() >= self.config.batch_size)
        };

        if dropped > 0 {
            let mut counters = self.counters.lock().await;
            counters.dropped += dropped;
            warn!(dropped, "telemetry buffer full, oldest records dropped");
        }

        if should_flush {
            let _ = self.flush().await;
        }
    }

    // == Flush ==
    /// Drains the buffer into a single batch and hands it to the sink.
    /// A sink failure re-buffers the batch (bounded by the hard cap) and
    /// reports zero flushed; recording callers are unaffected.
    pub async fn flush(&self) -> Result<usize> {
        let batch: Vec<TelemetryRecord> = {
            let mut buffer = self.buffer.lock().await;
            buffer.drain(..).collect()
        };
        if batch.is_empty() {
            return Ok(0);
        }

        match self.sink.write_batch(&batch).await {
            Ok(()) => {
                let mut counters = self.counters.lock().await;
                counters.flushed += batch.len() as u64;
                Ok(batch.len())
            }
            Err(err) => {
                warn!(error = %err, records = batch.len(), "telemetry sink write failed, re-buffering batch");
                let dropped = {
                    let mut buffer = self.buffer.lock().await;
                    let mut dropped = 0u64;
                    for record in batch.into_iter().rev() {
                        if buffer.len() >= self.config.buffer_max {
                            dropped += 1;
                        } else {
                            buffer.push_front(record);
                        }
                    }
                    dropped
                };
                if dropped > 0 {
                    let mut counters = self.counters.lock().await;
                    counters.dropped += dropped;
                }
                Ok(0)
            }
        }
    }

    // == Stats ==
    /// Snapshot of the cumulative counters plus current buffer depth.
    pub async fn stats(&self) -> TelemetryStats {
        let mut stats = self.counters.lock().await.clone();
        stats.buffered = self.buffer.lock().await.len();
        stats
    }
}
