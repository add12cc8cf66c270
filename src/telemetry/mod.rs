//! Telemetry Module
//!
//! Buffered metric/event/error recording with periodic flushing to a
//! pluggable sink and cumulative aggregate statistics.

mod collector;
mod record;
mod sink;

// Re-export public types
pub use collector::{TelemetryCollector, TelemetryConfig, TelemetryStats};
pub use record::{TelemetryEvent, TelemetryLevel, TelemetryMetric, TelemetryRecord};
pub use sink::{LogSink, MemorySink, TelemetrySink};
