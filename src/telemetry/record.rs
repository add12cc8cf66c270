//! Telemetry Record Module
//!
//! Defines the metric and event records buffered by the collector. Records
//! are append-only: once captured they are never updated, only flushed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::current_timestamp_ms;

// == Telemetry Level ==
/// Severity attached to events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl TelemetryLevel {
    /// Stable lowercase name used as a stats key.
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryLevel::Debug => "debug",
            TelemetryLevel::Info => "info",
            TelemetryLevel::Warning => "warning",
            TelemetryLevel::Error => "error",
            TelemetryLevel::Critical => "critical",
        }
    }
}

// == Telemetry Metric ==
/// A named numeric measurement with dimensional tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryMetric {
    pub name: String,
    pub value: f64,
    pub tags: HashMap<String, String>,
    /// Capture timestamp (Unix milliseconds)
    pub timestamp: u64,
}

impl TelemetryMetric {
    pub fn new(name: impl Into<String>, value: f64, tags: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            value,
            tags,
            timestamp: current_timestamp_ms(),
        }
    }
}

// == Telemetry Event ==
/// A named occurrence with structured properties and a severity level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub name: String,
    pub properties: Map<String, Value>,
    pub level: TelemetryLevel,
    /// Capture timestamp (Unix milliseconds)
    pub timestamp: u64,
}

impl TelemetryEvent {
    pub fn new(
        name: impl Into<String>,
        properties: Map<String, Value>,
        level: TelemetryLevel,
    ) -> Self {
        Self {
            name: name.into(),
            properties,
            level,
            timestamp: current_timestamp_ms(),
        }
    }

    /// Builds the error-level event emitted by `record_error`: the error
    /// text is merged into the context under the "error" property.
    pub fn from_error(
        name: impl Into<String>,
        error: impl Into<String>,
        mut context: Map<String, Value>,
    ) -> Self {
        context.insert("error".to_string(), Value::String(error.into()));
        Self::new(name, context, TelemetryLevel::Error)
    }
}

// == Telemetry Record ==
/// One buffered record: a metric or an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TelemetryRecord {
    Metric(TelemetryMetric),
    Event(TelemetryEvent),
}

impl TelemetryRecord {
    pub fn name(&self) -> &str {
        match self {
            TelemetryRecord::Metric(metric) => &metric.name,
            TelemetryRecord::Event(event) => &event.name,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_serde_names() {
        assert_eq!(
            serde_json::to_string(&TelemetryLevel::Warning).unwrap(),
            "\"warning\""
        );
        let parsed: TelemetryLevel = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(parsed, TelemetryLevel::Critical);
    }

    #[test]
    fn test_metric_capture() {
        let mut tags = HashMap::new();
        tags.insert("region".to_string(), "eu".to_string());

        let metric = TelemetryMetric::new("latency_ms", 12.5, tags);
        assert_eq!(metric.name, "latency_ms");
        assert_eq!(metric.value, 12.5);
        assert!(metric.timestamp > 0);
    }

    #[test]
    fn test_error_event_merges_error_into_properties() {
        let mut context = Map::new();
        context.insert("request_id".to_string(), json!("abc"));

        let event = TelemetryEvent::from_error("db_failure", "timeout", context);
        assert_eq!(event.level, TelemetryLevel::Error);
        assert_eq!(event.properties["error"], json!("timeout"));
        assert_eq!(event.properties["request_id"], json!("abc"));
    }

    #[test]
    fn test_record_name() {
        let metric = TelemetryRecord::Metric(TelemetryMetric::new("m", 1.0, HashMap::new()));
        let event = TelemetryRecord::Event(TelemetryEvent::new(
            "e",
            Map::new(),
            TelemetryLevel::Info,
        ));
        assert_eq!(metric.name(), "m");
        assert_eq!(event.name(), "e");
    }

    #[test]
    fn test_record_serializes_with_type_tag() {
        let record = TelemetryRecord::Metric(TelemetryMetric::new("m", 1.0, HashMap::new()));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], json!("metric"));
    }
}
