//! Request DTOs for the service API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::queue::Priority;
use crate::telemetry::TelemetryLevel;

/// Request body for PUT /cache/set
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSetRequest {
    pub namespace: String,
    pub key: String,
    /// Any JSON value
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl CacheSetRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.namespace.is_empty() {
            return Some("Namespace cannot be empty".to_string());
        }
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}

/// Query string for GET /cache/stats
#[derive(Debug, Clone, Deserialize)]
pub struct CacheStatsQuery {
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Request body for POST /queue/:name/enqueue
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueRequest {
    pub payload: Value,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl EnqueueRequest {
    pub fn validate(&self) -> Option<String> {
        if self.max_attempts == Some(0) {
            return Some("max_attempts must be at least 1".to_string());
        }
        None
    }
}

/// Request body for POST /queue/:name/complete
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteRequest {
    pub id: Uuid,
}

/// Request body for POST /queue/:name/fail
#[derive(Debug, Clone, Deserialize)]
pub struct FailRequest {
    pub id: Uuid,
    pub error: String,
}

/// Query string for GET /queue/stats
#[derive(Debug, Clone, Deserialize)]
pub struct QueueStatsQuery {
    #[serde(default)]
    pub queue: Option<String>,
}

/// Request body for POST /telemetry/metric
#[derive(Debug, Clone, Deserialize)]
pub struct MetricRequest {
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl MetricRequest {
    pub fn validate(&self) -> Option<String> {
        if self.name.is_empty() {
            return Some("Metric name cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /telemetry/event
#[derive(Debug, Clone, Deserialize)]
pub struct EventRequest {
    pub name: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub level: TelemetryLevel,
}

impl EventRequest {
    pub fn validate(&self) -> Option<String> {
        if self.name.is_empty() {
            return Some("Event name cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /telemetry/error
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorRequest {
    pub name: String,
    pub error: String,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl ErrorRequest {
    pub fn validate(&self) -> Option<String> {
        if self.name.is_empty() {
            return Some("Error name cannot be empty".to_string());
        }
        None
    }
}
