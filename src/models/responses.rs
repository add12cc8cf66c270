//! Response DTOs for the service API
//!
//! Defines the structure of outgoing HTTP response bodies. Statistics
//! responses reuse the component stats types directly; this module holds
//! the remaining envelopes.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::queue::ItemStatus;

/// Response body for GET /cache/:namespace/:key
#[derive(Debug, Clone, Serialize)]
pub struct CacheGetResponse {
    pub namespace: String,
    pub key: String,
    pub value: Value,
}

impl CacheGetResponse {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            value,
        }
    }
}

/// Response body for PUT /cache/set
#[derive(Debug, Clone, Serialize)]
pub struct CacheSetResponse {
    pub message: String,
    pub namespace: String,
    pub key: String,
}

impl CacheSetResponse {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let key = key.into();
        Self {
            message: format!("Key '{}/{}' set successfully", namespace, key),
            namespace,
            key,
        }
    }
}

/// Response body for DELETE /cache/:namespace/:key
#[derive(Debug, Clone, Serialize)]
pub struct CacheDeleteResponse {
    pub deleted: bool,
    pub key: String,
}

impl CacheDeleteResponse {
    pub fn new(key: impl Into<String>, deleted: bool) -> Self {
        Self {
            deleted,
            key: key.into(),
        }
    }
}

/// Response body for DELETE /cache/:namespace
#[derive(Debug, Clone, Serialize)]
pub struct CacheClearResponse {
    pub namespace: String,
    pub cleared: usize,
}

impl CacheClearResponse {
    pub fn new(namespace: impl Into<String>, cleared: usize) -> Self {
        Self {
            namespace: namespace.into(),
            cleared,
        }
    }
}

/// Response body for POST /queue/:name/enqueue
#[derive(Debug, Clone, Serialize)]
pub struct EnqueueResponse {
    pub id: Uuid,
    pub queue: String,
}

impl EnqueueResponse {
    pub fn new(queue: impl Into<String>, id: Uuid) -> Self {
        Self {
            id,
            queue: queue.into(),
        }
    }
}

/// Response body for POST /queue/:name/complete
#[derive(Debug, Clone, Serialize)]
pub struct CompleteResponse {
    pub message: String,
    pub id: Uuid,
}

impl CompleteResponse {
    pub fn new(id: Uuid) -> Self {
        Self {
            message: format!("Item '{}' completed", id),
            id,
        }
    }
}

/// Response body for POST /queue/:name/fail
#[derive(Debug, Clone, Serialize)]
pub struct FailResponse {
    pub id: Uuid,
    /// New item status after the failure: failed or dead
    pub status: ItemStatus,
}

impl FailResponse {
    pub fn new(id: Uuid, status: ItemStatus) -> Self {
        Self { id, status }
    }
}

/// Generic acknowledgement for telemetry recording endpoints
#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    pub message: String,
}

impl AckResponse {
    pub fn recorded(kind: &str, name: &str) -> Self {
        Self {
            message: format!("{} '{}' recorded", kind, name),
        }
    }
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_get_response_serialize() {
        let resp = CacheGetResponse::new("ns", "k", json!({"a": 1}));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["namespace"], "ns");
        assert_eq!(json["value"]["a"], 1);
    }

    #[test]
    fn test_cache_set_response_message() {
        let resp = CacheSetResponse::new("sessions", "u1");
        assert!(resp.message.contains("sessions/u1"));
    }

    #[test]
    fn test_fail_response_status_name() {
        let resp = FailResponse::new(Uuid::new_v4(), ItemStatus::Dead);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "dead");
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_ack_response() {
        let resp = AckResponse::recorded("Metric", "latency");
        assert!(resp.message.contains("latency"));
    }
}
