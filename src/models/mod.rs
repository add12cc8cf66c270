//! Request and Response models for the service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    CacheSetRequest, CacheStatsQuery, CompleteRequest, EnqueueRequest, ErrorRequest,
    EventRequest, FailRequest, MetricRequest, QueueStatsQuery,
};
pub use responses::{
    AckResponse, CacheClearResponse, CacheDeleteResponse, CacheGetResponse, CacheSetResponse,
    CompleteResponse, EnqueueResponse, ErrorResponse, FailResponse, HealthResponse,
};
