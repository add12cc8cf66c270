//! API Module
//!
//! HTTP handlers and routing for the service REST API.
//!
//! # Endpoint groups
//! - `/cache/*` - namespaced key/value cache
//! - `/queue/*` - named priority queues
//! - `/telemetry/*` - metric/event recording
//! - `/stats`, `/health` - monitoring

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
