//! Infrad - infrastructure service core
//!
//! Provides namespaced caching with TTL expiration and LRU eviction, named
//! priority queues with retry/backoff and dead-lettering, and buffered
//! telemetry collection, all behind a small HTTP API.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod queue;
pub mod stats;
pub mod tasks;
pub mod telemetry;

pub use api::AppState;
pub use config::Config;
pub use tasks::{spawn_cleanup_task, spawn_flush_task, spawn_retry_task};
