//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;

// == Backend Kind ==
/// Which storage backend the cache layer runs on.
///
/// Selection is a deployment concern; the cache semantics are identical
/// across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-memory map, the default
    Memory,
    /// Networked key-value store (Redis)
    Redis,
    /// File-per-key store on local disk, for large values
    File,
}

impl BackendKind {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "redis" => BackendKind::Redis,
            "file" => BackendKind::File,
            _ => BackendKind::Memory,
        }
    }
}

// == Config ==
/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Storage backend for the cache layer
    pub backend: BackendKind,
    /// Connection URL for the Redis backend
    pub redis_url: String,
    /// Root directory for the file backend
    pub file_backend_dir: String,
    /// Maximum live entries per cache namespace
    pub cache_capacity: usize,
    /// Default TTL in seconds for entries without explicit TTL (0 = no expiry)
    pub default_ttl: u64,
    /// TTL sweep interval in seconds
    pub cleanup_interval: u64,
    /// Queue retry backoff base delay in milliseconds
    pub retry_base_delay_ms: u64,
    /// Queue retry backoff cap in milliseconds
    pub retry_max_delay_ms: u64,
    /// Interval in seconds between retry promotion sweeps
    pub retry_sweep_interval: u64,
    /// Telemetry records per flushed batch
    pub telemetry_batch_size: usize,
    /// Telemetry flush interval in seconds
    pub telemetry_flush_interval: u64,
    /// Hard cap on buffered telemetry records before oldest are dropped
    pub telemetry_buffer_max: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `BACKEND` - cache backend: memory, redis, or file (default: memory)
    /// - `REDIS_URL` - Redis connection URL (default: redis://127.0.0.1:6379)
    /// - `FILE_BACKEND_DIR` - file backend root directory (default: ./cache-data)
    /// - `CACHE_CAPACITY` - per-namespace entry capacity (default: 1000)
    /// - `DEFAULT_TTL` - default TTL in seconds, 0 disables (default: 300)
    /// - `CLEANUP_INTERVAL` - TTL sweep frequency in seconds (default: 1)
    /// - `RETRY_BASE_DELAY_MS` - retry backoff base (default: 1000)
    /// - `RETRY_MAX_DELAY_MS` - retry backoff cap (default: 60000)
    /// - `RETRY_SWEEP_INTERVAL` - retry promotion frequency in seconds (default: 1)
    /// - `TELEMETRY_BATCH_SIZE` - flush threshold (default: 100)
    /// - `TELEMETRY_FLUSH_INTERVAL` - flush frequency in seconds (default: 10)
    /// - `TELEMETRY_BUFFER_MAX` - hard buffer cap (default: 10000)
    pub fn from_env() -> Self {
        Self {
            server_port: env_parsed("SERVER_PORT", 3000),
            backend: env::var("BACKEND")
                .map(|v| BackendKind::parse(&v))
                .unwrap_or(BackendKind::Memory),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            file_backend_dir: env::var("FILE_BACKEND_DIR")
                .unwrap_or_else(|_| "./cache-data".to_string()),
            cache_capacity: env_parsed("CACHE_CAPACITY", 1000),
            default_ttl: env_parsed("DEFAULT_TTL", 300),
            cleanup_interval: env_parsed("CLEANUP_INTERVAL", 1),
            retry_base_delay_ms: env_parsed("RETRY_BASE_DELAY_MS", 1000),
            retry_max_delay_ms: env_parsed("RETRY_MAX_DELAY_MS", 60_000),
            retry_sweep_interval: env_parsed("RETRY_SWEEP_INTERVAL", 1),
            telemetry_batch_size: env_parsed("TELEMETRY_BATCH_SIZE", 100),
            telemetry_flush_interval: env_parsed("TELEMETRY_FLUSH_INTERVAL", 10),
            telemetry_buffer_max: env_parsed("TELEMETRY_BUFFER_MAX", 10_000),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            backend: BackendKind::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            file_backend_dir: "./cache-data".to_string(),
            cache_capacity: 1000,
            default_ttl: 300,
            cleanup_interval: 1,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 60_000,
            retry_sweep_interval: 1,
            telemetry_batch_size: 100,
            telemetry_flush_interval: 10,
            telemetry_buffer_max: 10_000,
        }
    }
}
