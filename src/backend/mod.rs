//! Backend Adapter Module
//!
//! Uniform storage interface behind the cache layer. Three variants exist:
//! an in-memory map, a networked key-value store (Redis), and a file-backed
//! store for large values. Selection is a configuration concern; cache
//! semantics are identical across variants.
//!
//! Lifecycle is two-phase: constructors perform no I/O, `connect` is called
//! once before first use.

mod file;
mod memory;
mod redis;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use self::redis::RedisBackend;

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::CacheEntry;
use crate::config::{BackendKind, Config};
use crate::error::Result;

// == Backend Trait ==
/// Storage operations required by the cache layer.
///
/// All methods may fail with `ServiceError::Backend` when the underlying
/// store is unreachable; the cache layer recovers by retrying against its
/// in-memory fallback.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Establishes connectivity. Called once before first use; must be the
    /// only place the backend performs setup I/O.
    async fn connect(&self) -> Result<()>;

    /// Fetches the entry stored under namespace+key, if any.
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<CacheEntry>>;

    /// Stores an entry under namespace+key, overwriting any previous value.
    async fn set(&self, namespace: &str, key: &str, entry: CacheEntry) -> Result<()>;

    /// Removes the entry under namespace+key. Returns whether one existed.
    async fn delete(&self, namespace: &str, key: &str) -> Result<bool>;

    /// Returns whether an entry is stored under namespace+key.
    async fn exists(&self, namespace: &str, key: &str) -> Result<bool>;

    /// Removes every entry in the namespace. Returns the number removed.
    async fn clear(&self, namespace: &str) -> Result<usize>;
}

// == Backend Selection ==
/// Builds the backend selected by the configuration.
///
/// No I/O happens here; callers must invoke `connect` on the result before
/// first use.
pub fn create_backend(config: &Config) -> Result<Arc<dyn Backend>> {
    Ok(match config.backend {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::Redis => Arc::new(RedisBackend::new(&config.redis_url)?),
        BackendKind::File => Arc::new(FileBackend::new(&config.file_backend_dir)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_backend_memory() {
        let config = Config::default();
        let backend = create_backend(&config).unwrap();
        assert_eq!(backend.name(), "memory");
    }

    #[test]
    fn test_create_backend_file() {
        let config = Config {
            backend: BackendKind::File,
            ..Config::default()
        };
        let backend = create_backend(&config).unwrap();
        assert_eq!(backend.name(), "file");
    }

    #[test]
    fn test_create_backend_bad_redis_url() {
        let config = Config {
            backend: BackendKind::Redis,
            redis_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(create_backend(&config).is_err());
    }
}
