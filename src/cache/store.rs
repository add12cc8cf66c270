//! Cache Store Module
//!
//! Main cache engine: namespaced storage through a backend adapter, with
//! per-namespace LRU tracking, lazy TTL expiry, and cumulative statistics.
//!
//! Locking is per namespace. Operations on the same namespace are
//! serialized; different namespaces proceed concurrently. When the primary
//! backend fails, the operation is retried against an in-memory fallback so
//! callers never see backend outages.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use crate::backend::{Backend, MemoryBackend};
use crate::cache::{CacheEntry, CacheStats, LruTracker, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{Result, ServiceError};

// == Namespace State ==
/// Book-keeping for one namespace, guarded by that namespace's lock.
struct NamespaceState {
    /// Maximum live entries before LRU eviction kicks in
    capacity: usize,
    /// Recency order; also the authoritative live-key index
    lru: LruTracker,
    /// Cumulative counters, process lifetime
    stats: CacheStats,
}

// == Cache Store ==
/// Namespaced cache with LRU eviction and TTL support over a backend.
pub struct CacheStore {
    backend: Arc<dyn Backend>,
    /// Served when the primary backend reports an infrastructure failure
    fallback: Arc<MemoryBackend>,
    namespaces: RwLock<HashMap<String, Arc<Mutex<NamespaceState>>>>,
    default_capacity: usize,
    default_ttl: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore on the given backend.
    ///
    /// # Arguments
    /// * `backend` - Storage backend (already constructed; connect separately)
    /// * `default_capacity` - Maximum live entries per namespace
    /// * `default_ttl` - Default TTL in seconds for entries without explicit
    ///   TTL; 0 disables the default so such entries never expire
    pub fn new(backend: Arc<dyn Backend>, default_capacity: usize, default_ttl: u64) -> Self {
        Self {
            backend,
            fallback: Arc::new(MemoryBackend::new()),
            namespaces: RwLock::new(HashMap::new()),
            default_capacity,
            default_ttl,
        }
    }

    /// Overrides the capacity of one namespace. Takes effect on the next
    /// insert; existing entries are not evicted here.
    pub async fn set_namespace_capacity(&self, namespace: &str, capacity: usize) {
        let shard = self.shard(namespace).await;
        shard.lock().await.capacity = capacity;
    }

    // == Set ==
    /// Stores a value under namespace+key with optional TTL.
    ///
    /// If the key already exists, the value is overwritten and TTL is reset.
    /// If the namespace is at capacity, the least recently accessed entry is
    /// evicted first.
    pub async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl: Option<u64>,
    ) -> Result<()> {
        validate_namespace_key(namespace, key)?;
        let serialized_len = serde_json::to_vec(&value)?.len();
        if serialized_len > MAX_VALUE_SIZE {
            return Err(ServiceError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        let shard = self.shard(namespace).await;
        let mut state = shard.lock().await;

        // Evict before inserting a new key into a full namespace. Looping
        // also restores the invariant after a capacity shrink.
        let already_live = state.lru.contains(key);
        if !already_live {
            while state.lru.len() >= state.capacity {
                match state.lru.pop_lru() {
                    Some(coldest) => {
                        self.backend_delete(&mut state, namespace, &coldest).await?;
                        state.stats.record_eviction();
                    }
                    None => break,
                }
            }
        }

        let effective_ttl = match ttl {
            Some(seconds) => Some(seconds),
            None if self.default_ttl > 0 => Some(self.default_ttl),
            None => None,
        };

        let entry = CacheEntry::new(value, effective_ttl);
        self.backend_set(&mut state, namespace, key, entry).await?;
        state.lru.touch(key);
        state.stats.size = state.lru.len();

        Ok(())
    }

    // == Get ==
    /// Retrieves a value by namespace+key.
    ///
    /// Returns `Ok(None)` for a missing or expired key; absence is not an
    /// error. Expired entries are removed on access (lazy expiry) and count
    /// as misses. On a hit, access metadata is refreshed and written back.
    pub async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>> {
        let shard = self.shard(namespace).await;
        let mut state = shard.lock().await;

        match self.backend_get(&mut state, namespace, key).await? {
            None => {
                state.stats.record_miss();
                Ok(None)
            }
            Some(entry) if entry.is_expired() => {
                self.backend_delete(&mut state, namespace, key).await?;
                state.lru.remove(key);
                state.stats.size = state.lru.len();
                state.stats.record_miss();
                Ok(None)
            }
            Some(mut entry) => {
                entry.touch();
                let value = entry.value.clone();
                self.backend_set(&mut state, namespace, key, entry).await?;
                state.lru.touch(key);
                state.stats.record_hit();
                Ok(Some(value))
            }
        }
    }

    // == Delete ==
    /// Removes an entry. Returns whether one existed.
    pub async fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        let shard = self.shard(namespace).await;
        let mut state = shard.lock().await;

        let removed = self.backend_delete(&mut state, namespace, key).await?;
        if removed {
            state.lru.remove(key);
            state.stats.size = state.lru.len();
        }
        Ok(removed)
    }

    // == Exists ==
    /// Reports whether a live (non-expired) entry is stored under
    /// namespace+key. Does not count as an access and does not touch LRU
    /// order, but does remove an entry found expired.
    pub async fn exists(&self, namespace: &str, key: &str) -> Result<bool> {
        let shard = self.shard(namespace).await;
        let mut state = shard.lock().await;

        match self.backend_get(&mut state, namespace, key).await? {
            None => Ok(false),
            Some(entry) if entry.is_expired() => {
                self.backend_delete(&mut state, namespace, key).await?;
                state.lru.remove(key);
                state.stats.size = state.lru.len();
                Ok(false)
            }
            Some(_) => Ok(true),
        }
    }

    // == Clear ==
    /// Removes every entry in a namespace. Returns the number removed.
    pub async fn clear(&self, namespace: &str) -> Result<usize> {
        let shard = self.shard(namespace).await;
        let mut state = shard.lock().await;

        let removed = self.backend_clear(&mut state, namespace).await?;
        state.lru.clear();
        state.stats.size = 0;
        Ok(removed)
    }

    // == Stats ==
    /// Returns statistics for one namespace, or aggregated across all
    /// namespaces when `namespace` is None. An unknown namespace reports
    /// zeroed counters.
    pub async fn stats(&self, namespace: Option<&str>) -> CacheStats {
        let shards: Vec<(String, Arc<Mutex<NamespaceState>>)> = {
            let namespaces = self.namespaces.read().await;
            namespaces
                .iter()
                .map(|(name, shard)| (name.clone(), shard.clone()))
                .collect()
        };

        let mut total = CacheStats::new();
        for (name, shard) in shards {
            if let Some(wanted) = namespace {
                if name != wanted {
                    continue;
                }
            }
            let state = shard.lock().await;
            let mut snapshot = state.stats.clone();
            snapshot.size = state.lru.len();
            total.merge(&snapshot);
        }
        total
    }

    // == Sweep Expired ==
    /// Removes all expired entries across namespaces (active expiry, driven
    /// by the background cleanup task). Returns the number removed.
    pub async fn sweep_expired(&self) -> usize {
        let shards: Vec<(String, Arc<Mutex<NamespaceState>>)> = {
            let namespaces = self.namespaces.read().await;
            namespaces
                .iter()
                .map(|(name, shard)| (name.clone(), shard.clone()))
                .collect()
        };

        let mut removed = 0usize;
        for (namespace, shard) in shards {
            let mut state = shard.lock().await;
            for key in state.lru.keys() {
                let entry = self
                    .backend_get(&mut state, &namespace, &key)
                    .await
                    .ok()
                    .flatten();
                if let Some(entry) = entry {
                    if entry.is_expired()
                        && self
                            .backend_delete(&mut state, &namespace, &key)
                            .await
                            .unwrap_or(false)
                    {
                        state.lru.remove(&key);
                        removed += 1;
                    }
                }
            }
            state.stats.size = state.lru.len();
        }
        removed
    }

    // == Shard Lookup ==
    /// Returns the lock for a namespace, creating its state on first use.
    async fn shard(&self, namespace: &str) -> Arc<Mutex<NamespaceState>> {
        {
            let namespaces = self.namespaces.read().await;
            if let Some(shard) = namespaces.get(namespace) {
                return shard.clone();
            }
        }

        let mut namespaces = self.namespaces.write().await;
        namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(NamespaceState {
                    capacity: self.default_capacity,
                    lru: LruTracker::new(),
                    stats: CacheStats::new(),
                }))
            })
            .clone()
    }

    // == Backend Access With Fallback ==
    // Each helper retries a failed primary call against the in-memory
    // fallback, logs a warning, and bumps the fallback counter. Only
    // infrastructure failures trigger the fallback; anything else
    // propagates.

    async fn backend_get(
        &self,
        state: &mut NamespaceState,
        namespace: &str,
        key: &str,
    ) -> Result<Option<CacheEntry>> {
        match self.backend.get(namespace, key).await {
            Ok(found) => Ok(found),
            Err(err) if err.is_backend_failure() => {
                self.note_fallback(state, "get", namespace, &err);
                self.fallback.get(namespace, key).await
            }
            Err(err) => Err(err),
        }
    }

    async fn backend_set(
        &self,
        state: &mut NamespaceState,
        namespace: &str,
        key: &str,
        entry: CacheEntry,
    ) -> Result<()> {
        match self.backend.set(namespace, key, entry.clone()).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_backend_failure() => {
                self.note_fallback(state, "set", namespace, &err);
                self.fallback.set(namespace, key, entry).await
            }
            Err(err) => Err(err),
        }
    }

    async fn backend_delete(
        &self,
        state: &mut NamespaceState,
        namespace: &str,
        key: &str,
    ) -> Result<bool> {
        match self.backend.delete(namespace, key).await {
            Ok(removed) => {
                // Keep the fallback coherent for keys written during an
                // earlier outage
                let _ = self.fallback.delete(namespace, key).await;
                Ok(removed)
            }
            Err(err) if err.is_backend_failure() => {
                self.note_fallback(state, "delete", namespace, &err);
                self.fallback.delete(namespace, key).await
            }
            Err(err) => Err(err),
        }
    }

    async fn backend_clear(
        &self,
        state: &mut NamespaceState,
        namespace: &str,
    ) -> Result<usize> {
        let _ = self.fallback.clear(namespace).await;
        match self.backend.clear(namespace).await {
            Ok(removed) => Ok(removed),
            Err(err) if err.is_backend_failure() => {
                self.note_fallback(state, "clear", namespace, &err);
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }

    fn note_fallback(
        &self,
        state: &mut NamespaceState,
        operation: &str,
        namespace: &str,
        err: &ServiceError,
    ) {
        warn!(
            backend = self.backend.name(),
            namespace,
            operation,
            error = %err,
            "backend unavailable, serving from in-memory fallback"
        );
        state.stats.record_fallback();
    }
}

fn validate_namespace_key(namespace: &str, key: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(ServiceError::InvalidRequest(
            "Namespace cannot be empty".to_string(),
        ));
    }
    if key.is_empty() {
        return Err(ServiceError::InvalidRequest(
            "Key cannot be empty".to_string(),
        ));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(ServiceError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    fn memory_store() -> CacheStore {
        CacheStore::new(Arc::new(MemoryBackend::new()), 100, 300)
    }

    /// Backend that refuses every operation, for exercising the fallback.
    struct UnreachableBackend;

    #[async_trait]
    impl Backend for UnreachableBackend {
        fn name(&self) -> &'static str {
            "unreachable"
        }
        async fn connect(&self) -> Result<()> {
            Err(ServiceError::Backend("connection refused".to_string()))
        }
        async fn get(&self, _: &str, _: &str) -> Result<Option<CacheEntry>> {
            Err(ServiceError::Backend("connection refused".to_string()))
        }
        async fn set(&self, _: &str, _: &str, _: CacheEntry) -> Result<()> {
            Err(ServiceError::Backend("connection refused".to_string()))
        }
        async fn delete(&self, _: &str, _: &str) -> Result<bool> {
            Err(ServiceError::Backend("connection refused".to_string()))
        }
        async fn exists(&self, _: &str, _: &str) -> Result<bool> {
            Err(ServiceError::Backend("connection refused".to_string()))
        }
        async fn clear(&self, _: &str) -> Result<usize> {
            Err(ServiceError::Backend("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = memory_store();

        store.set("ns", "k", json!("v1"), None).await.unwrap();
        let value = store.get("ns", "k").await.unwrap();

        assert_eq!(value, Some(json!("v1")));
    }

    #[tokio::test]
    async fn test_get_absent_is_none_not_error() {
        let store = memory_store();

        let value = store.get("ns", "missing").await.unwrap();
        assert!(value.is_none());

        let stats = store.stats(Some("ns")).await;
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_overwrite_resets_value() {
        let store = memory_store();

        store.set("ns", "k", json!("v1"), None).await.unwrap();
        store.set("ns", "k", json!("v2"), None).await.unwrap();

        assert_eq!(store.get("ns", "k").await.unwrap(), Some(json!("v2")));
        assert_eq!(store.stats(Some("ns")).await.size, 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_is_immediately_expired() {
        let store = memory_store();

        store.set("ns", "k", json!("v1"), Some(0)).await.unwrap();
        assert_eq!(store.get("ns", "k").await.unwrap(), None);

        let stats = store.stats(Some("ns")).await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 0);
    }

    #[tokio::test]
    async fn test_ttl_expiry_is_lazy() {
        let store = memory_store();

        store.set("ns", "k", json!("v1"), Some(1)).await.unwrap();
        assert!(store.get("ns", "k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(store.get("ns", "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = memory_store();

        store.set("ns", "k", json!("v1"), None).await.unwrap();
        assert!(store.delete("ns", "k").await.unwrap());
        assert!(!store.delete("ns", "k").await.unwrap());
        assert!(store.get("ns", "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exists_does_not_count_access() {
        let store = memory_store();

        store.set("ns", "k", json!("v1"), None).await.unwrap();
        assert!(store.exists("ns", "k").await.unwrap());
        assert!(!store.exists("ns", "missing").await.unwrap());

        let stats = store.stats(Some("ns")).await;
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_lru_eviction_order() {
        let store = CacheStore::new(Arc::new(MemoryBackend::new()), 3, 300);

        store.set("ns", "k1", json!(1), None).await.unwrap();
        store.set("ns", "k2", json!(2), None).await.unwrap();
        store.set("ns", "k3", json!(3), None).await.unwrap();

        // No intervening reads: inserting a fourth key evicts the first
        store.set("ns", "k4", json!(4), None).await.unwrap();

        assert!(store.get("ns", "k1").await.unwrap().is_none());
        assert!(store.get("ns", "k2").await.unwrap().is_some());
        assert!(store.get("ns", "k3").await.unwrap().is_some());
        assert!(store.get("ns", "k4").await.unwrap().is_some());

        let stats = store.stats(Some("ns")).await;
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.size, 3);
    }

    #[tokio::test]
    async fn test_get_refreshes_lru_position() {
        let store = CacheStore::new(Arc::new(MemoryBackend::new()), 3, 300);

        store.set("ns", "k1", json!(1), None).await.unwrap();
        store.set("ns", "k2", json!(2), None).await.unwrap();
        store.set("ns", "k3", json!(3), None).await.unwrap();

        // Reading k1 makes k2 the coldest key
        store.get("ns", "k1").await.unwrap();
        store.set("ns", "k4", json!(4), None).await.unwrap();

        assert!(store.get("ns", "k1").await.unwrap().is_some());
        assert!(store.get("ns", "k2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_capacity_is_per_namespace() {
        let store = CacheStore::new(Arc::new(MemoryBackend::new()), 2, 300);

        store.set("a", "k1", json!(1), None).await.unwrap();
        store.set("a", "k2", json!(2), None).await.unwrap();
        store.set("b", "k1", json!(3), None).await.unwrap();

        // Namespace "a" is full but "b" is not; no eviction anywhere yet
        assert_eq!(store.stats(None).await.evictions, 0);

        store.set("a", "k3", json!(4), None).await.unwrap();
        assert_eq!(store.stats(Some("a")).await.evictions, 1);
        assert_eq!(store.stats(Some("b")).await.evictions, 0);
    }

    #[tokio::test]
    async fn test_namespace_isolation() {
        let store = memory_store();

        store.set("a", "k", json!("in-a"), None).await.unwrap();
        store.set("b", "k", json!("in-b"), None).await.unwrap();

        assert_eq!(store.get("a", "k").await.unwrap(), Some(json!("in-a")));
        assert_eq!(store.get("b", "k").await.unwrap(), Some(json!("in-b")));

        store.delete("a", "k").await.unwrap();
        assert!(store.get("a", "k").await.unwrap().is_none());
        assert!(store.get("b", "k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_namespace() {
        let store = memory_store();

        store.set("ns", "k1", json!(1), None).await.unwrap();
        store.set("ns", "k2", json!(2), None).await.unwrap();

        assert_eq!(store.clear("ns").await.unwrap(), 2);
        assert_eq!(store.stats(Some("ns")).await.size, 0);
        assert!(store.get("ns", "k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats_aggregation() {
        let store = memory_store();

        store.set("a", "k", json!(1), None).await.unwrap();
        store.set("b", "k", json!(2), None).await.unwrap();
        store.get("a", "k").await.unwrap();
        store.get("a", "missing").await.unwrap();
        store.get("b", "k").await.unwrap();

        let all = store.stats(None).await;
        assert_eq!(all.hits, 2);
        assert_eq!(all.misses, 1);
        assert_eq!(all.size, 2);
        assert!((all.hit_ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_namespace_stats_are_zero() {
        let store = memory_store();
        let stats = store.stats(Some("never-used")).await;
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hit_ratio, 0.0);
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let store = memory_store();

        store.set("ns", "short", json!(1), Some(1)).await.unwrap();
        store.set("ns", "long", json!(2), Some(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let removed = store.sweep_expired().await;
        assert_eq!(removed, 1);
        assert_eq!(store.stats(Some("ns")).await.size, 1);
        assert!(store.get("ns", "long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_default_ttl_zero_means_no_expiry() {
        let store = CacheStore::new(Arc::new(MemoryBackend::new()), 100, 0);

        store.set("ns", "k", json!(1), None).await.unwrap();
        assert_eq!(store.sweep_expired().await, 0);
        assert!(store.get("ns", "k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_input() {
        let store = memory_store();

        assert!(matches!(
            store.set("", "k", json!(1), None).await,
            Err(ServiceError::InvalidRequest(_))
        ));
        assert!(matches!(
            store.set("ns", "", json!(1), None).await,
            Err(ServiceError::InvalidRequest(_))
        ));

        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);
        assert!(matches!(
            store.set("ns", &long_key, json!(1), None).await,
            Err(ServiceError::InvalidRequest(_))
        ));

        let huge = json!("x".repeat(MAX_VALUE_SIZE + 1));
        assert!(matches!(
            store.set("ns", "k", huge, None).await,
            Err(ServiceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_fallback_serves_when_backend_is_down() {
        let store = CacheStore::new(Arc::new(UnreachableBackend), 100, 300);

        store.set("ns", "k", json!("v1"), None).await.unwrap();
        assert_eq!(store.get("ns", "k").await.unwrap(), Some(json!("v1")));

        let stats = store.stats(Some("ns")).await;
        assert!(stats.fallbacks >= 2);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_namespace_capacity_override() {
        let store = CacheStore::new(Arc::new(MemoryBackend::new()), 100, 300);
        store.set_namespace_capacity("tight", 1).await;

        store.set("tight", "k1", json!(1), None).await.unwrap();
        store.set("tight", "k2", json!(2), None).await.unwrap();

        assert!(store.get("tight", "k1").await.unwrap().is_none());
        assert!(store.get("tight", "k2").await.unwrap().is_some());
    }
}
