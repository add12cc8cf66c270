//! In-Memory Backend
//!
//! Default backend: a process-local map guarded by a lock. Also serves as
//! the fallback target when a networked or file backend fails.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Backend;
use crate::cache::CacheEntry;
use crate::error::Result;

// == Memory Backend ==
/// Stores entries in a `HashMap` keyed by (namespace, key).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<(String, String), CacheEntry>>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<CacheEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    async fn set(&self, namespace: &str, key: &str, entry: CacheEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert((namespace.to_string(), key.to_string()), entry);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(entries
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some())
    }

    async fn exists(&self, namespace: &str, key: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.contains_key(&(namespace.to_string(), key.to_string())))
    }

    async fn clear(&self, namespace: &str) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|(ns, _), _| ns != namespace);
        Ok(before - entries.len())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_get() {
        let backend = MemoryBackend::new();
        backend.connect().await.unwrap();

        let entry = CacheEntry::new(json!("v1"), None);
        backend.set("ns", "k", entry).await.unwrap();

        let fetched = backend.get("ns", "k").await.unwrap().unwrap();
        assert_eq!(fetched.value, json!("v1"));
    }

    #[tokio::test]
    async fn test_get_absent() {
        let backend = MemoryBackend::new();
        assert!(backend.get("ns", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let backend = MemoryBackend::new();
        backend
            .set("ns", "k", CacheEntry::new(json!(1), None))
            .await
            .unwrap();

        assert!(backend.delete("ns", "k").await.unwrap());
        assert!(!backend.delete("ns", "k").await.unwrap());
        assert!(backend.get("ns", "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exists() {
        let backend = MemoryBackend::new();
        backend
            .set("ns", "k", CacheEntry::new(json!(1), None))
            .await
            .unwrap();

        assert!(backend.exists("ns", "k").await.unwrap());
        assert!(!backend.exists("ns", "other").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_only_touches_namespace() {
        let backend = MemoryBackend::new();
        backend
            .set("a", "k1", CacheEntry::new(json!(1), None))
            .await
            .unwrap();
        backend
            .set("a", "k2", CacheEntry::new(json!(2), None))
            .await
            .unwrap();
        backend
            .set("b", "k1", CacheEntry::new(json!(3), None))
            .await
            .unwrap();

        let removed = backend.clear("a").await.unwrap();
        assert_eq!(removed, 2);
        assert!(backend.get("a", "k1").await.unwrap().is_none());
        assert!(backend.get("b", "k1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_namespaces_do_not_collide() {
        let backend = MemoryBackend::new();
        backend
            .set("a", "k", CacheEntry::new(json!("in-a"), None))
            .await
            .unwrap();
        backend
            .set("b", "k", CacheEntry::new(json!("in-b"), None))
            .await
            .unwrap();

        assert_eq!(
            backend.get("a", "k").await.unwrap().unwrap().value,
            json!("in-a")
        );
        assert_eq!(
            backend.get("b", "k").await.unwrap().unwrap().value,
            json!("in-b")
        );
    }
}
