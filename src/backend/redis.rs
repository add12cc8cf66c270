//! Redis Backend
//!
//! Networked key-value store variant. Entries are stored as JSON under
//! `"{namespace}:{key}"`. Construction only parses the connection URL;
//! `connect` establishes the managed connection and verifies it with a PING.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::RwLock;

use super::Backend;
use crate::cache::CacheEntry;
use crate::error::{Result, ServiceError};

// == Redis Backend ==
pub struct RedisBackend {
    client: redis::Client,
    manager: RwLock<Option<ConnectionManager>>,
}

impl RedisBackend {
    /// Creates a backend for the given URL. Fails on a malformed URL; no
    /// connection is attempted until `connect`.
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            manager: RwLock::new(None),
        })
    }

    /// Returns a clone of the managed connection, or a backend error when
    /// `connect` has not succeeded yet.
    async fn connection(&self) -> Result<ConnectionManager> {
        let guard = self.manager.read().await;
        guard
            .clone()
            .ok_or_else(|| ServiceError::Backend("redis backend not connected".to_string()))
    }

    fn storage_key(namespace: &str, key: &str) -> String {
        format!("{}:{}", namespace, key)
    }
}

#[async_trait]
impl Backend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn connect(&self) -> Result<()> {
        let manager = self.client.get_connection_manager().await?;
        let mut probe = manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut probe).await?;

        let mut guard = self.manager.write().await;
        *guard = Some(manager);
        Ok(())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<CacheEntry>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(Self::storage_key(namespace, key)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, namespace: &str, key: &str, entry: CacheEntry) -> Result<()> {
        let mut conn = self.connection().await?;
        let storage_key = Self::storage_key(namespace, key);
        let json = serde_json::to_string(&entry)?;

        // Mirror the entry TTL as a server-side expiry so abandoned keys do
        // not accumulate in Redis. The cache layer still enforces expiry
        // itself.
        match entry.ttl_remaining_ms() {
            Some(remaining_ms) => {
                let seconds = (remaining_ms / 1000).max(1);
                let _: () = conn.set_ex(storage_key, json, seconds).await?;
            }
            None => {
                let _: () = conn.set(storage_key, json).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn.del(Self::storage_key(namespace, key)).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, namespace: &str, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let found: bool = conn.exists(Self::storage_key(namespace, key)).await?;
        Ok(found)
    }

    async fn clear(&self, namespace: &str) -> Result<usize> {
        let mut conn = self.connection().await?;
        let pattern = format!("{}:*", namespace);

        let keys: Vec<String> = {
            let mut iter = conn.scan_match::<_, String>(&pattern).await?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        let mut removed = 0usize;
        for key in &keys {
            let n: i64 = conn.del(key).await?;
            removed += n as usize;
        }
        Ok(removed)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_rejects_malformed_url() {
        assert!(RedisBackend::new("definitely not a url").is_err());
    }

    #[test]
    fn test_storage_key_layout() {
        assert_eq!(RedisBackend::storage_key("sessions", "user-1"), "sessions:user-1");
    }

    #[tokio::test]
    async fn test_operations_fail_before_connect() {
        let backend = RedisBackend::new("redis://127.0.0.1:6379").unwrap();
        let err = backend.get("ns", "k").await.unwrap_err();
        assert!(err.is_backend_failure());

        let err = backend
            .set("ns", "k", CacheEntry::new(json!(1), None))
            .await
            .unwrap_err();
        assert!(err.is_backend_failure());
    }
}
