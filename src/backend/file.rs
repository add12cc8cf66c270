//! File Backend
//!
//! File-per-key store for large values. Each namespace maps to a directory
//! under the configured root; each entry is a JSON file whose name is the
//! hex-encoded key, so arbitrary key bytes stay filesystem-safe.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::Backend;
use crate::cache::CacheEntry;
use crate::error::Result;

// == File Backend ==
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at the given directory. The directory is
    /// created on `connect`, not here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(hex_encode(namespace))
    }

    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{}.json", hex_encode(key)))
    }
}

fn hex_encode(s: &str) -> String {
    s.bytes().map(|b| format!("{:02x}", b)).collect()
}

#[async_trait]
impl Backend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn connect(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<CacheEntry>> {
        match fs::read(self.entry_path(namespace, key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, namespace: &str, key: &str, entry: CacheEntry) -> Result<()> {
        fs::create_dir_all(self.namespace_dir(namespace)).await?;
        let json = serde_json::to_vec(&entry)?;
        fs::write(self.entry_path(namespace, key), json).await?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        match fs::remove_file(self.entry_path(namespace, key)).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn exists(&self, namespace: &str, key: &str) -> Result<bool> {
        match fs::metadata(self.entry_path(namespace, key)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn clear(&self, namespace: &str) -> Result<usize> {
        let dir = self.namespace_dir(namespace);
        let mut removed = 0usize;

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        while let Some(dirent) = entries.next_entry().await? {
            if dirent.file_type().await?.is_file() {
                removed += 1;
            }
        }

        fs::remove_dir_all(&dir).await?;
        Ok(removed)
    }
}
