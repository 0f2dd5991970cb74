//! In-memory blob store used by tests.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{BlobStore, StorageError};

/// `HashMap`-backed [`BlobStore`] fake.
///
/// Also keeps an ordered log of every key written, so tests can
/// assert "no blob was written" and inspect write ordering.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    write_log: RwLock<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys written so far, in write order (including overwrites).
    pub async fn written_keys(&self) -> Vec<String> {
        self.write_log.read().await.clone()
    }

    /// Number of distinct blobs currently stored.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.blobs.write().await.insert(key.to_string(), bytes);
        self.write_log.write().await.push(key.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.blobs.read().await.contains_key(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{key}")
    }
}
