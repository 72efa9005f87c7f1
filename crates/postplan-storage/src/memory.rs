use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::store::BlobStore;

/// In-process [`BlobStore`] keyed in sorted order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: self.bucket.clone(),
                key: key.to_string(),
            })
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.objects.read().await.keys().cloned().collect())
    }
}
