use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::StorageError;

/// A single bucket of opaque blobs addressed by key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Bucket name, for logs and error messages.
    fn bucket(&self) -> &str;

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when `key` does not exist.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Every key in the bucket, in the store's listing order.
    async fn list(&self) -> Result<Vec<String>, StorageError>;
}

/// Fetches `key` and parses it as JSON.
///
/// # Errors
///
/// Propagates store errors; returns [`StorageError::Json`] if the body is
/// not valid JSON.
pub async fn get_json(store: &dyn BlobStore, key: &str) -> Result<Value, StorageError> {
    let bytes = store.get(key).await?;
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Json {
        key: key.to_string(),
        source,
    })
}

/// Serializes `value` as pretty-printed JSON and stores it at `key`.
///
/// # Errors
///
/// Returns [`StorageError::Json`] if serialization fails, or the store's
/// error if the upload fails.
pub async fn put_json<T: Serialize + Sync>(
    store: &dyn BlobStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Json {
        key: key.to_string(),
        source,
    })?;
    store.put(key, bytes, "application/json").await
}
