//! The pending-username work queue stored as a single JSON document.
//!
//! Updates are read-modify-write over the whole document with no locking;
//! two writers running at once will lose one side's changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::store::{get_json, put_json, BlobStore};

/// Queue document key inside the tasks bucket.
pub const QUEUE_KEY: &str = "Usernames/instagram.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueueStatus {
    Pending,
    Processed,
    Other(String),
}

impl From<String> for QueueStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => QueueStatus::Pending,
            "processed" => QueueStatus::Processed,
            _ => QueueStatus::Other(value),
        }
    }
}

impl From<QueueStatus> for String {
    fn from(value: QueueStatus) -> Self {
        match value {
            QueueStatus::Pending => "pending".to_string(),
            QueueStatus::Processed => "processed".to_string(),
            QueueStatus::Other(s) => s,
        }
    }
}

/// One queued username. Fields this crate does not know are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub username: String,
    pub status: QueueStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QueueEntry {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == QueueStatus::Pending
    }

    pub fn mark_processed(&mut self, at: chrono::DateTime<chrono::Utc>) {
        self.status = QueueStatus::Processed;
        self.processed_at = Some(at.to_rfc3339());
    }
}

/// Handle on the queue document in a bucket.
#[derive(Clone)]
pub struct PendingQueue {
    store: Arc<dyn BlobStore>,
}

impl PendingQueue {
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Reads every entry. A missing document is an empty queue.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on fetch failure or if the document is not
    /// an array of entries.
    pub async fn load(&self) -> Result<Vec<QueueEntry>, StorageError> {
        let doc = match get_json(self.store.as_ref(), QUEUE_KEY).await {
            Ok(doc) => doc,
            Err(StorageError::NotFound { .. }) => {
                tracing::info!(bucket = %self.store.bucket(), key = QUEUE_KEY, "no queue document");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        serde_json::from_value(doc).map_err(|source| StorageError::Json {
            key: QUEUE_KEY.to_string(),
            source,
        })
    }

    /// Overwrites the queue document with `entries`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the upload fails.
    pub async fn save(&self, entries: &[QueueEntry]) -> Result<(), StorageError> {
        put_json(self.store.as_ref(), QUEUE_KEY, &entries).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn missing_document_is_empty_queue() {
        let queue = PendingQueue::new(Arc::new(MemoryStore::new("tasks")));
        assert!(queue.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_and_save_preserve_unknown_fields() {
        let store = Arc::new(MemoryStore::new("tasks"));
        put_json(
            store.as_ref(),
            QUEUE_KEY,
            &json!([
                {"username": "acme", "status": "pending", "priority": 2},
                {"username": "done", "status": "processed", "processed_at": "2024-01-01T00:00:00+00:00"},
                {"username": "odd", "status": "paused"}
            ]),
        )
        .await
        .unwrap();

        let queue = PendingQueue::new(store.clone());
        let mut entries = queue.load().await.unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_pending());
        assert!(!entries[1].is_pending());
        assert_eq!(entries[2].status, QueueStatus::Other("paused".to_string()));

        entries[0].mark_processed(chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        queue.save(&entries).await.unwrap();

        let saved = get_json(store.as_ref(), QUEUE_KEY).await.unwrap();
        assert_eq!(saved[0]["status"], "processed");
        assert_eq!(saved[0]["processed_at"], "2024-06-01T00:00:00+00:00");
        assert_eq!(saved[0]["priority"], 2);
        assert_eq!(saved[2]["status"], "paused");
        assert!(saved[2].get("processed_at").is_none());
    }

    #[tokio::test]
    async fn malformed_document_is_an_error() {
        let store = Arc::new(MemoryStore::new("tasks"));
        put_json(store.as_ref(), QUEUE_KEY, &json!({"not": "a list"}))
            .await
            .unwrap();
        let result = PendingQueue::new(store).load().await;
        assert!(matches!(result, Err(StorageError::Json { .. })));
    }
}
