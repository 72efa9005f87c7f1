//! Blob storage for raw scrapes, exported plan sections, and the work queue.
//!
//! [`BlobStore`] is the seam every other crate talks to. [`R2Bucket`] speaks
//! the S3 REST API (Cloudflare R2 in production) with SigV4 signing and a
//! bounded retry around each call; [`MemoryStore`] backs tests and dry runs.

pub mod error;
pub mod memory;
pub mod queue;
pub mod r2;
pub mod retry;
pub mod store;

mod sigv4;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use queue::{PendingQueue, QueueEntry, QueueStatus, QUEUE_KEY};
pub use r2::{R2Bucket, R2Credentials};
pub use retry::RetryPolicy;
pub use store::{get_json, put_json, BlobStore};
