//! Bounded exponential retry for blob-store calls.
//!
//! [`retry_with_backoff`] re-runs an operation on transient failures
//! (transport errors, 5xx, 429). Missing objects and other client errors are
//! returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::StorageError;

/// Attempt budget and wait bounds.
///
/// The wait after failed attempt `n` (1-based) is
/// `multiplier × 2^(n-1)`, clamped to `[min_wait, max_wait]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    /// 3 attempts, multiplier 1 s, waits clamped to 2–10 s.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            min_wait: Duration::from_secs(2),
            max_wait: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Retries without sleeping. Intended for tests.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            multiplier: Duration::ZERO,
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
        }
    }

    /// Wait before the attempt following failed attempt `attempt` (1-based).
    #[must_use]
    pub fn wait_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.multiplier
            .saturating_mul(factor)
            .clamp(self.min_wait, self.max_wait)
    }
}

/// Returns `true` for errors worth another attempt.
pub(crate) fn is_retriable(err: &StorageError) -> bool {
    match err {
        StorageError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.is_request()
                || e.status().is_some_and(|s| s.is_server_error())
        }
        StorageError::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
        StorageError::NotFound { .. }
        | StorageError::Xml { .. }
        | StorageError::Json { .. }
        | StorageError::InvalidEndpoint(_) => false,
    }
}

/// Runs `operation` up to `policy.max_attempts` times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    op_name: &str,
    mut operation: F,
) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_attempts {
                    return Err(err);
                }
                let wait = policy.wait_after(attempt);
                tracing::warn!(
                    op = op_name,
                    attempt,
                    max_attempts = policy.max_attempts,
                    wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "blob store transient error, retrying"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn server_error() -> StorageError {
        StorageError::UnexpectedStatus {
            status: 503,
            bucket: "b".to_string(),
            key: "k".to_string(),
            body: String::new(),
        }
    }

    fn not_found() -> StorageError {
        StorageError::NotFound {
            bucket: "b".to_string(),
            key: "k".to_string(),
        }
    }

    #[test]
    fn default_waits_are_clamped_to_two_through_ten_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.wait_after(1), Duration::from_secs(2));
        assert_eq!(policy.wait_after(2), Duration::from_secs(2));
        assert_eq!(policy.wait_after(3), Duration::from_secs(4));
        assert_eq!(policy.wait_after(4), Duration::from_secs(8));
        assert_eq!(policy.wait_after(5), Duration::from_secs(10));
        assert_eq!(policy.wait_after(40), Duration::from_secs(10));
    }

    #[test]
    fn classification() {
        assert!(is_retriable(&server_error()));
        assert!(is_retriable(&StorageError::UnexpectedStatus {
            status: 429,
            bucket: "b".to_string(),
            key: "k".to_string(),
            body: String::new(),
        }));
        assert!(!is_retriable(&StorageError::UnexpectedStatus {
            status: 403,
            bucket: "b".to_string(),
            key: "k".to_string(),
            body: String::new(),
        }));
        assert!(!is_retriable(&not_found()));
    }

    #[tokio::test]
    async fn stops_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = retry_with_backoff(RetryPolicy::immediate(3), "get", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(server_error())
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(RetryPolicy::immediate(3), "put", || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(server_error())
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = retry_with_backoff(RetryPolicy::immediate(3), "get", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(not_found())
            }
        })
        .await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
