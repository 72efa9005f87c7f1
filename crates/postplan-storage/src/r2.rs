//! S3-compatible bucket client (Cloudflare R2) over plain `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, StatusCode};
use serde::Deserialize;

use crate::error::StorageError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::sigv4::{self, SigningRequest};
use crate::store::BlobStore;

/// Access key pair for the bucket endpoint.
#[derive(Clone)]
pub struct R2Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for R2Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("R2Credentials")
            .field("access_key_id", &"[redacted]")
            .field("secret_access_key", &"[redacted]")
            .finish()
    }
}

/// One bucket on an S3-compatible endpoint, addressed path-style
/// (`{endpoint}/{bucket}/{key}`).
#[derive(Debug, Clone)]
pub struct R2Bucket {
    client: reqwest::Client,
    endpoint: String,
    host: String,
    bucket: String,
    region: String,
    credentials: R2Credentials,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    contents: Vec<ListedObject>,
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedObject {
    key: String,
}

impl R2Bucket {
    /// Creates a client for `bucket` on `endpoint_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidEndpoint`] if `endpoint_url` has no
    /// `http://` or `https://` scheme, or [`StorageError::Http`] if the HTTP
    /// client cannot be built.
    pub fn new(
        endpoint_url: &str,
        bucket: impl Into<String>,
        region: impl Into<String>,
        credentials: R2Credentials,
        retry: RetryPolicy,
        timeout_secs: u64,
    ) -> Result<Self, StorageError> {
        let endpoint = endpoint_url.trim_end_matches('/').to_string();
        let host = endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
            .filter(|h| !h.is_empty())
            .ok_or_else(|| StorageError::InvalidEndpoint(endpoint_url.to_string()))?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            host,
            bucket: bucket.into(),
            region: region.into(),
            credentials,
            retry,
        })
    }

    /// Sends one signed request and returns the status and body.
    async fn send(
        &self,
        method: Method,
        key: Option<&str>,
        query: &[(String, String)],
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(StatusCode, Vec<u8>), StorageError> {
        let canonical_uri = match key {
            Some(key) => format!("/{}/{}", sigv4::uri_encode(&self.bucket), sigv4::encode_key(key)),
            None => format!("/{}", sigv4::uri_encode(&self.bucket)),
        };
        let signature = sigv4::sign(
            &SigningRequest {
                method: method.as_str(),
                host: &self.host,
                canonical_uri: &canonical_uri,
                query,
                payload: &body,
            },
            &self.credentials.access_key_id,
            &self.credentials.secret_access_key,
            &self.region,
            Utc::now(),
        );

        let mut url = format!("{}{}", self.endpoint, canonical_uri);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&sigv4::canonical_query(query));
        }

        let mut request = self
            .client
            .request(method, &url)
            .header("authorization", &signature.authorization)
            .header("x-amz-content-sha256", &signature.content_sha256)
            .header("x-amz-date", &signature.amz_date);
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        Ok((status, bytes.to_vec()))
    }

    fn status_error(&self, status: StatusCode, key: &str, body: &[u8]) -> StorageError {
        if status == StatusCode::NOT_FOUND {
            return StorageError::NotFound {
                bucket: self.bucket.clone(),
                key: key.to_string(),
            };
        }
        StorageError::UnexpectedStatus {
            status: status.as_u16(),
            bucket: self.bucket.clone(),
            key: key.to_string(),
            body: String::from_utf8_lossy(body).chars().take(500).collect(),
        }
    }

    async fn list_page(
        &self,
        continuation_token: Option<&str>,
    ) -> Result<ListBucketResult, StorageError> {
        let mut query = vec![("list-type".to_string(), "2".to_string())];
        if let Some(token) = continuation_token {
            query.push(("continuation-token".to_string(), token.to_string()));
        }
        let (status, body) = self.send(Method::GET, None, &query, Vec::new(), None).await?;
        if !status.is_success() {
            return Err(self.status_error(status, "", &body));
        }
        let xml = String::from_utf8_lossy(&body);
        quick_xml::de::from_str(&xml).map_err(|source| StorageError::Xml {
            bucket: self.bucket.clone(),
            source,
        })
    }
}

#[async_trait]
impl BlobStore for R2Bucket {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        retry_with_backoff(self.retry, "put", || {
            let bytes = bytes.clone();
            async move {
                let (status, body) = self
                    .send(Method::PUT, Some(key), &[], bytes, Some(content_type))
                    .await?;
                if status.is_success() {
                    Ok(())
                } else {
                    Err(self.status_error(status, key, &body))
                }
            }
        })
        .await?;
        tracing::info!(bucket = %self.bucket, key, "uploaded object");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        retry_with_backoff(self.retry, "get", || async move {
            let (status, body) = self.send(Method::GET, Some(key), &[], Vec::new(), None).await?;
            if status.is_success() {
                Ok(body)
            } else {
                Err(self.status_error(status, key, &body))
            }
        })
        .await
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = retry_with_backoff(self.retry, "list", || {
                let token = token.clone();
                async move { self.list_page(token.as_deref()).await }
            })
            .await?;
            keys.extend(page.contents.into_iter().map(|o| o.key));
            match (page.is_truncated, page.next_continuation_token) {
                (true, Some(next)) => token = Some(next),
                _ => break,
            }
        }
        Ok(keys)
    }
}
