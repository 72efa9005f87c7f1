//! Generative-text backends.
//!
//! [`TextGenerator`] is the only seam the recommendation engine sees. The
//! Gemini client is the production implementation; [`UnconfiguredGenerator`]
//! stands in when no API key is set so every engine method takes its
//! fallback path.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

/// Turns a prompt into free text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Always fails with [`GenerateError::NotConfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        Err(GenerateError::NotConfigured)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Creates a client for `model` (e.g. `gemini-2.0-flash`) on `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Http`] if the underlying `reqwest::Client`
    /// cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, GenerateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    /// Sends one single-turn prompt and joins the text parts of the first
    /// candidate.
    ///
    /// # Errors
    ///
    /// - [`GenerateError::Http`] on network failure.
    /// - [`GenerateError::Api`] on a non-2xx status.
    /// - [`GenerateError::Deserialize`] if the body is not a generate
    ///   response.
    /// - [`GenerateError::EmptyResponse`] if no candidate carries text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(
                model = %self.model,
                status = status.as_u16(),
                "generate request rejected"
            );
            return Err(GenerateError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        let parsed: GenerateResponse =
            serde_json::from_slice(&body).map_err(|source| GenerateError::Deserialize {
                context: format!("generateContent({})", self.model),
                source,
            })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerateError::EmptyResponse);
        }
        tracing::debug!(model = %self.model, chars = text.len(), "generated text");
        Ok(text)
    }
}
