//! Apify actor client for Instagram profile scrapes.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ScrapeError;
use crate::types::{ApiResponse, ProfileScraperInput, ProxyConfig, RunData};

/// Each poll long-waits up to 60 s server-side, so this bounds a run at
/// roughly half an hour.
const MAX_POLLS: u32 = 30;

/// Source of raw profile scrapes.
///
/// Returns `Ok(None)` when the scrape completed but produced nothing (private
/// or unknown accounts).
#[async_trait]
pub trait ProfileScraper: Send + Sync {
    async fn scrape(&self, username: &str, limit: u32) -> Result<Option<Vec<Value>>, ScrapeError>;
}

/// HTTP client for the Apify REST API.
pub struct ApifyScraper {
    client: reqwest::Client,
    token: String,
    base_url: String,
    actor_id: String,
}

impl ApifyScraper {
    /// Creates a client for `actor_id` (e.g. `apify~instagram-profile-scraper`).
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client` cannot
    /// be built.
    pub fn new(
        token: impl Into<String>,
        base_url: &str,
        actor_id: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs + 60))
            .build()?;
        Ok(Self {
            client,
            token: token.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            actor_id: actor_id.into(),
        })
    }

    async fn start_run(&self, username: &str, limit: u32) -> Result<RunData, ScrapeError> {
        let input = ProfileScraperInput {
            usernames: vec![username.to_string()],
            results_limit: limit,
            proxy_config: ProxyConfig {
                use_apify_proxy: true,
            },
            scrape_type: "posts",
        };
        let url = format!("{}/acts/{}/runs", self.base_url, self.actor_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&input)
            .send()
            .await?;
        let run: ApiResponse<RunData> = read_json(response, "actor run start").await?;
        Ok(run.data)
    }

    async fn wait_for_run(&self, run_id: &str) -> Result<RunData, ScrapeError> {
        for poll in 1..=MAX_POLLS {
            let url = format!("{}/actor-runs/{run_id}?waitForFinish=60", self.base_url);
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await?;
            let run: ApiResponse<RunData> = read_json(response, "actor run status").await?;
            match run.data.status.as_str() {
                "SUCCEEDED" => return Ok(run.data),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(ScrapeError::RunFailed {
                        run_id: run_id.to_string(),
                        status: run.data.status,
                    });
                }
                status => {
                    tracing::debug!(run_id, poll, status, "actor run still in progress");
                }
            }
        }
        Err(ScrapeError::PollLimit {
            run_id: run_id.to_string(),
            polls: MAX_POLLS,
        })
    }

    async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<Value>, ScrapeError> {
        let url = format!("{}/datasets/{dataset_id}/items?format=json", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        read_json(response, "dataset items").await
    }
}

#[async_trait]
impl ProfileScraper for ApifyScraper {
    async fn scrape(&self, username: &str, limit: u32) -> Result<Option<Vec<Value>>, ScrapeError> {
        tracing::info!(username, limit, "starting profile scrape");

        let run = self.start_run(username, limit).await?;
        tracing::info!(username, run_id = %run.id, "actor run started");

        let completed = self.wait_for_run(&run.id).await?;
        let items = self.dataset_items(&completed.default_dataset_id).await?;
        tracing::info!(
            username,
            run_id = %completed.id,
            items = items.len(),
            "profile scrape complete"
        );

        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(items))
    }
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &str,
) -> Result<T, ScrapeError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ScrapeError::Api {
            status: status.as_u16(),
            message,
        });
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|source| ScrapeError::Deserialize {
        context: context.to_string(),
        source,
    })
}
