//! The orchestrator: one data key in, one [`PipelineResult`] out.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use postplan_analysis::{
    ContentPlan, EngagementAnalyzer, GeminiClient, RecommendationEngine, SimilarityIndex,
    TextGenerator, UnconfiguredGenerator,
};
use postplan_core::{AccountType, AppConfig};
use postplan_scraper::{check, normalize, ApifyScraper, ProfileScraper};
use postplan_storage::{
    get_json, put_json, BlobStore, PendingQueue, R2Bucket, R2Credentials, RetryPolicy,
};
use serde::Serialize;

use crate::error::PipelineError;
use crate::export::export_plan;
use crate::result::{PipelineResult, Stage};

pub const DEFAULT_RESULTS_LIMIT: u32 = 10;

/// Data-bucket key for a raw scrape of `username` taken at `at`.
#[must_use]
pub fn raw_upload_key(username: &str, at: DateTime<Utc>) -> String {
    format!(
        "{username}/instagram/{username}_{}.json",
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Per-key outcome of [`Pipeline::run_queue`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Text generator for `config`: Gemini when an API key is set, otherwise one
/// that always fails so every recommendation takes its fallback.
///
/// # Errors
///
/// Returns [`PipelineError::Generator`] if the HTTP client cannot be built.
pub fn generator_from_config(config: &AppConfig) -> Result<Arc<dyn TextGenerator>, PipelineError> {
    match &config.gemini_api_key {
        Some(key) => Ok(Arc::new(GeminiClient::new(
            key.clone(),
            &config.gemini_base_url,
            &config.gemini_model,
            config.request_timeout_secs,
        )?)),
        None => {
            tracing::warn!("GEMINI_API_KEY not set; recommendations will use fallbacks");
            Ok(Arc::new(UnconfiguredGenerator))
        }
    }
}

/// R2 bucket client for `bucket` using the credentials and retry bounds in
/// `config`.
///
/// # Errors
///
/// Returns [`PipelineError::Storage`] if the endpoint is invalid or the HTTP
/// client cannot be built.
pub fn bucket_from_config(config: &AppConfig, bucket: &str) -> Result<R2Bucket, PipelineError> {
    let credentials = R2Credentials {
        access_key_id: config.r2_access_key_id.clone(),
        secret_access_key: config.r2_secret_access_key.clone(),
    };
    let retry = RetryPolicy {
        max_attempts: config.storage_max_attempts,
        min_wait: Duration::from_secs(config.storage_min_wait_secs),
        max_wait: Duration::from_secs(config.storage_max_wait_secs),
        ..RetryPolicy::default()
    };
    R2Bucket::new(
        &config.r2_endpoint_url,
        bucket,
        &config.r2_region,
        credentials,
        retry,
        config.request_timeout_secs,
    )
    .map_err(PipelineError::from)
}

/// Owns every stage's collaborators and the process-lifetime similarity
/// index. Runs are sequential; callers serialize access.
pub struct Pipeline {
    data_store: Arc<dyn BlobStore>,
    tasks_store: Arc<dyn BlobStore>,
    scraper: Option<Arc<dyn ProfileScraper>>,
    engine: RecommendationEngine,
    analyzer: EngagementAnalyzer,
    index: SimilarityIndex,
    content_plan_path: PathBuf,
    results_limit: u32,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        data_store: Arc<dyn BlobStore>,
        tasks_store: Arc<dyn BlobStore>,
        generator: Arc<dyn TextGenerator>,
        content_plan_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_store,
            tasks_store,
            scraper: None,
            engine: RecommendationEngine::new(generator),
            analyzer: EngagementAnalyzer::default(),
            index: SimilarityIndex::new(),
            content_plan_path: content_plan_path.into(),
            results_limit: DEFAULT_RESULTS_LIMIT,
        }
    }

    /// Builds the production pipeline: R2 buckets, Apify when a token is
    /// set, and Gemini when an API key is set.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let data_store = bucket_from_config(config, &config.data_bucket)?;
        let tasks_store = bucket_from_config(config, &config.tasks_bucket)?;
        let generator = generator_from_config(config)?;

        let mut pipeline = Self::new(
            Arc::new(data_store),
            Arc::new(tasks_store),
            generator,
            config.content_plan_path.clone(),
        )
        .with_results_limit(config.default_results_limit);

        match &config.apify_api_token {
            Some(token) => {
                let scraper = ApifyScraper::new(
                    token.clone(),
                    &config.apify_base_url,
                    &config.apify_actor_id,
                    config.request_timeout_secs,
                )?;
                pipeline = pipeline.with_scraper(Arc::new(scraper));
            }
            None => tracing::warn!("APIFY_API_TOKEN not set; username scraping disabled"),
        }
        Ok(pipeline)
    }

    #[must_use]
    pub fn with_scraper(mut self, scraper: Arc<dyn ProfileScraper>) -> Self {
        self.scraper = Some(scraper);
        self
    }

    #[must_use]
    pub fn with_analyzer(mut self, analyzer: EngagementAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    #[must_use]
    pub fn with_results_limit(mut self, limit: u32) -> Self {
        self.results_limit = limit;
        self
    }

    pub fn data_store(&self) -> &Arc<dyn BlobStore> {
        &self.data_store
    }

    pub fn tasks_store(&self) -> &Arc<dyn BlobStore> {
        &self.tasks_store
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn reset_index(&mut self) {
        self.index.reset();
    }

    #[must_use]
    pub fn results_limit(&self) -> u32 {
        self.results_limit
    }

    /// Runs every stage against the raw object at `data_key`.
    ///
    /// Never fails outright: each stage's failure stops the run and is
    /// reported through the returned flags and message.
    pub async fn run(&mut self, data_key: &str) -> PipelineResult {
        tracing::info!(key = data_key, "starting pipeline");

        let raw = match get_json(self.data_store.as_ref(), data_key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(
                    stage = "retrieve",
                    key = data_key,
                    error = %e,
                    "failed to load raw data"
                );
                return PipelineResult::failed(
                    Stage::Start,
                    0,
                    format!("Failed to retrieve {data_key}: {e}"),
                );
            }
        };

        let dataset = match normalize(&raw, Utc::now()) {
            Ok(dataset) => dataset,
            Err(e) => {
                tracing::error!(
                    stage = "normalize",
                    key = data_key,
                    error = %e,
                    "normalization failed"
                );
                return PipelineResult::failed(Stage::Start, 0, e.to_string());
            }
        };

        if dataset.posts.is_empty() {
            match dataset.profile.account_type {
                AccountType::BusinessNoPosts => {
                    tracing::info!(
                        key = data_key,
                        "business account without posts; returning starter suggestions"
                    );
                    return PipelineResult::new_business();
                }
                AccountType::PrivateAccount => {
                    tracing::warn!(key = data_key, "skipping private account");
                    return PipelineResult::private_account();
                }
                _ => tracing::info!(key = data_key, "no posts found"),
            }
        }

        if let Err(issue) = check(&dataset) {
            tracing::error!(
                stage = "validate",
                key = data_key,
                issue = %issue,
                "dataset failed validation"
            );
            return PipelineResult::failed(
                Stage::Start,
                0,
                format!("Invalid data in {data_key}: {issue}"),
            );
        }

        let posts_indexed = self.index.add_posts(&dataset.posts);
        if posts_indexed == 0 {
            tracing::error!(stage = "index", key = data_key, "no posts indexed");
            return PipelineResult::failed(Stage::DataRetrieved, 0, "No posts indexed");
        }

        let forecast = match self.analyzer.analyze(&dataset.engagement_history) {
            Ok(forecast) => forecast,
            Err(e) => {
                tracing::error!(
                    stage = "engagement",
                    key = data_key,
                    error = %e,
                    "engagement analysis failed"
                );
                return PipelineResult::failed(Stage::PostsIndexed, posts_indexed, e.to_string());
            }
        };

        let username = resolve_username(&dataset.profile.username, data_key);
        let plan = match self
            .engine
            .build_content_plan(&username, &dataset, Some(&forecast), &self.index, Utc::now())
            .await
        {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!(
                    stage = "plan",
                    key = data_key,
                    error = %e,
                    "content plan generation failed"
                );
                return PipelineResult::failed(
                    Stage::EngagementAnalyzed,
                    posts_indexed,
                    e.to_string(),
                );
            }
        };

        if let Err(e) = save_plan(&self.content_plan_path, &plan).await {
            tracing::error!(stage = "save", key = data_key, error = %e, "content plan save failed");
            return PipelineResult::failed(Stage::PlanGenerated, posts_indexed, e.to_string());
        }

        let report = export_plan(self.tasks_store.as_ref(), &plan).await;
        tracing::info!(
            key = data_key,
            username = %username,
            posts_indexed,
            exported = report.all_uploaded(),
            "pipeline completed"
        );
        PipelineResult::completed(posts_indexed, report, plan)
    }

    /// Scrapes `username` and uploads the raw items to the data bucket.
    ///
    /// Returns the uploaded key, or `None` when the scrape came back empty.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ScraperNotConfigured`] without a scraper, or
    /// the scrape or upload error.
    pub async fn scrape_and_upload(
        &self,
        username: &str,
        results_limit: u32,
    ) -> Result<Option<String>, PipelineError> {
        let scraper = self.scraper.as_ref().ok_or(PipelineError::ScraperNotConfigured)?;
        let Some(items) = scraper.scrape(username, results_limit).await? else {
            tracing::warn!(username, "scrape returned no data");
            return Ok(None);
        };

        let key = raw_upload_key(username, Utc::now());
        put_json(self.data_store.as_ref(), &key, &items).await?;
        tracing::info!(username, key = %key, items = items.len(), "uploaded raw scrape");
        Ok(Some(key))
    }

    /// Scrapes `username`, runs the pipeline on the upload, and returns the
    /// content plan if the run succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if scraping or the raw upload fails. A run
    /// that fails after upload yields `Ok(None)`.
    pub async fn handle_username(
        &mut self,
        username: &str,
        results_limit: u32,
    ) -> Result<Option<ContentPlan>, PipelineError> {
        let Some(key) = self.scrape_and_upload(username, results_limit).await? else {
            return Ok(None);
        };
        let result = self.run(&key).await;
        if !result.success {
            tracing::warn!(username, key = %key, message = %result.message, "pipeline run failed");
        }
        Ok(result.content_plan)
    }

    /// Scrapes and uploads every pending queue entry, marking each one
    /// processed on success. Returns the uploaded keys.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Storage`] if the queue cannot be read or
    /// rewritten. Per-username scrape failures are logged and skipped.
    pub async fn process_pending_usernames(&self) -> Result<Vec<String>, PipelineError> {
        let queue = PendingQueue::new(self.tasks_store.clone());
        let mut entries = queue.load().await?;

        let mut keys = Vec::new();
        for entry in entries.iter_mut().filter(|e| e.is_pending()) {
            match self.scrape_and_upload(&entry.username, self.results_limit).await {
                Ok(Some(key)) => {
                    entry.mark_processed(Utc::now());
                    keys.push(key);
                }
                Ok(None) => {
                    tracing::warn!(username = %entry.username, "no data scraped; leaving pending");
                }
                Err(e) => {
                    tracing::warn!(
                        stage = "scrape",
                        username = %entry.username,
                        error = %e,
                        "scrape failed; leaving pending"
                    );
                }
            }
        }

        if keys.is_empty() {
            tracing::info!("no pending usernames processed");
        } else {
            queue.save(&entries).await?;
            tracing::info!(processed = keys.len(), "updated pending queue");
        }
        Ok(keys)
    }

    /// Processes the pending queue, then runs the pipeline on each upload.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] only if the queue itself cannot be
    /// processed; individual run failures are recorded in the report.
    pub async fn run_queue(&mut self) -> Result<QueueReport, PipelineError> {
        let keys = self.process_pending_usernames().await?;
        let mut report = QueueReport::default();
        for key in keys {
            let result = self.run(&key).await;
            if result.success {
                report.succeeded.push(key);
            } else {
                tracing::warn!(key = %key, message = %result.message, "queued run failed");
                report.failed.push(key);
            }
        }
        tracing::info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "queue run finished"
        );
        Ok(report)
    }
}

/// Profile username, or the first segment of the data key when the profile
/// carries none.
fn resolve_username(profile_username: &str, data_key: &str) -> String {
    let trimmed = profile_username.trim();
    if trimmed.is_empty() {
        data_key.split('/').next().unwrap_or(data_key).to_string()
    } else {
        trimmed.to_string()
    }
}

async fn save_plan(path: &Path, plan: &ContentPlan) -> Result<(), PipelineError> {
    let bytes = serde_json::to_vec_pretty(plan).map_err(|source| PipelineError::Serialize {
        context: "content plan".to_string(),
        source,
    })?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!(path = %path.display(), "saved content plan");
    Ok(())
}
