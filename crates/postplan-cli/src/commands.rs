//! Command handlers. Each prints its result as JSON or plain lines on stdout.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use postplan_analysis::{RecommendationEngine, SimilarityIndex};
use postplan_core::{AppConfig, CanonicalDataset};
use postplan_pipeline::{bucket_from_config, generator_from_config, Pipeline};
use postplan_scraper::{check, normalize, ValidationIssue};
use postplan_storage::BlobStore;
use serde_json::Value;

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs the pipeline on `data_key` and prints the result.
///
/// # Errors
///
/// Returns an error if the pipeline cannot be built or the run fails.
pub(crate) async fn run_key(config: &AppConfig, data_key: &str) -> anyhow::Result<()> {
    let mut pipeline = Pipeline::from_config(config)?;
    let result = pipeline.run(data_key).await;
    print_json(&result)?;
    if !result.success {
        anyhow::bail!("pipeline failed for {data_key}: {}", result.message);
    }
    Ok(())
}

/// Scrapes `username`, runs the pipeline, and prints the content plan.
///
/// # Errors
///
/// Returns an error if scraping is not configured or the scrape or upload
/// fails.
pub(crate) async fn run_user(
    config: &AppConfig,
    username: &str,
    results_limit: Option<u32>,
) -> anyhow::Result<()> {
    let mut pipeline = Pipeline::from_config(config)?;
    let limit = results_limit.unwrap_or_else(|| pipeline.results_limit());
    match pipeline.handle_username(username, limit).await? {
        Some(plan) => print_json(&plan),
        None => {
            println!("no content plan produced for {username}");
            Ok(())
        }
    }
}

/// Processes the pending queue and runs the pipeline on each upload.
///
/// # Errors
///
/// Returns an error if the queue document cannot be read or written.
pub(crate) async fn run_queue(config: &AppConfig) -> anyhow::Result<()> {
    let mut pipeline = Pipeline::from_config(config)?;
    let report = pipeline.run_queue().await?;
    print_json(&report)
}

/// Generates one recommendation for `topic` against an empty index.
///
/// # Errors
///
/// Returns an error if the text generator cannot be built.
pub(crate) async fn run_recommend(config: &AppConfig, topic: &str) -> anyhow::Result<()> {
    let engine = RecommendationEngine::new(generator_from_config(config)?);
    let recommendation = engine
        .generate_recommendation(&SimilarityIndex::new(), topic)
        .await;
    print_json(&recommendation)
}

/// Prints every key in the data bucket.
///
/// # Errors
///
/// Returns an error if the bucket listing fails.
pub(crate) async fn run_list(config: &AppConfig) -> anyhow::Result<()> {
    let bucket = bucket_from_config(config, &config.data_bucket)?;
    let keys = bucket.list().await?;
    if keys.is_empty() {
        println!("bucket {} is empty", bucket.bucket());
    }
    for key in keys {
        println!("{key}");
    }
    Ok(())
}

/// Normalizes and validates the raw JSON at `file`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or its shape is
/// not recognized.
pub(crate) fn run_normalize(file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let raw: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;
    let dataset = normalize(&raw, Utc::now())?;
    print!("{}", summarize(&dataset, check(&dataset)));
    Ok(())
}

/// Human-readable description of a normalized dataset.
pub(crate) fn summarize(
    dataset: &CanonicalDataset,
    validation: Result<(), ValidationIssue>,
) -> String {
    let mut out = String::new();
    let profile = &dataset.profile;
    let username = if profile.username.is_empty() {
        "(unknown)"
    } else {
        profile.username.as_str()
    };
    let _ = writeln!(out, "username:           {username}");
    let _ = writeln!(out, "account type:       {}", profile.account_type);
    let _ = writeln!(out, "posts:              {}", dataset.posts.len());
    let _ = writeln!(out, "engagement records: {}", dataset.engagement_history.len());
    if let (Some(first), Some(last)) = (
        dataset.engagement_history.first(),
        dataset.engagement_history.last(),
    ) {
        let _ = writeln!(out, "history range:      {} .. {}", first.timestamp, last.timestamp);
    }
    match validation {
        Ok(()) => {
            let _ = writeln!(out, "validation:         ok");
        }
        Err(issue) => {
            let _ = writeln!(out, "validation:         failed ({issue})");
        }
    }
    out
}
