use std::path::PathBuf;

use postplan_analysis::GenerateError;
use postplan_scraper::ScrapeError;
use postplan_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("text generator setup failed: {0}")]
    Generator(#[from] GenerateError),

    #[error("no profile scraper configured (set APIFY_API_TOKEN)")]
    ScraperNotConfigured,

    #[error("JSON serialization error for {context}: {source}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write content plan to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
