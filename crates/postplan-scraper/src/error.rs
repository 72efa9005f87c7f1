use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unsupported raw data format: {0}")]
    UnsupportedFormat(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Apify API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("actor run {run_id} finished with status {status}")]
    RunFailed { run_id: String, status: String },

    #[error("actor run {run_id} still running after {polls} polls")]
    PollLimit { run_id: String, polls: u32 },
}
