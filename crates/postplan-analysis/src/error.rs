use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("engagement series has no usable points")]
    InsufficientData,

    #[error("dataset has no posts to analyze")]
    NoPosts,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generator API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to deserialize {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("generator returned no text")]
    EmptyResponse,

    #[error("text generation is not configured")]
    NotConfigured,
}
