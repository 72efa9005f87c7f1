use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("unexpected HTTP status {status} for {bucket}/{key}: {body}")]
    UnexpectedStatus {
        status: u16,
        bucket: String,
        key: String,
        body: String,
    },

    #[error("XML parse error for bucket listing {bucket}: {source}")]
    Xml {
        bucket: String,
        #[source]
        source: quick_xml::DeError,
    },

    #[error("JSON error for {key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid endpoint URL \"{0}\"")]
    InvalidEndpoint(String),
}
