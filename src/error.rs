use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    YamlSerialization(#[from] serde_yaml_ng::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Failure of a single registry fetch.
///
/// Never surfaced to chat users; the record cache logs it and keeps serving
/// the previous snapshot.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decompress response from {url}: {source}")]
    Decompress {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Package index at {0} lists no package chunks")]
    EmptyIndex(String),

    #[error("Fetch timed out after {0}s")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, FixerError>;
