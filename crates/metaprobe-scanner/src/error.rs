use metaprobe_core::{ConfigError, JobId, MetaprobeError};
use metaprobe_db::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("invalid scan target: {0}")]
    InvalidTarget(#[from] MetaprobeError),

    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scan job {0} not found")]
    JobNotFound(JobId),

    #[error("scan job {0} is still active")]
    JobActive(JobId),
}

pub type Result<T> = std::result::Result<T, ScanError>;
