//! Error types for skylift

use thiserror::Error;

/// Main error type for skylift
#[derive(Error, Debug)]
pub enum SkyliftError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Key error: {0}")]
    KeyError(String),

    #[error("Source error: {0}")]
    SourceError(String),

    #[error("Remote error: {0}")]
    RemoteError(String),

    #[error("Transfer error: {0}")]
    TransferError(String),

    #[error("Cloud error: {0}")]
    CloudError(String),

    #[error("Deployment error: {0}")]
    DeployError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Gave up after {attempts} attempts: {message}")]
    GaveUp { attempts: u32, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for SkyliftError {
    fn from(err: anyhow::Error) -> Self {
        SkyliftError::Internal(err.to_string())
    }
}
