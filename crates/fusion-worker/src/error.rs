//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid channel: {0}")]
    InvalidChannel(#[from] fusion_models::ChannelNameError),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] fusion_catalog::CatalogError),

    #[error("Media error: {0}")]
    Media(#[from] fusion_media::MediaError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    /// Whether the error came from bad input to the binary itself.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, WorkerError::ConfigError(_) | WorkerError::InvalidChannel(_))
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_usage_error() {
            2
        } else {
            1
        }
    }
}
