//! Error handling for the CV screener

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The candidate produced zero embeddable chunks. Unprocessable input,
    /// not retried.
    #[error("no usable resume text for candidate '{0}'")]
    NoCvText(String),

    /// The job carries no requirements. Raised before any embedding call.
    #[error("job '{0}' has no requirements")]
    NoJobRequirements(String),

    /// Upstream embedding dependency failed. Retrying the batch is the
    /// caller's call; distinct from input errors.
    #[error("embedding request failed: {0}")]
    EmbeddingsFailed(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("file format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ScreenerError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for ScreenerError {
    fn from(err: anyhow::Error) -> Self {
        ScreenerError::InvalidInput(err.to_string())
    }
}
