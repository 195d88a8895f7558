use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Decoding error: {0}")]
    Decoding(String),
    #[error("Storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Reactor '{reactor}' failed: {message}")]
    Reactor {
        reactor: &'static str,
        message: String,
    },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    #[error("Timed out waiting for {operation}")]
    Timeout { operation: &'static str },
    #[error("Provider reported failure: {0}")]
    ProviderReported(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NotifyError {
    /// Wraps any displayable storage failure.
    pub fn storage(message: impl Into<String>) -> Self {
        NotifyError::Storage(Box::new(std::io::Error::other(message.into())))
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;
