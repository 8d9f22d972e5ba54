use thiserror::Error;

/// Failures talking to the live page or browser session.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend not ready (session not launched or already closed)")]
    NotReady,

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Operation not supported by this backend: {0}")]
    NotSupported(String),

    #[error("Backend error: {0}")]
    Other(String),
}
