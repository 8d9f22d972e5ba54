use crate::models::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The page could not be queried, or answered with malformed data.
    #[error("Page query failed: {0}")]
    QueryFailure(String),

    #[error(
        "No element found for '{intent}' ({candidates} candidates, {} strategies attempted)",
        .attempted.len()
    )]
    NotFound {
        intent: String,
        candidates: usize,
        attempted: Vec<String>,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}
