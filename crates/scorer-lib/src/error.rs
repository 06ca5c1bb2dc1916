//! Error types for the scoring library

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScorerError>;

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid sample document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid scorer configuration: {0}")]
    InvalidConfig(String),
}
