//! KT session error types.

use ktrack_shared::AppError;
use ktrack_shared::types::KtSessionId;
use thiserror::Error;

/// KT session operation errors.
#[derive(Debug, Error)]
pub enum KtSessionError {
    /// Session not found, or not owned by the caller.
    #[error("session not found: {0}")]
    NotFound(KtSessionId),

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// A unique value is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl KtSessionError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

impl From<KtSessionError> for AppError {
    fn from(err: KtSessionError) -> Self {
        match err {
            KtSessionError::NotFound(_) => Self::NotFound("Session not found".to_string()),
            KtSessionError::Validation(msg) => Self::Validation(msg),
            KtSessionError::Conflict(msg) => Self::Conflict(msg),
            KtSessionError::Repository(msg) => Self::Database(msg),
        }
    }
}
