//! Sharing error types.

use std::sync::Arc;

use ktrack_shared::AppError;
use ktrack_shared::types::KtSessionId;
use thiserror::Error;

use crate::kt_session::KtSessionError;

/// Share link errors.
#[derive(Debug, Error)]
pub enum SharingError {
    /// Session not found, or not owned by the caller.
    #[error("session not found: {0}")]
    SessionNotFound(KtSessionId),

    /// Token unknown or expired.
    #[error("share token not found or expired")]
    TokenNotFound,

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl From<KtSessionError> for SharingError {
    fn from(err: KtSessionError) -> Self {
        match err {
            KtSessionError::NotFound(id) => Self::SessionNotFound(id),
            other => Self::Repository(other.to_string()),
        }
    }
}

impl From<Arc<KtSessionError>> for SharingError {
    fn from(err: Arc<KtSessionError>) -> Self {
        match *err {
            KtSessionError::NotFound(id) => Self::SessionNotFound(id),
            ref other => Self::Repository(other.to_string()),
        }
    }
}

impl From<SharingError> for AppError {
    fn from(err: SharingError) -> Self {
        match err {
            SharingError::SessionNotFound(_) => Self::NotFound("Session not found".to_string()),
            SharingError::TokenNotFound => {
                Self::NotFound("Invalid or expired share link".to_string())
            }
            SharingError::Repository(msg) => Self::Database(msg),
        }
    }
}
