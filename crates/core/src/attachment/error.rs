//! Attachment error types.

use ktrack_shared::AppError;
use ktrack_shared::types::{AttachmentId, KtSessionId};
use thiserror::Error;

use super::types::{AttachmentStatus, FileKind};

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Attachment not found, or its session is not owned by the caller.
    #[error("attachment not found: {0}")]
    NotFound(AttachmentId),

    /// Target session not found, or not owned by the caller.
    #[error("session not found: {0}")]
    SessionNotFound(KtSessionId),

    /// Unknown file kind.
    #[error("invalid file_type: {0}")]
    InvalidFileKind(String),

    /// Source URL rejected.
    #[error("{0}")]
    InvalidUrl(String),

    /// Status change outside the lifecycle.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: AttachmentStatus,
        /// Requested status.
        to: AttachmentStatus,
    },

    /// Other input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The processing job could not be queued.
    #[error("failed to enqueue processing job: {0}")]
    Enqueue(String),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl AttachmentError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

fn file_kind_choices() -> String {
    FileKind::ALL
        .iter()
        .map(FileKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<AttachmentError> for AppError {
    fn from(err: AttachmentError) -> Self {
        match err {
            AttachmentError::NotFound(_) => Self::NotFound("Attachment not found".to_string()),
            AttachmentError::SessionNotFound(_) => {
                Self::NotFound("Session not found".to_string())
            }
            AttachmentError::InvalidFileKind(_) => Self::Validation(format!(
                "Invalid file_type. Must be one of: {}",
                file_kind_choices()
            )),
            AttachmentError::InvalidUrl(msg) | AttachmentError::Validation(msg) => {
                Self::Validation(msg)
            }
            err @ AttachmentError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
            err @ AttachmentError::Enqueue(_) => Self::Internal(err.to_string()),
            AttachmentError::Repository(msg) => Self::Database(msg),
        }
    }
}
