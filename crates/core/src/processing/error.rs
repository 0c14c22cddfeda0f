//! Processing error types.

use ktrack_shared::types::AttachmentId;
use thiserror::Error;

use crate::attachment::{AttachmentError, AttachmentStatus};

/// Errors raised while processing a single attachment.
///
/// These never reach API callers; they end up as the `reason` of a failed job.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The transcriber could not produce output.
    #[error("transcription failed: {0}")]
    Transcription(String),

    /// A guarded status write matched no row.
    #[error("attachment {id} is no longer {expected}")]
    StaleStatus {
        /// Attachment being processed.
        id: AttachmentId,
        /// Status the write expected to find.
        expected: AttachmentStatus,
    },

    /// The job queue has shut down.
    #[error("job queue is closed")]
    QueueClosed,

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl From<AttachmentError> for ProcessingError {
    fn from(err: AttachmentError) -> Self {
        Self::Repository(err.to_string())
    }
}
