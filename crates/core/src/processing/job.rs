//! Job envelope and outcome.

use std::fmt;

use chrono::{DateTime, Utc};
use ktrack_shared::types::AttachmentId;

use crate::attachment::AttachmentStatus;

/// Request to process one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessAttachmentJob {
    /// Attachment to process.
    pub attachment_id: AttachmentId,
    /// Delivery attempt, starting at 1.
    pub attempt: u32,
    /// When the job was queued.
    pub enqueued_at: DateTime<Utc>,
}

impl ProcessAttachmentJob {
    /// First delivery of a job for `attachment_id`.
    #[must_use]
    pub fn new(attachment_id: AttachmentId) -> Self {
        Self {
            attachment_id,
            attempt: 1,
            enqueued_at: Utc::now(),
        }
    }
}

/// Result of running a job. `Display` gives the status line that gets logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The attachment reached `done`.
    Completed(AttachmentId),
    /// The attachment did not exist; nothing was written.
    NotFound(AttachmentId),
    /// The attachment was no longer pending; nothing was written.
    Skipped {
        /// Attachment the job referenced.
        attachment_id: AttachmentId,
        /// Status it was found in.
        status: AttachmentStatus,
    },
    /// Processing failed after the attachment was picked up.
    Failed {
        /// Attachment the job referenced.
        attachment_id: AttachmentId,
        /// What went wrong.
        reason: String,
    },
}

impl JobOutcome {
    /// Attachment the outcome refers to.
    #[must_use]
    pub const fn attachment_id(&self) -> AttachmentId {
        match self {
            Self::Completed(id)
            | Self::NotFound(id)
            | Self::Skipped { attachment_id: id, .. }
            | Self::Failed { attachment_id: id, .. } => *id,
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(id) => write!(f, "Attachment {id} processed successfully"),
            Self::NotFound(id) => write!(f, "Attachment {id} not found"),
            Self::Skipped {
                attachment_id,
                status,
            } => write!(f, "Attachment {attachment_id} skipped: already {status}"),
            Self::Failed {
                attachment_id,
                reason,
            } => write!(f, "Error processing attachment {attachment_id}: {reason}"),
        }
    }
}
