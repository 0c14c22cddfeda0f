//! Attachment processor.

use std::sync::Arc;

use ktrack_shared::types::AttachmentId;
use tracing::{info, warn};

use super::error::ProcessingError;
use super::job::{JobOutcome, ProcessAttachmentJob};
use super::transcriber::Transcriber;
use crate::attachment::{Attachment, AttachmentRepository, AttachmentStatus};

/// Runs a single job against the attachment store.
pub struct AttachmentProcessor<R: AttachmentRepository, T: Transcriber> {
    repo: Arc<R>,
    transcriber: T,
}

impl<R: AttachmentRepository, T: Transcriber> AttachmentProcessor<R, T> {
    /// Create a new processor.
    #[must_use]
    pub fn new(repo: Arc<R>, transcriber: T) -> Self {
        Self { repo, transcriber }
    }

    /// Process the attachment named by `job`.
    ///
    /// Never returns an error: every failure is folded into the outcome, and
    /// after the attachment has been claimed a best-effort `failed` status is
    /// written.
    pub async fn run(&self, job: ProcessAttachmentJob) -> JobOutcome {
        let id = job.attachment_id;
        info!(
            attachment_id = %id,
            attempt = job.attempt,
            enqueued_at = %job.enqueued_at,
            "Processing attachment"
        );

        let attachment = match self.repo.find_by_id(id).await {
            Ok(Some(attachment)) => attachment,
            Ok(None) => return JobOutcome::NotFound(id),
            Err(e) => {
                return JobOutcome::Failed {
                    attachment_id: id,
                    reason: ProcessingError::from(e).to_string(),
                };
            }
        };

        if attachment.status != AttachmentStatus::Pending {
            return JobOutcome::Skipped {
                attachment_id: id,
                status: attachment.status,
            };
        }

        match self
            .repo
            .transition(id, AttachmentStatus::Pending, AttachmentStatus::Processing, None)
            .await
        {
            Ok(true) => info!(attachment_id = %id, "Attachment updated to processing"),
            Ok(false) => return self.lost_claim(id).await,
            Err(e) => return self.fail(id, e.into()).await,
        }

        match self.complete(&attachment).await {
            Ok(()) => {
                info!(attachment_id = %id, "Attachment updated to done");
                JobOutcome::Completed(id)
            }
            Err(e) => self.fail(id, e).await,
        }
    }

    async fn complete(&self, attachment: &Attachment) -> Result<(), ProcessingError> {
        let output = self.transcriber.transcribe(attachment).await?;

        let written = self
            .repo
            .transition(
                attachment.id,
                AttachmentStatus::Processing,
                AttachmentStatus::Done,
                Some(output),
            )
            .await?;

        if !written {
            return Err(ProcessingError::StaleStatus {
                id: attachment.id,
                expected: AttachmentStatus::Processing,
            });
        }
        Ok(())
    }

    /// The claim write matched nothing: the row was deleted or another
    /// delivery got there first.
    async fn lost_claim(&self, id: AttachmentId) -> JobOutcome {
        match self.repo.find_by_id(id).await {
            Ok(None) => JobOutcome::NotFound(id),
            Ok(Some(current)) => JobOutcome::Skipped {
                attachment_id: id,
                status: current.status,
            },
            Err(e) => JobOutcome::Failed {
                attachment_id: id,
                reason: ProcessingError::from(e).to_string(),
            },
        }
    }

    async fn fail(&self, id: AttachmentId, err: ProcessingError) -> JobOutcome {
        match self
            .repo
            .transition(id, AttachmentStatus::Processing, AttachmentStatus::Failed, None)
            .await
        {
            Ok(true) => info!(attachment_id = %id, error = %err, "Attachment updated to failed"),
            Ok(false) => warn!(
                attachment_id = %id,
                error = %err,
                "Could not mark attachment failed: no longer processing"
            ),
            Err(write_err) => warn!(
                attachment_id = %id,
                error = %err,
                write_error = %write_err,
                "Could not mark attachment failed"
            ),
        }

        JobOutcome::Failed {
            attachment_id: id,
            reason: err.to_string(),
        }
    }
}
