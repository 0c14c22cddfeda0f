//! Transcription backends.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use super::error::ProcessingError;
use crate::attachment::{Attachment, ProcessingOutput};

/// Produces a transcript and summary for an attachment.
pub trait Transcriber: Send + Sync {
    /// Transcribe and summarize `attachment`.
    fn transcribe(
        &self,
        attachment: &Attachment,
    ) -> impl Future<Output = Result<ProcessingOutput, ProcessingError>> + Send;
}

/// Stand-in transcriber that sleeps for a fixed duration and returns canned text.
#[derive(Debug, Clone)]
pub struct SimulatedTranscriber {
    work_duration: Duration,
}

impl SimulatedTranscriber {
    /// Create a transcriber that takes `work_duration` per attachment.
    #[must_use]
    pub const fn new(work_duration: Duration) -> Self {
        Self { work_duration }
    }
}

impl Transcriber for SimulatedTranscriber {
    async fn transcribe(&self, attachment: &Attachment) -> Result<ProcessingOutput, ProcessingError> {
        debug!(
            attachment_id = %attachment.id,
            duration_ms = self.work_duration.as_millis(),
            "Simulating transcription"
        );
        tokio::time::sleep(self.work_duration).await;

        Ok(ProcessingOutput {
            transcript: format!(
                "Transcript of {} attachment at {}",
                attachment.file_kind, attachment.file_url
            ),
            summary: format!("Summary of {} attachment {}", attachment.file_kind, attachment.id),
        })
    }
}
