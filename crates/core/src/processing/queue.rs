//! Job queue and worker pool.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use super::error::ProcessingError;
use super::job::{JobOutcome, ProcessAttachmentJob};
use super::processor::AttachmentProcessor;
use super::transcriber::Transcriber;
use crate::attachment::AttachmentRepository;

/// Cloneable handle for submitting jobs. Enqueueing never blocks.
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<ProcessAttachmentJob>,
}

/// Receiving end of a [`JobQueue`], consumed by [`spawn_workers`].
#[derive(Debug)]
pub struct JobReceiver {
    receiver: mpsc::UnboundedReceiver<ProcessAttachmentJob>,
}

impl JobQueue {
    /// Create a queue and its receiver.
    #[must_use]
    pub fn new() -> (Self, JobReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, JobReceiver { receiver })
    }

    /// Submit a job.
    ///
    /// # Errors
    ///
    /// Returns `ProcessingError::QueueClosed` once the dispatcher has stopped.
    pub fn enqueue(&self, job: ProcessAttachmentJob) -> Result<(), ProcessingError> {
        let attachment_id = job.attachment_id;
        self.sender
            .send(job)
            .map_err(|_| ProcessingError::QueueClosed)?;

        debug!(attachment_id = %attachment_id, "Processing job enqueued");
        Ok(())
    }
}

impl JobReceiver {
    /// Receive the next job, or `None` once every [`JobQueue`] handle is dropped.
    pub async fn recv(&mut self) -> Option<ProcessAttachmentJob> {
        self.receiver.recv().await
    }

    /// Take a job if one is already waiting.
    pub fn try_recv(&mut self) -> Option<ProcessAttachmentJob> {
        self.receiver.try_recv().ok()
    }
}

/// Start the dispatcher.
///
/// At most `workers` jobs run at once. When every queue handle has been
/// dropped the dispatcher stops taking jobs, waits for the in-flight ones,
/// and the returned handle resolves.
pub fn spawn_workers<R, T>(
    processor: Arc<AttachmentProcessor<R, T>>,
    mut receiver: JobReceiver,
    workers: usize,
) -> JoinHandle<()>
where
    R: AttachmentRepository + 'static,
    T: Transcriber + 'static,
{
    let workers = workers.max(1);

    tokio::spawn(async move {
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut in_flight = JoinSet::new();
        info!(workers, "Attachment processor started");

        while let Some(job) = receiver.recv().await {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                error!("Worker semaphore closed");
                break;
            };

            let processor = Arc::clone(&processor);
            in_flight.spawn(async move {
                let _permit = permit;
                let outcome = processor.run(job).await;
                log_outcome(&outcome);
                outcome
            });

            while let Some(finished) = in_flight.try_join_next() {
                if let Err(e) = finished {
                    error!(error = %e, "Processing task panicked");
                }
            }
        }

        debug!(in_flight = in_flight.len(), "Job queue closed, draining");
        while let Some(finished) = in_flight.join_next().await {
            if let Err(e) = finished {
                error!(error = %e, "Processing task panicked");
            }
        }
        info!("Attachment processor stopped");
    })
}

fn log_outcome(outcome: &JobOutcome) {
    match outcome {
        JobOutcome::Completed(_) | JobOutcome::NotFound(_) | JobOutcome::Skipped { .. } => {
            info!(attachment_id = %outcome.attachment_id(), "{outcome}");
        }
        JobOutcome::Failed { .. } => {
            error!(attachment_id = %outcome.attachment_id(), "{outcome}");
        }
    }
}
