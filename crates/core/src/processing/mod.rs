//! Background processing of attachments.
//!
//! Creating an attachment enqueues a [`ProcessAttachmentJob`]. A dispatcher
//! task pulls jobs off the queue and runs each one on its own task, bounded
//! by a semaphore sized to the configured worker count. A job walks the
//! attachment through `pending -> processing -> done`, or `failed` when the
//! transcription or a status write goes wrong.
//!
//! There are no retries and no cancellation. Callers poll the attachment to
//! observe progress.

mod error;
mod job;
mod processor;
mod queue;
mod transcriber;

pub use error::ProcessingError;
pub use job::{JobOutcome, ProcessAttachmentJob};
pub use processor::AttachmentProcessor;
pub use queue::{JobQueue, JobReceiver, spawn_workers};
pub use transcriber::{SimulatedTranscriber, Transcriber};
