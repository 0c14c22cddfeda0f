//! Attachments of KT sessions.
//!
//! An attachment points at an audio, video, PDF, or text artifact by URL.
//! It is created in `pending` status and handed to the processor, which is
//! the only writer of its status, transcript, and summary.

mod error;
mod service;
mod types;

pub use error::AttachmentError;
pub use service::{AttachmentRepository, AttachmentService};
pub use types::{
    Attachment, AttachmentChanges, AttachmentFilter, AttachmentStatus, AttachmentWithSession,
    CreateAttachmentInput, FileKind, MAX_FILE_URL_LEN, NewAttachment, ProcessingOutput,
    UpdateAttachmentInput, validate_file_url,
};
