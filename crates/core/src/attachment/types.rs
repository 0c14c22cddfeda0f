//! Attachment types and data structures.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use ktrack_shared::types::{AttachmentId, KtSessionId, UserId};
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::AttachmentError;
use crate::kt_session::SessionRef;

/// Maximum length of an attachment source URL.
pub const MAX_FILE_URL_LEN: usize = 200;

/// Kind of artifact an attachment points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Audio recording.
    Audio,
    /// Video recording.
    Video,
    /// PDF document.
    Pdf,
    /// Plain text.
    Text,
}

impl FileKind {
    /// Every accepted kind, in display order.
    pub const ALL: [Self; 4] = [Self::Audio, Self::Video, Self::Pdf, Self::Text];

    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Pdf => "pdf",
            Self::Text => "text",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            "pdf" => Some(Self::Pdf),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = AttachmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AttachmentError::InvalidFileKind(s.to_string()))
    }
}

/// Processing lifecycle of an attachment.
///
/// ```text
/// pending -> processing -> done
///                       -> failed
/// ```
///
/// Only the processor moves an attachment between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentStatus {
    /// Waiting for a worker.
    #[default]
    Pending,
    /// A worker is transcribing it.
    Processing,
    /// Transcript and summary are available.
    Done,
    /// Processing failed; no further transitions.
    Failed,
}

impl AttachmentStatus {
    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns true if `self -> next` is an edge of the lifecycle.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing) | (Self::Processing, Self::Done | Self::Failed)
        )
    }
}

impl fmt::Display for AttachmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attachment domain model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Unique identifier.
    pub id: AttachmentId,
    /// Owning session.
    pub session_id: KtSessionId,
    /// Artifact kind.
    pub file_kind: FileKind,
    /// Source URL of the artifact.
    pub file_url: String,
    /// Processing status.
    pub status: AttachmentStatus,
    /// Transcript, written by the processor.
    pub transcript: Option<String>,
    /// Summary, written by the processor.
    pub summary: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Attachment together with the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentWithSession {
    /// The attachment.
    pub attachment: Attachment,
    /// Its session.
    pub session: SessionRef,
}

/// Raw client input for creating an attachment.
#[derive(Debug, Clone)]
pub struct CreateAttachmentInput {
    /// Caller; must own the target session.
    pub owner: UserId,
    /// Target session.
    pub session_id: KtSessionId,
    /// Requested file kind, unparsed.
    pub file_type: String,
    /// Source URL, unvalidated.
    pub file_url: String,
}

/// Validated attachment insert. Status always starts as pending.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    /// Owning session.
    pub session_id: KtSessionId,
    /// Artifact kind.
    pub file_kind: FileKind,
    /// Source URL.
    pub file_url: String,
}

/// Raw client input for updating an attachment. Absent fields stay unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateAttachmentInput {
    /// Move to another session owned by the caller.
    pub session_id: Option<KtSessionId>,
    /// New file kind, unparsed.
    pub file_type: Option<String>,
    /// New source URL, unvalidated.
    pub file_url: Option<String>,
    /// Corrected transcript.
    pub transcript: Option<String>,
    /// Corrected summary.
    pub summary: Option<String>,
}

/// Validated column changes. Never includes status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentChanges {
    /// New owning session.
    pub session_id: Option<KtSessionId>,
    /// New file kind.
    pub file_kind: Option<FileKind>,
    /// New source URL.
    pub file_url: Option<String>,
    /// New transcript.
    pub transcript: Option<String>,
    /// New summary.
    pub summary: Option<String>,
}

impl AttachmentChanges {
    /// Returns true if nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.session_id.is_none()
            && self.file_kind.is_none()
            && self.file_url.is_none()
            && self.transcript.is_none()
            && self.summary.is_none()
    }

    /// Returns true if the processor-owned output columns are touched.
    #[must_use]
    pub const fn touches_outputs(&self) -> bool {
        self.transcript.is_some() || self.summary.is_some()
    }
}

/// Filters for listing attachments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachmentFilter {
    /// Only attachments of this session.
    pub session_id: Option<KtSessionId>,
    /// Only attachments of this kind.
    pub file_kind: Option<FileKind>,
}

/// Results written by the processor on the transition into `done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOutput {
    /// Transcript text.
    pub transcript: String,
    /// Summary text.
    pub summary: String,
}

/// Checks that `raw` is an absolute http(s) URL with a host.
///
/// # Errors
///
/// Returns `AttachmentError::InvalidUrl` otherwise.
pub fn validate_file_url(raw: &str) -> Result<String, AttachmentError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AttachmentError::InvalidUrl("file_url is required".to_string()));
    }
    if trimmed.len() > MAX_FILE_URL_LEN {
        return Err(AttachmentError::InvalidUrl(format!(
            "file_url may not exceed {MAX_FILE_URL_LEN} characters"
        )));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| AttachmentError::InvalidUrl(format!("file_url is not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AttachmentError::InvalidUrl(
            "file_url must use http or https".to_string(),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(AttachmentError::InvalidUrl(
            "file_url must include a host".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}
