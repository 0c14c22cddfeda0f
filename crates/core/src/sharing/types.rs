//! Sharing types.

use chrono::{DateTime, Utc};
use ktrack_shared::types::KtSessionId;

use crate::attachment::{Attachment, FileKind};

/// A live share token and the session it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareGrant {
    /// Random URL-safe token.
    pub token: String,
    /// Session the token resolves to.
    pub session_id: KtSessionId,
    /// When the token stops resolving.
    pub expires_at: DateTime<Utc>,
}

/// Result of issuing a share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    /// The token.
    pub token: String,
    /// Relative redemption path.
    pub share_url: String,
    /// When the link stops working.
    pub expires_at: DateTime<Utc>,
    /// True if an already-live token was returned.
    pub reused: bool,
}

/// Read-only view of a session for share-link holders.
///
/// Carries no owner identity and no token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKtSession {
    /// Session title.
    pub title: String,
    /// Session description.
    pub description: String,
    /// Attachments, newest first.
    pub attachments: Vec<PublicAttachment>,
}

/// Read-only view of an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicAttachment {
    /// Artifact kind.
    pub file_kind: FileKind,
    /// Source URL.
    pub file_url: String,
    /// Summary, once processed.
    pub summary: Option<String>,
    /// Transcript, once processed.
    pub transcript: Option<String>,
}

impl From<Attachment> for PublicAttachment {
    fn from(attachment: Attachment) -> Self {
        Self {
            file_kind: attachment.file_kind,
            file_url: attachment.file_url,
            summary: attachment.summary,
            transcript: attachment.transcript,
        }
    }
}
