//! Attachment service implementation.

use std::sync::Arc;

use ktrack_shared::types::{AttachmentId, KtSessionId, PageRequest, PageResponse, UserId};
use tracing::{info, warn};

use super::error::AttachmentError;
use super::types::{
    Attachment, AttachmentChanges, AttachmentFilter, AttachmentStatus, AttachmentWithSession,
    CreateAttachmentInput, FileKind, NewAttachment, ProcessingOutput, UpdateAttachmentInput,
    validate_file_url,
};
use crate::kt_session::SessionRef;
use crate::processing::{JobQueue, ProcessAttachmentJob};

/// Repository trait for attachment persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait AttachmentRepository: Send + Sync {
    /// Create a new attachment record in `pending` status.
    fn create(
        &self,
        input: NewAttachment,
    ) -> impl std::future::Future<Output = Result<Attachment, AttachmentError>> + Send;

    /// Find attachment by ID regardless of owner.
    fn find_by_id(
        &self,
        id: AttachmentId,
    ) -> impl std::future::Future<Output = Result<Option<Attachment>, AttachmentError>> + Send;

    /// Find attachment by ID if its session belongs to `owner`.
    fn find_owned(
        &self,
        id: AttachmentId,
        owner: UserId,
    ) -> impl std::future::Future<Output = Result<Option<AttachmentWithSession>, AttachmentError>> + Send;

    /// List one page of the attachments of `owner`'s sessions, newest first,
    /// together with the total number of matches.
    fn list_owned(
        &self,
        owner: UserId,
        filter: &AttachmentFilter,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<(Vec<AttachmentWithSession>, u64), AttachmentError>> + Send;

    /// Apply client-editable column changes. Never touches status.
    fn update(
        &self,
        id: AttachmentId,
        changes: &AttachmentChanges,
    ) -> impl std::future::Future<Output = Result<Option<AttachmentWithSession>, AttachmentError>> + Send;

    /// Move the attachment from `from` to `to` if it is currently in `from`,
    /// writing `output` alongside.
    ///
    /// Returns `false` when no row matched (deleted, or in another status).
    /// Fails with `InvalidTransition` for edges outside the lifecycle.
    fn transition(
        &self,
        id: AttachmentId,
        from: AttachmentStatus,
        to: AttachmentStatus,
        output: Option<ProcessingOutput>,
    ) -> impl std::future::Future<Output = Result<bool, AttachmentError>> + Send;

    /// Delete attachment by ID.
    fn delete(
        &self,
        id: AttachmentId,
    ) -> impl std::future::Future<Output = Result<bool, AttachmentError>> + Send;

    /// Look up a session if it belongs to `owner`.
    fn owned_session(
        &self,
        session_id: KtSessionId,
        owner: UserId,
    ) -> impl std::future::Future<Output = Result<Option<SessionRef>, AttachmentError>> + Send;
}

/// Attachment service for managing attachments of the caller's sessions.
pub struct AttachmentService<R: AttachmentRepository> {
    repo: Arc<R>,
    jobs: JobQueue,
}

impl<R: AttachmentRepository> AttachmentService<R> {
    /// Create a new attachment service.
    #[must_use]
    pub fn new(repo: Arc<R>, jobs: JobQueue) -> Self {
        Self { repo, jobs }
    }

    /// Create an attachment in `pending` status and queue it for processing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The session does not exist or belongs to someone else
    /// - `file_type` is not a known kind
    /// - `file_url` is not an absolute http(s) URL
    /// - The job cannot be queued (the record stays `pending`)
    pub async fn create(
        &self,
        input: CreateAttachmentInput,
    ) -> Result<AttachmentWithSession, AttachmentError> {
        let session = self
            .repo
            .owned_session(input.session_id, input.owner)
            .await?
            .ok_or(AttachmentError::SessionNotFound(input.session_id))?;

        let file_kind = input.file_type.parse::<FileKind>()?;
        let file_url = validate_file_url(&input.file_url)?;

        let attachment = self
            .repo
            .create(NewAttachment {
                session_id: session.id,
                file_kind,
                file_url,
            })
            .await?;

        info!(
            attachment_id = %attachment.id,
            session_id = %session.id,
            file_type = %attachment.file_kind,
            "Attachment created"
        );

        if let Err(e) = self.jobs.enqueue(ProcessAttachmentJob::new(attachment.id)) {
            warn!(attachment_id = %attachment.id, error = %e, "Attachment left pending");
            return Err(AttachmentError::Enqueue(e.to_string()));
        }

        Ok(AttachmentWithSession {
            attachment,
            session,
        })
    }

    /// Get one attachment of the caller's sessions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the attachment does not exist or is not the caller's.
    pub async fn get(
        &self,
        id: AttachmentId,
        owner: UserId,
    ) -> Result<AttachmentWithSession, AttachmentError> {
        self.repo
            .find_owned(id, owner)
            .await?
            .ok_or(AttachmentError::NotFound(id))
    }

    /// List the caller's attachments.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for out-of-range pagination and `SessionNotFound`
    /// when filtering by a session the caller does not own.
    pub async fn list(
        &self,
        owner: UserId,
        filter: AttachmentFilter,
        page: PageRequest,
    ) -> Result<PageResponse<AttachmentWithSession>, AttachmentError> {
        page.validate()
            .map_err(|e| AttachmentError::Validation(e.message().to_string()))?;

        if let Some(session_id) = filter.session_id {
            self.repo
                .owned_session(session_id, owner)
                .await?
                .ok_or(AttachmentError::SessionNotFound(session_id))?;
        }

        let (items, total) = self.repo.list_owned(owner, &filter, page).await?;
        Ok(PageResponse::new(items, page, total))
    }

    /// Update client-editable fields.
    ///
    /// Transcript and summary can only be corrected once processing is done.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The attachment or the target session is not the caller's
    /// - A field fails validation
    /// - Transcript or summary is edited before the attachment is done
    pub async fn update(
        &self,
        id: AttachmentId,
        owner: UserId,
        input: UpdateAttachmentInput,
    ) -> Result<AttachmentWithSession, AttachmentError> {
        let current = self.get(id, owner).await?;
        let changes = self.validate_changes(owner, input).await?;

        if changes.touches_outputs() && current.attachment.status != AttachmentStatus::Done {
            return Err(AttachmentError::Validation(format!(
                "transcript and summary can only be edited once processing is done (status: {})",
                current.attachment.status
            )));
        }
        if changes.is_empty() {
            return Ok(current);
        }

        let updated = self
            .repo
            .update(id, &changes)
            .await?
            .ok_or(AttachmentError::NotFound(id))?;

        info!(attachment_id = %id, "Attachment updated");
        Ok(updated)
    }

    /// Delete an attachment of the caller's sessions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the attachment does not exist or is not the caller's.
    pub async fn delete(&self, id: AttachmentId, owner: UserId) -> Result<(), AttachmentError> {
        self.get(id, owner).await?;

        if !self.repo.delete(id).await? {
            return Err(AttachmentError::NotFound(id));
        }

        info!(attachment_id = %id, "Attachment deleted");
        Ok(())
    }

    async fn validate_changes(
        &self,
        owner: UserId,
        input: UpdateAttachmentInput,
    ) -> Result<AttachmentChanges, AttachmentError> {
        let file_kind = input.file_type.as_deref().map(str::parse::<FileKind>).transpose()?;
        let file_url = input
            .file_url
            .as_deref()
            .map(validate_file_url)
            .transpose()?;

        if let Some(session_id) = input.session_id {
            self.repo
                .owned_session(session_id, owner)
                .await?
                .ok_or(AttachmentError::SessionNotFound(session_id))?;
        }

        Ok(AttachmentChanges {
            session_id: input.session_id,
            file_kind,
            file_url,
            transcript: input.transcript,
            summary: input.summary,
        })
    }
}
