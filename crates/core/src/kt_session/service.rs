//! KT session service implementation.

use std::sync::Arc;

use ktrack_shared::types::{KtSessionId, UserId};
use tracing::info;

use super::error::KtSessionError;
use super::types::{KtSession, KtSessionChanges, NewKtSession};
use crate::attachment::Attachment;

/// Repository trait for session persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait KtSessionRepository: Send + Sync {
    /// Create a new session record.
    fn create(
        &self,
        input: NewKtSession,
    ) -> impl std::future::Future<Output = Result<KtSession, KtSessionError>> + Send;

    /// Find a session by ID regardless of owner.
    fn find_by_id(
        &self,
        id: KtSessionId,
    ) -> impl std::future::Future<Output = Result<Option<KtSession>, KtSessionError>> + Send;

    /// Find a session by ID if it belongs to `owner`.
    fn find_owned(
        &self,
        id: KtSessionId,
        owner: UserId,
    ) -> impl std::future::Future<Output = Result<Option<KtSession>, KtSessionError>> + Send;

    /// List the sessions of `owner`, newest first.
    fn list_owned(
        &self,
        owner: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<KtSession>, KtSessionError>> + Send;

    /// Apply field changes to a session owned by `owner`.
    fn update(
        &self,
        id: KtSessionId,
        owner: UserId,
        changes: KtSessionChanges,
    ) -> impl std::future::Future<Output = Result<Option<KtSession>, KtSessionError>> + Send;

    /// Delete a session owned by `owner`, cascading to its attachments.
    fn delete(
        &self,
        id: KtSessionId,
        owner: UserId,
    ) -> impl std::future::Future<Output = Result<bool, KtSessionError>> + Send;

    /// List every attachment of a session, newest first.
    fn list_attachments(
        &self,
        id: KtSessionId,
    ) -> impl std::future::Future<Output = Result<Vec<Attachment>, KtSessionError>> + Send;

    /// Record the most recently minted share token on the session row.
    fn set_share_token(
        &self,
        id: KtSessionId,
        token: &str,
    ) -> impl std::future::Future<Output = Result<(), KtSessionError>> + Send;
}

/// Owner-scoped session management.
pub struct KtSessionService<R: KtSessionRepository> {
    repo: Arc<R>,
}

impl<R: KtSessionRepository> KtSessionService<R> {
    /// Create a new session service.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Create a session owned by `input.created_by`.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the repository fails.
    pub async fn create(&self, input: NewKtSession) -> Result<KtSession, KtSessionError> {
        input.validate()?;
        let session = self.repo.create(input).await?;

        info!(
            session_id = %session.id,
            owner_id = %session.created_by,
            "KT session created"
        );
        Ok(session)
    }

    /// List the caller's sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn list(&self, owner: UserId) -> Result<Vec<KtSession>, KtSessionError> {
        self.repo.list_owned(owner).await
    }

    /// Get one of the caller's sessions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session does not exist or belongs to someone else.
    pub async fn get(&self, id: KtSessionId, owner: UserId) -> Result<KtSession, KtSessionError> {
        self.repo
            .find_owned(id, owner)
            .await?
            .ok_or(KtSessionError::NotFound(id))
    }

    /// Update title and/or description.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown or foreign sessions and `Validation`
    /// for invalid fields.
    pub async fn update(
        &self,
        id: KtSessionId,
        owner: UserId,
        changes: KtSessionChanges,
    ) -> Result<KtSession, KtSessionError> {
        changes.validate()?;
        if changes.is_empty() {
            return self.get(id, owner).await;
        }

        self.repo
            .update(id, owner, changes)
            .await?
            .ok_or(KtSessionError::NotFound(id))
    }

    /// Delete a session and, through the store, all of its attachments.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown or foreign sessions.
    pub async fn delete(&self, id: KtSessionId, owner: UserId) -> Result<(), KtSessionError> {
        if !self.repo.delete(id, owner).await? {
            return Err(KtSessionError::NotFound(id));
        }

        info!(session_id = %id, owner_id = %owner, "KT session deleted");
        Ok(())
    }
}
