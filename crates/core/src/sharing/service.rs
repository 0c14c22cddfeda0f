//! Share link issuance and redemption.

use std::sync::Arc;

use ktrack_shared::types::{KtSessionId, UserId};
use tracing::info;

use super::cache::ShareTokenCache;
use super::error::SharingError;
use super::types::{PublicAttachment, PublicKtSession, ShareLink};
use crate::kt_session::KtSessionRepository;

/// Issues and redeems share links.
pub struct SharingService<R: KtSessionRepository> {
    repo: Arc<R>,
    tokens: Arc<ShareTokenCache>,
    link_base: String,
}

impl<R: KtSessionRepository> SharingService<R> {
    /// Create a new sharing service.
    ///
    /// `link_base` is the path prefix the token is appended to.
    #[must_use]
    pub fn new(repo: Arc<R>, tokens: Arc<ShareTokenCache>, link_base: impl Into<String>) -> Self {
        Self {
            repo,
            tokens,
            link_base: link_base.into(),
        }
    }

    /// Return the live share link of a session owned by `owner`, minting a
    /// new token if none is live.
    ///
    /// A freshly minted token is also recorded on the session row.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` if the session does not exist or belongs to
    /// someone else.
    pub async fn issue(
        &self,
        session_id: KtSessionId,
        owner: UserId,
    ) -> Result<ShareLink, SharingError> {
        self.repo
            .find_owned(session_id, owner)
            .await?
            .ok_or(SharingError::SessionNotFound(session_id))?;

        let repo = Arc::clone(&self.repo);
        let (grant, reused) = self
            .tokens
            .grant_for(session_id, |token| async move {
                repo.set_share_token(session_id, &token).await
            })
            .await?;

        if !reused {
            info!(session_id = %session_id, expires_at = %grant.expires_at, "Share link issued");
        }

        Ok(ShareLink {
            share_url: format!("{}/{}", self.link_base.trim_end_matches('/'), grant.token),
            token: grant.token,
            expires_at: grant.expires_at,
            reused,
        })
    }

    /// Resolve a token to the public view of its session.
    ///
    /// # Errors
    ///
    /// Returns `TokenNotFound` for unknown or expired tokens and
    /// `SessionNotFound` if the session was deleted after sharing.
    pub async fn redeem(&self, token: &str) -> Result<PublicKtSession, SharingError> {
        let grant = self
            .tokens
            .resolve(token)
            .await
            .ok_or(SharingError::TokenNotFound)?;

        let session = self
            .repo
            .find_by_id(grant.session_id)
            .await?
            .ok_or(SharingError::SessionNotFound(grant.session_id))?;
        let attachments = self.repo.list_attachments(session.id).await?;

        Ok(PublicKtSession {
            title: session.title,
            description: session.description,
            attachments: attachments.into_iter().map(PublicAttachment::from).collect(),
        })
    }
}
