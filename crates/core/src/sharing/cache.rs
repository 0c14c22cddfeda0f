//! Share token storage using Moka.
//!
//! Two caches with the same TTL: `token -> grant` answers redemptions and
//! `session -> grant` finds the live token of a session without scanning.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ktrack_shared::types::KtSessionId;
use moka::future::Cache;
use tracing::debug;

use super::types::ShareGrant;

/// Default cache capacity (number of live tokens).
const DEFAULT_CAPACITY: u64 = 10_000;

/// Default time-to-live for a token (10 minutes).
const DEFAULT_TTL_SECS: u64 = 600;

/// Random bytes per token, before base64url encoding.
const TOKEN_BYTES: usize = 32;

/// In-memory store of live share tokens.
#[derive(Clone)]
pub struct ShareTokenCache {
    by_token: Cache<String, ShareGrant>,
    by_session: Cache<KtSessionId, ShareGrant>,
    ttl: Duration,
}

impl ShareTokenCache {
    /// Creates a cache with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `ttl` - Lifetime of every token
    /// * `max_capacity` - Maximum number of live tokens
    #[must_use]
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let by_token = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        let by_session = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            by_token,
            by_session,
            ttl,
        }
    }

    /// Returns the live grant of `session_id`, minting one if there is none.
    ///
    /// `on_mint` runs with the new token before it becomes visible; if it
    /// fails nothing is cached. Concurrent callers for the same session wait
    /// on a single mint and all receive its grant.
    ///
    /// The flag is `true` when an existing grant was returned.
    pub async fn grant_for<F, Fut, E>(
        &self,
        session_id: KtSessionId,
        on_mint: F,
    ) -> Result<(ShareGrant, bool), Arc<E>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Send + Sync + 'static,
    {
        if let Some(existing) = self.by_session.get(&session_id).await
            && !self.is_live(&existing)
        {
            self.by_session.invalidate(&session_id).await;
        }

        let entry = self
            .by_session
            .entry(session_id)
            .or_try_insert_with(async {
                let grant = self.mint(session_id);
                on_mint(grant.token.clone()).await?;
                self.by_token
                    .insert(grant.token.clone(), grant.clone())
                    .await;
                debug!(session_id = %session_id, expires_at = %grant.expires_at, "Share token minted");
                Ok(grant)
            })
            .await?;

        let reused = !entry.is_fresh();
        Ok((entry.into_value(), reused))
    }

    /// Looks up a token. Expired and unknown tokens resolve to `None`.
    pub async fn resolve(&self, token: &str) -> Option<ShareGrant> {
        self.by_token.get(token).await
    }

    fn mint(&self, session_id: KtSessionId) -> ShareGrant {
        let bytes: [u8; TOKEN_BYTES] = rand::random();
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        ShareGrant {
            token: base64_url::encode(&bytes),
            session_id,
            expires_at,
        }
    }

    fn is_live(&self, grant: &ShareGrant) -> bool {
        grant.expires_at > Utc::now() && self.by_token.contains_key(&grant.token)
    }
}

impl Default for ShareTokenCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS), DEFAULT_CAPACITY)
    }
}
