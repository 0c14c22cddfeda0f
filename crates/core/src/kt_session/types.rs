//! KT session types and data structures.

use chrono::{DateTime, Utc};
use ktrack_shared::types::{KtSessionId, UserId};
use serde::{Deserialize, Serialize};

use super::error::KtSessionError;

/// Maximum length of a session title, in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// KT session domain model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KtSession {
    /// Unique identifier.
    pub id: KtSessionId,
    /// Session title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Owning user.
    pub created_by: UserId,
    /// Most recently minted share token, if any.
    pub share_token: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl KtSession {
    /// Returns the id/title pair embedded in attachment responses.
    #[must_use]
    pub fn to_ref(&self) -> SessionRef {
        SessionRef {
            id: self.id,
            title: self.title.clone(),
        }
    }
}

/// Minimal reference to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRef {
    /// Session ID.
    pub id: KtSessionId,
    /// Session title.
    pub title: String,
}

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct NewKtSession {
    /// Session title.
    pub title: String,
    /// Session description.
    pub description: String,
    /// Owning user.
    pub created_by: UserId,
}

impl NewKtSession {
    /// Validates title and description.
    ///
    /// # Errors
    ///
    /// Returns `KtSessionError::Validation` when a field is blank or too long.
    pub fn validate(&self) -> Result<(), KtSessionError> {
        validate_title(&self.title)?;
        validate_description(&self.description)
    }
}

/// Field changes for a session. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct KtSessionChanges {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
}

impl KtSessionChanges {
    /// Returns true if nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    /// Validates the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns `KtSessionError::Validation` when a present field is invalid.
    pub fn validate(&self) -> Result<(), KtSessionError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), KtSessionError> {
    if title.trim().is_empty() {
        return Err(KtSessionError::Validation("title may not be blank".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(KtSessionError::Validation(format!(
            "title may not exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), KtSessionError> {
    if description.trim().is_empty() {
        return Err(KtSessionError::Validation(
            "description may not be blank".to_string(),
        ));
    }
    Ok(())
}
