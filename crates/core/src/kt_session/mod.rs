//! Knowledge-transfer sessions.
//!
//! A session is owned by the user who created it and groups any number of
//! attachments. Only the owner may read, edit, delete, or share it.

mod error;
mod service;
mod types;

pub use error::KtSessionError;
pub use service::{KtSessionRepository, KtSessionService};
pub use types::{KtSession, KtSessionChanges, MAX_TITLE_LEN, NewKtSession, SessionRef};
