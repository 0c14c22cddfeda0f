//! Expiring public share links for KT sessions.
//!
//! The owner of a session asks for a share link; anyone holding the link can
//! read a public projection of the session until the token expires. Tokens
//! live only in an in-process TTL cache and are lost on restart.
//!
//! Each session has at most one live token. Issuing again while it is live
//! returns the same token, and concurrent issuers for one session are
//! coalesced onto a single mint.

mod cache;
mod error;
mod service;
mod types;

pub use cache::ShareTokenCache;
pub use error::SharingError;
pub use service::SharingService;
pub use types::{PublicAttachment, PublicKtSession, ShareGrant, ShareLink};
