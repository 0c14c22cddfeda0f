//! Core business logic for ktrack.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached through the repository traits defined here and
//! implemented by the db crate.
//!
//! # Modules
//!
//! - `kt_session` - Knowledge-transfer sessions owned by a user
//! - `attachment` - Attachments and their processing lifecycle
//! - `processing` - Background attachment processor and its worker pool
//! - `sharing` - Expiring public share links

pub mod attachment;
pub mod kt_session;
pub mod processing;
pub mod sharing;

#[cfg(test)]
pub(crate) mod testing;
