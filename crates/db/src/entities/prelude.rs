//! Entity re-exports.

pub use super::attachments::Entity as Attachments;
pub use super::kt_sessions::Entity as KtSessions;
pub use super::users::Entity as Users;
