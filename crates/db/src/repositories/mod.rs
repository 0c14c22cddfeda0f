//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod attachment;
pub mod kt_session;

pub use attachment::AttachmentRepository;
pub use kt_session::KtSessionRepository;

use sea_orm::DbErr;

/// Maps the error of writing a row deleted since it was read to `None`.
pub(crate) fn unless_vanished<M>(result: Result<M, DbErr>) -> Result<Option<M>, DbErr> {
    match result {
        Ok(model) => Ok(Some(model)),
        Err(DbErr::RecordNotUpdated | DbErr::RecordNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
