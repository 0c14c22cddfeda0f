//! `SeaORM` entity definitions.
//!
//! Users are provisioned by the login service; ktrack only references them.

#![allow(missing_docs)]

pub mod prelude;

pub mod attachments;
pub mod kt_sessions;
pub mod sea_orm_active_enums;
pub mod users;
