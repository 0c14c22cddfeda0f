//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration and written with the
//! schema builder so they apply to PostgreSQL and SQLite alike.

pub use sea_orm_migration::prelude::*;

mod m20260110_000001_users_and_sessions;
mod m20260110_000002_attachments;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_000001_users_and_sessions::Migration),
            Box::new(m20260110_000002_attachments::Migration),
        ]
    }
}
