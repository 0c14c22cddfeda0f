//! Shared setup for repository integration tests.

#![allow(dead_code)]

use ktrack_db::entities::users;
use ktrack_db::migrate;
use ktrack_shared::types::UserId;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set};

/// Opens a fresh migrated in-memory SQLite database.
///
/// A single pooled connection keeps every query on the same in-memory file.
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    migrate(&db).await.expect("Failed to run migrations");
    db
}

/// Inserts a user row.
pub async fn insert_user(
    db: &DatabaseConnection,
    email: &str,
    name: &str,
) -> Result<users::Model, DbErr> {
    users::ActiveModel {
        email: Set(email.to_string()),
        name: Set(name.to_string()),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Creates a user and returns its id.
pub async fn create_user(db: &DatabaseConnection, email: &str) -> UserId {
    let user = insert_user(db, email, "Test User")
        .await
        .expect("Failed to create user");
    UserId::from_raw(user.id)
}
