//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for KT sessions, attachments, and share links
//! - Authentication middleware
//! - Request extractors that render rejections as JSON errors
//! - The JSON error response type

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use axum::Router;
use ktrack_core::processing::JobQueue;
use ktrack_core::sharing::ShareTokenCache;
use ktrack_shared::JwtService;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for bearer token validation.
    pub jwt_service: Arc<JwtService>,
    /// Live share tokens.
    pub share_tokens: Arc<ShareTokenCache>,
    /// Handle to the attachment processing queue.
    pub jobs: JobQueue,
    /// Path prefix that share tokens are appended to.
    pub link_base: Arc<str>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
