//! KT session routes. Every route here is owner-scoped: sessions of other
//! users answer 404.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachments::{AttachmentResponse, page_request, parse_file_kind};
use crate::extractors::{JsonBody, PathParam, QueryParams};
use crate::{ApiError, AppState, middleware::AuthUser};
use ktrack_core::attachment::{AttachmentFilter, AttachmentService};
use ktrack_core::kt_session::{
    KtSession, KtSessionChanges, KtSessionService, NewKtSession, SessionRef,
};
use ktrack_db::{AttachmentRepository, KtSessionRepository};
use ktrack_shared::types::{KtSessionId, PageResponse, UserId};

/// Creates the session router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/kt-sessions", get(list_sessions).post(create_session))
        .route(
            "/kt-sessions/{id}",
            get(get_session)
                .put(replace_session)
                .patch(update_session)
                .delete(delete_session),
        )
        .route("/kt-sessions/{id}/attachments", get(list_session_attachments))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a session.
#[derive(Debug, Deserialize)]
pub struct CreateKtSessionRequest {
    /// Session title.
    pub title: String,
    /// Session description.
    pub description: String,
}

/// Request body for PUT. Both fields are required.
#[derive(Debug, Deserialize)]
pub struct ReplaceKtSessionRequest {
    /// New title.
    pub title: String,
    /// New description.
    pub description: String,
}

/// Request body for PATCH.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateKtSessionRequest {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Query parameters for a session's attachment list.
#[derive(Debug, Default, Deserialize)]
pub struct SessionAttachmentsQuery {
    /// Only attachments of this kind.
    pub file_type: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Session as seen by its owner.
#[derive(Debug, Serialize)]
pub struct KtSessionResponse {
    /// Session ID.
    pub id: KtSessionId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Owning user.
    pub created_by: UserId,
    /// Most recently minted share token.
    pub share_token: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<KtSession> for KtSessionResponse {
    fn from(session: KtSession) -> Self {
        Self {
            id: session.id,
            title: session.title,
            description: session.description,
            created_by: session.created_by,
            share_token: session.share_token,
            created_at: session.created_at,
        }
    }
}

/// One page of a session's attachments, headed by the session.
#[derive(Debug, Serialize)]
pub struct SessionAttachmentsResponse {
    /// The session the attachments belong to.
    pub session: SessionRef,
    /// The attachments and pagination metadata.
    #[serde(flatten)]
    pub page: PageResponse<AttachmentResponse>,
}

fn session_service(state: &AppState) -> KtSessionService<KtSessionRepository> {
    KtSessionService::new(Arc::new(KtSessionRepository::new((*state.db).clone())))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /kt-sessions - The caller's sessions, newest first.
async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<KtSessionResponse>>, ApiError> {
    let sessions = session_service(&state).list(auth.user_id()).await?;
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

/// POST /kt-sessions
async fn create_session(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(payload): JsonBody<CreateKtSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session_service(&state)
        .create(NewKtSession {
            title: payload.title,
            description: payload.description,
            created_by: auth.user_id(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(KtSessionResponse::from(session))))
}

/// GET /kt-sessions/{id}
async fn get_session(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<KtSessionId>,
) -> Result<Json<KtSessionResponse>, ApiError> {
    let session = session_service(&state).get(id, auth.user_id()).await?;
    Ok(Json(session.into()))
}

/// PUT /kt-sessions/{id}
async fn replace_session(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<KtSessionId>,
    JsonBody(payload): JsonBody<ReplaceKtSessionRequest>,
) -> Result<Json<KtSessionResponse>, ApiError> {
    let changes = KtSessionChanges {
        title: Some(payload.title),
        description: Some(payload.description),
    };
    let session = session_service(&state)
        .update(id, auth.user_id(), changes)
        .await?;
    Ok(Json(session.into()))
}

/// PATCH /kt-sessions/{id}
async fn update_session(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<KtSessionId>,
    JsonBody(payload): JsonBody<UpdateKtSessionRequest>,
) -> Result<Json<KtSessionResponse>, ApiError> {
    let changes = KtSessionChanges {
        title: payload.title,
        description: payload.description,
    };
    let session = session_service(&state)
        .update(id, auth.user_id(), changes)
        .await?;
    Ok(Json(session.into()))
}

/// DELETE /kt-sessions/{id} - Attachments are removed with the session.
async fn delete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<KtSessionId>,
) -> Result<StatusCode, ApiError> {
    session_service(&state).delete(id, auth.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /kt-sessions/{id}/attachments
async fn list_session_attachments(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<KtSessionId>,
    QueryParams(query): QueryParams<SessionAttachmentsQuery>,
) -> Result<Json<SessionAttachmentsResponse>, ApiError> {
    let session = session_service(&state).get(id, auth.user_id()).await?;

    let filter = AttachmentFilter {
        session_id: Some(id),
        file_kind: parse_file_kind(query.file_type.as_deref())?,
    };
    let page = page_request(query.page, query.per_page);

    let service = AttachmentService::new(
        Arc::new(AttachmentRepository::new((*state.db).clone())),
        state.jobs.clone(),
    );
    let attachments = service.list(auth.user_id(), filter, page).await?;

    Ok(Json(SessionAttachmentsResponse {
        session: session.to_ref(),
        page: attachments.map(AttachmentResponse::from),
    }))
}
