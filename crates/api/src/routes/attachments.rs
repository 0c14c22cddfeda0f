//! Attachment routes.
//!
//! Attachments are reached through the caller's sessions; an attachment of
//! someone else's session answers 404. `status` is never read from request
//! bodies: only the processor moves it.

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
use serde_json::json;

use crate::extractors::{JsonBody, PathParam, QueryParams};
use crate::{ApiError, AppState, middleware::AuthUser};
use ktrack_core::attachment::{
    AttachmentFilter, AttachmentService, AttachmentStatus, AttachmentWithSession,
    CreateAttachmentInput, FileKind, UpdateAttachmentInput,
};
use ktrack_core::kt_session::SessionRef;
use ktrack_db::AttachmentRepository;
use ktrack_shared::types::{AttachmentId, KtSessionId, PageRequest, PageResponse};

/// Creates the attachment router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/attachments", get(list_attachments).post(create_attachment))
        .route(
            "/attachments/{id}",
            get(get_attachment)
                .put(replace_attachment)
                .patch(update_attachment)
                .delete(delete_attachment),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an attachment.
///
/// Transcript and summary may be sent but are ignored: they only ever come
/// from processing.
#[derive(Debug, Deserialize)]
pub struct CreateAttachmentRequest {
    /// Session to attach to.
    pub session_id: KtSessionId,
    /// One of `audio`, `video`, `pdf`, `text`.
    pub file_type: String,
    /// Absolute http(s) URL of the artifact.
    pub file_url: String,
}

/// Request body for PUT. Session, kind and URL are required.
#[derive(Debug, Deserialize)]
pub struct ReplaceAttachmentRequest {
    /// Session to move the attachment to.
    pub session_id: KtSessionId,
    /// Artifact kind.
    pub file_type: String,
    /// Artifact URL.
    pub file_url: String,
    /// Corrected transcript.
    pub transcript: Option<String>,
    /// Corrected summary.
    pub summary: Option<String>,
}

/// Request body for PATCH.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAttachmentRequest {
    /// Session to move the attachment to.
    pub session_id: Option<KtSessionId>,
    /// Artifact kind.
    pub file_type: Option<String>,
    /// Artifact URL.
    pub file_url: Option<String>,
    /// Corrected transcript.
    pub transcript: Option<String>,
    /// Corrected summary.
    pub summary: Option<String>,
}

/// Query parameters for listing attachments.
#[derive(Debug, Default, Deserialize)]
pub struct ListAttachmentsQuery {
    /// Only attachments of this session.
    pub session_id: Option<KtSessionId>,
    /// Only attachments of this kind.
    pub file_type: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Response for an attachment.
#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    /// Attachment ID.
    pub id: AttachmentId,
    /// Owning session.
    pub session: SessionRef,
    /// Artifact kind.
    pub file_type: FileKind,
    /// Artifact URL.
    pub file_url: String,
    /// Processing status.
    pub status: AttachmentStatus,
    /// Transcript, once processed.
    pub transcript: Option<String>,
    /// Summary, once processed.
    pub summary: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<AttachmentWithSession> for AttachmentResponse {
    fn from(row: AttachmentWithSession) -> Self {
        let attachment = row.attachment;
        Self {
            id: attachment.id,
            session: row.session,
            file_type: attachment.file_kind,
            file_url: attachment.file_url,
            status: attachment.status,
            transcript: attachment.transcript,
            summary: attachment.summary,
            created_at: attachment.created_at,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse an optional `file_type` query filter.
pub(crate) fn parse_file_kind(raw: Option<&str>) -> Result<Option<FileKind>, ApiError> {
    Ok(raw.map(str::parse::<FileKind>).transpose()?)
}

/// Build a page request, defaulting absent values.
pub(crate) fn page_request(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest::new(
        page.unwrap_or(defaults.page),
        per_page.unwrap_or(defaults.per_page),
    )
}

fn attachment_service(state: &AppState) -> AttachmentService<AttachmentRepository> {
    AttachmentService::new(
        Arc::new(AttachmentRepository::new((*state.db).clone())),
        state.jobs.clone(),
    )
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /attachments - Create a pending attachment and queue it for processing.
async fn create_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(payload): JsonBody<CreateAttachmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = attachment_service(&state)
        .create(CreateAttachmentInput {
            owner: auth.user_id(),
            session_id: payload.session_id,
            file_type: payload.file_type,
            file_url: payload.file_url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AttachmentResponse::from(created))))
}

/// GET /attachments
async fn list_attachments(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListAttachmentsQuery>,
) -> Result<Json<PageResponse<AttachmentResponse>>, ApiError> {
    let filter = AttachmentFilter {
        session_id: query.session_id,
        file_kind: parse_file_kind(query.file_type.as_deref())?,
    };
    let page = page_request(query.page, query.per_page);

    let attachments = attachment_service(&state)
        .list(auth.user_id(), filter, page)
        .await?;

    Ok(Json(attachments.map(AttachmentResponse::from)))
}

/// GET /attachments/{id}
async fn get_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<AttachmentId>,
) -> Result<Json<AttachmentResponse>, ApiError> {
    let attachment = attachment_service(&state).get(id, auth.user_id()).await?;
    Ok(Json(attachment.into()))
}

/// PUT /attachments/{id}
async fn replace_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<AttachmentId>,
    JsonBody(payload): JsonBody<ReplaceAttachmentRequest>,
) -> Result<Json<AttachmentResponse>, ApiError> {
    let input = UpdateAttachmentInput {
        session_id: Some(payload.session_id),
        file_type: Some(payload.file_type),
        file_url: Some(payload.file_url),
        transcript: payload.transcript,
        summary: payload.summary,
    };
    let attachment = attachment_service(&state)
        .update(id, auth.user_id(), input)
        .await?;
    Ok(Json(attachment.into()))
}

/// PATCH /attachments/{id}
async fn update_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<AttachmentId>,
    JsonBody(payload): JsonBody<UpdateAttachmentRequest>,
) -> Result<Json<AttachmentResponse>, ApiError> {
    let input = UpdateAttachmentInput {
        session_id: payload.session_id,
        file_type: payload.file_type,
        file_url: payload.file_url,
        transcript: payload.transcript,
        summary: payload.summary,
    };
    let attachment = attachment_service(&state)
        .update(id, auth.user_id(), input)
        .await?;
    Ok(Json(attachment.into()))
}

/// DELETE /attachments/{id}
async fn delete_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<AttachmentId>,
) -> Result<impl IntoResponse, ApiError> {
    attachment_service(&state).delete(id, auth.user_id()).await?;
    Ok(Json(json!({ "message": "Attachment deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktrack_core::processing::JobOutcome;
    use rstest::rstest;

    use crate::testing::TestApp;

    const PDF_URL: &str = "https://cdn.example.com/runbook.pdf";

    async fn create(app: &TestApp, token: &str, session_id: i64) -> serde_json::Value {
        let (status, body) = app
            .post(
                "/attachments",
                token,
                json!({ "session_id": session_id, "file_type": "pdf", "file_url": PDF_URL }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    #[test]
    fn test_page_request_defaults() {
        assert_eq!(page_request(None, None), PageRequest::new(1, 10));
        assert_eq!(page_request(Some(3), None), PageRequest::new(3, 10));
    }

    #[tokio::test]
    async fn test_create_returns_pending_and_enqueues_one_job() {
        let mut app = TestApp::new().await;
        let (_, token) = app.user("owner@example.com").await;
        let session_id = app.create_session(&token, "Runbooks").await;

        let (status, body) = app
            .post(
                "/attachments",
                &token,
                json!({
                    "session_id": session_id,
                    "file_type": "pdf",
                    "file_url": PDF_URL,
                    "transcript": "client supplied",
                    "summary": "client supplied",
                }),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "pending");
        assert_eq!(body["file_type"], "pdf");
        assert_eq!(body["session"]["id"], session_id);
        assert_eq!(body["session"]["title"], "Runbooks");
        assert!(body["transcript"].is_null());
        assert!(body["summary"].is_null());

        let job = app.jobs.try_recv().expect("one job queued");
        assert_eq!(i64::from(job.attachment_id.into_inner()), body["id"].as_i64().unwrap());
        assert_eq!(job.attempt, 1);
        assert!(app.jobs.try_recv().is_none());
    }

    #[rstest]
    #[case(json!({ "file_type": "invalid", "file_url": PDF_URL }))]
    #[case(json!({ "file_type": "pdf", "file_url": "not a url" }))]
    #[case(json!({ "file_type": "pdf", "file_url": "ftp://cdn.example.com/a.pdf" }))]
    #[case(json!({ "file_url": PDF_URL }))]
    #[tokio::test]
    async fn test_create_rejects_invalid_input(#[case] body: serde_json::Value) {
        let mut body = body;
        let mut app = TestApp::new().await;
        let (_, token) = app.user("owner@example.com").await;
        let session_id = app.create_session(&token, "Runbooks").await;
        body["session_id"] = json!(session_id);

        let (status, error) = app.post("/attachments", &token, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "validation_error");
        assert!(app.jobs.try_recv().is_none());
        let (_, list) = app.get("/attachments", Some(&token)).await;
        assert_eq!(list["meta"]["total"], 0);
    }

    #[tokio::test]
    async fn test_invalid_file_type_message() {
        let app = TestApp::new().await;
        let (_, token) = app.user("owner@example.com").await;
        let session_id = app.create_session(&token, "Runbooks").await;

        let (_, body) = app
            .post(
                "/attachments",
                &token,
                json!({ "session_id": session_id, "file_type": "invalid", "file_url": PDF_URL }),
            )
            .await;

        assert_eq!(
            body["message"],
            "Invalid file_type. Must be one of: audio, video, pdf, text"
        );
    }

    #[tokio::test]
    async fn test_create_on_foreign_session_not_found() {
        let app = TestApp::new().await;
        let (_, alice) = app.user("alice@example.com").await;
        let (_, bob) = app.user("bob@example.com").await;
        let session_id = app.create_session(&alice, "Alice only").await;

        let (status, body) = app
            .post(
                "/attachments",
                &bob,
                json!({ "session_id": session_id, "file_type": "pdf", "file_url": PDF_URL }),
            )
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Session not found");
    }

    #[tokio::test]
    async fn test_foreign_attachment_not_found() {
        let app = TestApp::new().await;
        let (_, alice) = app.user("alice@example.com").await;
        let (_, bob) = app.user("bob@example.com").await;
        let session_id = app.create_session(&alice, "Alice only").await;
        let created = create(&app, &alice, session_id).await;
        let uri = format!("/attachments/{}", created["id"]);

        let (status, _) = app.get(&uri, Some(&bob)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.delete(&uri, &bob).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, list) = app.get("/attachments", Some(&bob)).await;
        assert_eq!(list["meta"]["total"], 0);
    }

    #[tokio::test]
    async fn test_status_is_not_client_settable() {
        let app = TestApp::new().await;
        let (_, token) = app.user("owner@example.com").await;
        let session_id = app.create_session(&token, "Runbooks").await;
        let created = create(&app, &token, session_id).await;
        let uri = format!("/attachments/{}", created["id"]);

        let (status, body) = app
            .patch(&uri, &token, json!({ "status": "done", "file_type": "text" }))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending");
        assert_eq!(body["file_type"], "text");
    }

    #[tokio::test]
    async fn test_outputs_editable_only_once_done() {
        let mut app = TestApp::new().await;
        let (_, token) = app.user("owner@example.com").await;
        let session_id = app.create_session(&token, "Runbooks").await;
        let created = create(&app, &token, session_id).await;
        let uri = format!("/attachments/{}", created["id"]);

        let (status, _) = app
            .patch(&uri, &token, json!({ "summary": "too early" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let outcomes = app.process_queued().await;
        assert!(matches!(outcomes.as_slice(), [JobOutcome::Completed(_)]));

        let (status, body) = app
            .patch(&uri, &token, json!({ "summary": "Corrected summary" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "done");
        assert_eq!(body["summary"], "Corrected summary");
        assert!(body["transcript"].is_string());
    }

    #[tokio::test]
    async fn test_processing_completes_attachment() {
        let mut app = TestApp::new().await;
        let (_, token) = app.user("owner@example.com").await;
        let session_id = app.create_session(&token, "Runbooks").await;
        let created = create(&app, &token, session_id).await;

        let outcomes = app.process_queued().await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].to_string(),
            format!("Attachment {} processed successfully", created["id"])
        );

        let (_, body) = app
            .get(&format!("/attachments/{}", created["id"]), Some(&token))
            .await;
        assert_eq!(body["status"], "done");
        assert!(body["transcript"].is_string());
        assert!(body["summary"].is_string());
    }

    #[tokio::test]
    async fn test_job_for_deleted_attachment_reports_not_found() {
        let mut app = TestApp::new().await;
        let (_, token) = app.user("owner@example.com").await;
        let session_id = app.create_session(&token, "Runbooks").await;
        let created = create(&app, &token, session_id).await;

        let (status, body) = app
            .delete(&format!("/attachments/{}", created["id"]), &token)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Attachment deleted successfully");

        let outcomes = app.process_queued().await;
        assert!(matches!(outcomes.as_slice(), [JobOutcome::NotFound(_)]));
    }

    #[tokio::test]
    async fn test_put_moves_to_another_owned_session() {
        let app = TestApp::new().await;
        let (_, alice) = app.user("alice@example.com").await;
        let (_, bob) = app.user("bob@example.com").await;
        let first = app.create_session(&alice, "First").await;
        let second = app.create_session(&alice, "Second").await;
        let bobs = app.create_session(&bob, "Bob's").await;
        let created = create(&app, &alice, first).await;
        let uri = format!("/attachments/{}", created["id"]);

        let (status, body) = app
            .put(
                &uri,
                &alice,
                json!({ "session_id": second, "file_type": "video", "file_url": "https://cdn.example.com/demo.mp4" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["title"], "Second");
        assert_eq!(body["file_type"], "video");

        let (status, _) = app
            .put(
                &uri,
                &alice,
                json!({ "session_id": bobs, "file_type": "video", "file_url": PDF_URL }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.put(&uri, &alice, json!({ "file_type": "video" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let app = TestApp::new().await;
        let (_, token) = app.user("owner@example.com").await;
        let first = app.create_session(&token, "First").await;
        let second = app.create_session(&token, "Second").await;
        create(&app, &token, first).await;
        create(&app, &token, second).await;
        app.post(
            "/attachments",
            &token,
            json!({ "session_id": second, "file_type": "audio", "file_url": "https://cdn.example.com/a.mp3" }),
        )
        .await;

        let (_, all) = app.get("/attachments", Some(&token)).await;
        assert_eq!(all["meta"]["total"], 3);
        assert_eq!(all["meta"]["page"], 1);
        assert_eq!(all["meta"]["per_page"], 10);

        let (_, by_session) = app
            .get(&format!("/attachments?session_id={second}"), Some(&token))
            .await;
        assert_eq!(by_session["meta"]["total"], 2);

        let (_, by_kind) = app
            .get(&format!("/attachments?session_id={second}&file_type=pdf"), Some(&token))
            .await;
        assert_eq!(by_kind["meta"]["total"], 1);

        let (status, _) = app.get("/attachments?page=0", Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = app.get("/attachments?page=abc", Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
