//! Share link routes.
//!
//! Issuing a link is owner-only. Redeeming one needs no authentication and
//! returns a read-only projection without owner identity or token.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::extractors::PathParam;
use crate::{ApiError, AppState, middleware::AuthUser};
use ktrack_core::attachment::FileKind;
use ktrack_core::sharing::{PublicAttachment, PublicKtSession, SharingService};
use ktrack_db::KtSessionRepository;
use ktrack_shared::types::KtSessionId;

/// Routes behind the auth middleware.
pub fn owner_routes() -> Router<AppState> {
    Router::new().route("/kt-sessions/get_sharing_url/{id}", get(get_sharing_url))
}

/// Routes open to anyone holding a link.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/kt-sessions/get_by_url/{token}", get(get_by_url))
}

/// Response for a share link request.
#[derive(Debug, Serialize)]
pub struct ShareUrlResponse {
    /// Relative redemption path.
    pub share_url: String,
    /// When the link stops working.
    pub expires_at: DateTime<Utc>,
}

/// Public view of a shared session.
#[derive(Debug, Serialize)]
pub struct PublicSessionResponse {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Attachments, newest first.
    pub attachments: Vec<PublicAttachmentResponse>,
}

/// Public view of an attachment.
#[derive(Debug, Serialize)]
pub struct PublicAttachmentResponse {
    /// Artifact kind.
    pub file_type: FileKind,
    /// Artifact URL.
    pub file_url: String,
    /// Summary, once processed.
    pub summary: Option<String>,
    /// Transcript, once processed.
    pub transcript: Option<String>,
}

impl From<PublicAttachment> for PublicAttachmentResponse {
    fn from(attachment: PublicAttachment) -> Self {
        Self {
            file_type: attachment.file_kind,
            file_url: attachment.file_url,
            summary: attachment.summary,
            transcript: attachment.transcript,
        }
    }
}

impl From<PublicKtSession> for PublicSessionResponse {
    fn from(session: PublicKtSession) -> Self {
        Self {
            title: session.title,
            description: session.description,
            attachments: session.attachments.into_iter().map(Into::into).collect(),
        }
    }
}

fn sharing_service(state: &AppState) -> SharingService<KtSessionRepository> {
    SharingService::new(
        Arc::new(KtSessionRepository::new((*state.db).clone())),
        Arc::clone(&state.share_tokens),
        &*state.link_base,
    )
}

/// GET /kt-sessions/get_sharing_url/{id} - Issue or reuse the session's link.
async fn get_sharing_url(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<KtSessionId>,
) -> Result<Json<ShareUrlResponse>, ApiError> {
    let link = sharing_service(&state).issue(id, auth.user_id()).await?;

    Ok(Json(ShareUrlResponse {
        share_url: link.share_url,
        expires_at: link.expires_at,
    }))
}

/// GET /kt-sessions/get_by_url/{token}
async fn get_by_url(
    State(state): State<AppState>,
    PathParam(token): PathParam<String>,
) -> Result<Json<PublicSessionResponse>, ApiError> {
    let session = sharing_service(&state).redeem(&token).await?;
    Ok(Json(session.into()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::testing::TestApp;

    #[tokio::test]
    async fn test_share_and_redeem_without_auth() {
        let app = TestApp::new().await;
        let (_, token) = app.user("owner@example.com").await;
        let id = app.create_session(&token, "Deploys").await;
        app.post(
            "/attachments",
            &token,
            json!({ "session_id": id, "file_type": "audio", "file_url": "https://cdn.example.com/a.mp3" }),
        )
        .await;

        let (status, link) = app
            .get(&format!("/kt-sessions/get_sharing_url/{id}"), Some(&token))
            .await;
        assert_eq!(status, StatusCode::OK);
        let share_url = link["share_url"].as_str().unwrap().to_string();
        assert!(share_url.starts_with("/kt-sessions/get_by_url/"));
        assert!(link["expires_at"].is_string());

        let (status, public) = app.get(&share_url, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(public["title"], "Deploys");
        assert_eq!(public["description"], "Deploys handover");
        assert_eq!(public["attachments"][0]["file_type"], "audio");
        assert!(public["attachments"][0]["summary"].is_null());
        assert!(public.get("created_by").is_none());
        assert!(public.get("share_token").is_none());
        assert!(public.get("id").is_none());
    }

    #[tokio::test]
    async fn test_second_request_reuses_link_and_records_token() {
        let app = TestApp::new().await;
        let (_, token) = app.user("owner@example.com").await;
        let id = app.create_session(&token, "Deploys").await;
        let uri = format!("/kt-sessions/get_sharing_url/{id}");

        let (_, first) = app.get(&uri, Some(&token)).await;
        let (_, second) = app.get(&uri, Some(&token)).await;
        assert_eq!(first, second);

        let (_, session) = app.get(&format!("/kt-sessions/{id}"), Some(&token)).await;
        let recorded = session["share_token"].as_str().unwrap();
        assert!(first["share_url"].as_str().unwrap().ends_with(recorded));
    }

    #[tokio::test]
    async fn test_only_owner_gets_link() {
        let app = TestApp::new().await;
        let (_, alice) = app.user("alice@example.com").await;
        let (_, bob) = app.user("bob@example.com").await;
        let id = app.create_session(&alice, "Private").await;
        let uri = format!("/kt-sessions/get_sharing_url/{id}");

        let (status, _) = app.get(&uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app.get(&uri, Some(&bob)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_token_not_found() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/kt-sessions/get_by_url/never-issued", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invalid or expired share link");
    }

    #[tokio::test]
    async fn test_expired_link_not_found_and_new_one_differs() {
        let app = TestApp::with_share_ttl(Duration::from_millis(150)).await;
        let (_, token) = app.user("owner@example.com").await;
        let id = app.create_session(&token, "Deploys").await;
        let uri = format!("/kt-sessions/get_sharing_url/{id}");

        let (_, first) = app.get(&uri, Some(&token)).await;
        let first_url = first["share_url"].as_str().unwrap().to_string();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let (status, _) = app.get(&first_url, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, second) = app.get(&uri, Some(&token)).await;
        assert_ne!(second["share_url"], first["share_url"]);
    }

    #[tokio::test]
    async fn test_deleted_session_link_not_found() {
        let app = TestApp::new().await;
        let (_, token) = app.user("owner@example.com").await;
        let id = app.create_session(&token, "Short lived").await;
        let (_, link) = app
            .get(&format!("/kt-sessions/get_sharing_url/{id}"), Some(&token))
            .await;

        app.delete(&format!("/kt-sessions/{id}"), &token).await;

        let (status, _) = app.get(link["share_url"].as_str().unwrap(), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
