//! Router harness for route tests: in-memory SQLite, real middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::AUTHORIZATION, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use ktrack_core::processing::{
    AttachmentProcessor, JobOutcome, JobQueue, JobReceiver, SimulatedTranscriber,
};
use ktrack_core::sharing::ShareTokenCache;
use ktrack_db::AttachmentRepository;
use ktrack_db::entities::users;
use ktrack_shared::config::DatabaseConfig;
use ktrack_shared::types::UserId;
use ktrack_shared::JwtService;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;

use crate::{AppState, create_router};

pub(crate) struct TestApp {
    pub(crate) state: AppState,
    pub(crate) jobs: JobReceiver,
    router: Router,
}

impl TestApp {
    pub(crate) async fn new() -> Self {
        Self::with_share_ttl(Duration::from_secs(600)).await
    }

    pub(crate) async fn with_share_ttl(ttl: Duration) -> Self {
        // One connection, or every query would see its own empty database.
        let db = ktrack_db::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            auto_migrate: false,
        })
        .await
        .expect("Failed to open in-memory database");
        ktrack_db::migrate(&db).await.expect("Failed to run migrations");

        let (queue, jobs) = JobQueue::new();
        let state = AppState {
            db: Arc::new(db),
            jwt_service: Arc::new(JwtService::new("route-test-secret")),
            share_tokens: Arc::new(ShareTokenCache::new(ttl, 64)),
            jobs: queue,
            link_base: Arc::from("/kt-sessions/get_by_url"),
        };

        Self {
            router: create_router(state.clone()),
            state,
            jobs,
        }
    }

    /// Creates a user and returns its id with a valid bearer token.
    pub(crate) async fn user(&self, email: &str) -> (UserId, String) {
        let user = users::ActiveModel {
            email: Set(email.to_string()),
            name: Set("Route Tester".to_string()),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("Failed to create user");
        let id = UserId::from_raw(user.id);
        let token = self
            .state
            .jwt_service
            .generate_access_token(id, chrono::Duration::minutes(15))
            .expect("should generate token");
        (id, token)
    }

    pub(crate) async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub(crate) async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub(crate) async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub(crate) async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub(crate) async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub(crate) async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Creates a session through the API and returns its id.
    pub(crate) async fn create_session(&self, token: &str, title: &str) -> i64 {
        let (status, body) = self
            .post(
                "/kt-sessions",
                token,
                serde_json::json!({ "title": title, "description": format!("{title} handover") }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    /// Runs every queued job to completion on the caller's task.
    pub(crate) async fn process_queued(&mut self) -> Vec<JobOutcome> {
        let processor = AttachmentProcessor::new(
            Arc::new(AttachmentRepository::new((*self.state.db).clone())),
            SimulatedTranscriber::new(Duration::ZERO),
        );
        let mut outcomes = Vec::new();
        while let Some(job) = self.jobs.try_recv() {
            outcomes.push(processor.run(job).await);
        }
        outcomes
    }
}
