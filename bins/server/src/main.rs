//! ktrack API server
//!
//! Main entry point for the KT session tracker. Serves the HTTP API and runs
//! the attachment processor in the same process.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ktrack_api::{AppState, create_router};
use ktrack_core::processing::{AttachmentProcessor, JobQueue, SimulatedTranscriber, spawn_workers};
use ktrack_core::sharing::ShareTokenCache;
use ktrack_db::{AttachmentRepository, connect, migrate};
use ktrack_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ktrack=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect(&config.database).await?;
    info!("Connected to database");
    if config.database.auto_migrate {
        migrate(&db).await?;
    }

    let jwt_service = JwtService::new(&config.jwt.secret);

    let share_tokens = ShareTokenCache::new(config.sharing.token_ttl(), config.sharing.max_tokens);
    info!(
        ttl_secs = config.sharing.token_ttl_secs,
        max_tokens = config.sharing.max_tokens,
        "Share token cache configured"
    );

    // Attachment processor
    let (jobs, receiver) = JobQueue::new();
    let processor = Arc::new(AttachmentProcessor::new(
        Arc::new(AttachmentRepository::new(db.clone())),
        SimulatedTranscriber::new(config.processor.work_duration()),
    ));
    let dispatcher = spawn_workers(processor, receiver, config.processor.workers);

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        share_tokens: Arc::new(share_tokens),
        jobs,
        link_base: Arc::from(config.sharing.link_base.as_str()),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last queue handle; wait for in-flight jobs.
    info!("Server stopped, draining attachment processor");
    dispatcher.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
