//! `readmit serve`: the inference HTTP API.

pub mod error;
pub mod handlers;
pub mod input;

use std::path::Path;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use readmit_classifiers::artifacts::ArtifactPaths;
use readmit_classifiers::inference::{InferenceService, ModelState};

use crate::serve::input::ServeConfig;
use crate::util::{build_socket_addr, shutdown_signal};

/// Routes of the inference API over a shared, read-only service.
pub fn create_router(service: Arc<InferenceService>) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health))
        .with_state(service)
}

/// Load artifacts once and serve until Ctrl+C or SIGTERM. Missing artifacts
/// do not stop the server; it starts degraded instead.
pub async fn run(config: &ServeConfig) -> anyhow::Result<()> {
    let paths = ArtifactPaths::in_dir(Path::new(&config.artifact_dir));
    let service = Arc::new(InferenceService::load(&paths));
    match service.state() {
        ModelState::Ready(_) => log::info!("Models loaded from {}", config.artifact_dir),
        ModelState::NotLoaded(reason) => log::warn!(
            "Serving in degraded mode ({}): /predict will answer 503 until models are trained",
            reason
        ),
    }

    let addr = build_socket_addr(&config.host, config.port)?;
    let listener = TcpListener::bind(addr).await?;
    log::info!("Starting inference API on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Inference API shutdown complete");
    Ok(())
}
