//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use harvester::Orchestrator;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::routes::{
    health_handler, init_storage_handler, process_manual_handler, process_now_handler,
    processing_status_handler, reset_counters_handler, reset_timestamps_handler,
    storage_info_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the Axum application router
pub fn build_app(orchestrator: Arc<Orchestrator>) -> Router {
    let app_state = AxumAppState { orchestrator };

    let jobs = Router::new()
        .route("/process-manual", post(process_manual_handler))
        .route("/process-now", post(process_now_handler))
        .route("/init-storage", post(init_storage_handler))
        .route("/storage-info", get(storage_info_handler))
        .route("/reset-timestamps", post(reset_timestamps_handler))
        .route("/reset-counters", post(reset_counters_handler))
        .route("/processing-status", get(processing_status_handler))
        .route("/health", get(health_handler));

    Router::new()
        .nest("/api/jobs", jobs)
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
