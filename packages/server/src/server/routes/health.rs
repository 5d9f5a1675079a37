use axum::{extract::Extension, Json};
use harvester::orchestrator::SERVICE_NAME;
use serde::Serialize;

use crate::server::app::AxumAppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    service: String,
    storage: String,
}

/// Health check endpoint
///
/// Always 200; storage problems show up in the `storage` description.
pub async fn health_handler(Extension(state): Extension<AxumAppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        storage: state.orchestrator.storage_description().await,
    })
}
