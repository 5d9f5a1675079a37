//! Operator endpoints under `/api/jobs`.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use harvester::{CycleOutcome, StatusSnapshot};
use serde::{Deserialize, Serialize};

use crate::server::app::AxumAppState;

#[derive(Debug, Deserialize)]
pub struct ManualMessageRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
pub struct ActionResponse {
    status: String,
    message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
pub struct StorageResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    storage: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    status: String,
    error: String,
}

/// Run one operator-supplied message through the pipeline.
pub async fn process_manual_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<ManualMessageRequest>,
) -> impl IntoResponse {
    if request.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                status: "error".to_string(),
                error: "Message content is required".to_string(),
            }),
        )
            .into_response();
    }

    let outcome = state
        .orchestrator
        .process_single_message(&request.message)
        .await;
    Json(outcome).into_response()
}

/// Run a full fetch-and-enrich cycle now.
pub async fn process_now_handler(Extension(state): Extension<AxumAppState>) -> Json<CycleOutcome> {
    Json(state.orchestrator.run_cycle_now().await)
}

pub async fn init_storage_handler(
    Extension(state): Extension<AxumAppState>,
) -> Json<StorageResponse> {
    let storage = state.orchestrator.initialize_storage().await;
    Json(StorageResponse {
        status: "success".to_string(),
        message: Some("Storage initialized".to_string()),
        storage,
    })
}

pub async fn storage_info_handler(
    Extension(state): Extension<AxumAppState>,
) -> Json<StorageResponse> {
    Json(StorageResponse {
        status: "success".to_string(),
        message: None,
        storage: state.orchestrator.storage_description().await,
    })
}

pub async fn reset_timestamps_handler(
    Extension(state): Extension<AxumAppState>,
) -> Json<ActionResponse> {
    state.orchestrator.reset_channel_cursors();
    Json(ActionResponse::success(
        "Channel timestamps reset, next run looks back 24 hours",
    ))
}

pub async fn reset_counters_handler(
    Extension(state): Extension<AxumAppState>,
) -> Json<ActionResponse> {
    state.orchestrator.reset_counters();
    Json(ActionResponse::success("Processing counters reset"))
}

pub async fn processing_status_handler(
    Extension(state): Extension<AxumAppState>,
) -> Json<StatusSnapshot> {
    Json(state.orchestrator.status().await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        Router,
    };
    use chrono::{Duration, Utc};
    use harvester::testing::{channel_page, ImmediatePacer, MemoryBackend, MockFeedSource, MockReasoning};
    use harvester::{EnrichmentPipeline, FeedFetcher, Orchestrator, StorageRouter};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::server::build_app;

    const POST: &str = "Hiring a senior Rust engineer, remote within EU, strong salary. Apply now.";
    const ACME: &str = r#"{"company":"Acme","role":"Senior Rust Engineer","location":"EU"}"#;

    fn app(reasoning: MockReasoning) -> (Router, Arc<MemoryBackend>) {
        let pacer = Arc::new(ImmediatePacer::new());
        let primary = Arc::new(MemoryBackend::new());
        let router = Arc::new(StorageRouter::new(primary.clone(), Arc::new(MemoryBackend::new())));
        let source = MockFeedSource::new().with_page(
            "rustjobs",
            channel_page("rustjobs", &[(POST, Some(Utc::now() - Duration::hours(1)))]),
        );
        let fetcher = FeedFetcher::new(Arc::new(source), pacer.clone(), Default::default());
        let pipeline =
            EnrichmentPipeline::new(Arc::new(reasoning), router, pacer, Default::default());
        let orchestrator = Orchestrator::new(vec!["rustjobs".to_string()], fetcher, pipeline);
        (build_app(Arc::new(orchestrator)), primary)
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(MockReasoning::new());
        let (status, json) = call(app, Method::GET, "/api/jobs/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert!(json["storage"].as_str().unwrap().starts_with("In-memory store"));
    }

    #[tokio::test]
    async fn test_manual_message_is_processed() {
        let (app, primary) = app(MockReasoning::new().with_response("YES").with_response(ACME));
        let body = serde_json::json!({ "message": POST }).to_string();

        let (status, json) = call(app, Method::POST, "/api/jobs/process-manual", Some(&body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["job_details"]["company"], "Acme");
        assert_eq!(primary.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_manual_message_is_rejected() {
        let (app, _) = app(MockReasoning::new());
        let (status, json) = call(
            app,
            Method::POST,
            "/api/jobs/process-manual",
            Some(r#"{"message":"   "}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], "error");
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_process_now_runs_cycle() {
        let (app, primary) = app(MockReasoning::new().with_response("YES").with_response(ACME));

        let (status, json) = call(app, Method::POST, "/api/jobs/process-now", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["new_messages_found"], 1);
        assert_eq!(json["saved_count"], 1);
        assert_eq!(primary.len(), 1);
    }

    #[tokio::test]
    async fn test_status_and_resets() {
        let (app, _) = app(MockReasoning::new().with_default_response("NO"));

        call(app.clone(), Method::POST, "/api/jobs/process-now", None).await;
        let (_, status) = call(app.clone(), Method::GET, "/api/jobs/processing-status", None).await;
        assert_eq!(status["total_processed"], 1);
        assert!(status["channel_cursors"]["@rustjobs"].is_string());

        let (_, reset) = call(app.clone(), Method::POST, "/api/jobs/reset-timestamps", None).await;
        assert_eq!(reset["status"], "success");
        let (_, reset) = call(app.clone(), Method::POST, "/api/jobs/reset-counters", None).await;
        assert_eq!(reset["status"], "success");

        let (_, status) = call(app, Method::GET, "/api/jobs/processing-status", None).await;
        assert_eq!(status["total_processed"], 0);
        assert!(status["channel_cursors"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_endpoints() {
        let (app, _) = app(MockReasoning::new());

        let (_, init) = call(app.clone(), Method::POST, "/api/jobs/init-storage", None).await;
        assert_eq!(init["status"], "success");
        assert_eq!(init["storage"], "In-memory store (0 jobs)");

        let (_, info) = call(app, Method::GET, "/api/jobs/storage-info", None).await;
        assert!(info.get("message").is_none());
    }
}
