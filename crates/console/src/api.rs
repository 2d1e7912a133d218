//! HTTP API over the control plane

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use console_lib::{
    AnalysisError, AnalysisResult, ControlPlane, LifecycleError, LifecycleReport, ServiceName,
    ServiceStatus, Settings, StackState, StatusSnapshot, SAMPLE_NARRATIVES,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub plane: ControlPlane,
    pub require_backend: bool,
}

impl AppState {
    pub fn new(plane: ControlPlane, require_backend: bool) -> Self {
        Self {
            plane,
            require_backend,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub narrative: String,
}

#[derive(Debug, Serialize)]
pub struct StackResponse {
    pub state: StackState,
    pub snapshot: StatusSnapshot,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    #[serde(flatten)]
    pub settings: Settings,
    pub require_backend: bool,
}

/// Failures mapped onto HTTP status codes
#[derive(Debug)]
pub enum ApiError {
    Lifecycle(LifecycleError),
    Analysis(AnalysisError),
    BackendNotRunning(ServiceStatus),
    Internal(String),
}

impl From<LifecycleError> for ApiError {
    fn from(e: LifecycleError) -> Self {
        ApiError::Lifecycle(e)
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        ApiError::Analysis(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Lifecycle(e) => (StatusCode::CONFLICT, e.kind(), e.to_string()),
            ApiError::Analysis(e) => {
                let status = match &e {
                    AnalysisError::Validation(_) => StatusCode::BAD_REQUEST,
                    AnalysisError::Transport { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    AnalysisError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    AnalysisError::Remote { .. } | AnalysisError::Malformed { .. } => {
                        StatusCode::BAD_GATEWAY
                    }
                };
                (status, e.kind(), e.to_string())
            }
            ApiError::BackendNotRunning(status) => (
                StatusCode::CONFLICT,
                "backend_not_running",
                format!(
                    "Backend service is not running (last status: {}). Please deploy services first.",
                    status
                ),
            ),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", message),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Liveness of the daemon itself
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<Response, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(format!("failed to encode metrics: {}", e)))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response())
}

async fn current_status(State(state): State<Arc<AppState>>) -> Json<StatusSnapshot> {
    Json(state.plane.cache.current().await)
}

async fn refresh_status(State(state): State<Arc<AppState>>) -> Json<StatusSnapshot> {
    Json(state.plane.cache.refresh().await)
}

async fn stack(State(state): State<Arc<AppState>>) -> Json<StackResponse> {
    Json(StackResponse {
        state: state.plane.orchestrator.state().await,
        snapshot: state.plane.cache.current().await,
    })
}

async fn deploy(State(state): State<Arc<AppState>>) -> Result<Json<LifecycleReport>, ApiError> {
    let report = state.plane.orchestrator.deploy().await?;
    Ok(Json(report))
}

async fn stop(State(state): State<Arc<AppState>>) -> Result<Json<LifecycleReport>, ApiError> {
    let report = state.plane.orchestrator.stop().await?;
    Ok(Json(report))
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    if state.require_backend && !request.narrative.trim().is_empty() {
        let backend = state.plane.cache.current().await.get(ServiceName::Backend);
        if backend != ServiceStatus::Running {
            return Err(ApiError::BackendNotRunning(backend));
        }
    }

    let result = state.plane.analysis.analyze(&request.narrative).await?;
    Ok(Json(result))
}

async fn samples() -> Json<Vec<&'static str>> {
    Json(SAMPLE_NARRATIVES.to_vec())
}

async fn settings(State(state): State<Arc<AppState>>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        settings: state.plane.settings.redacted(),
        require_backend: state.require_backend,
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/api/status", get(current_status))
        .route("/api/status/refresh", post(refresh_status))
        .route("/api/stack", get(stack))
        .route("/api/stack/deploy", post(deploy))
        .route("/api/stack/stop", post(stop))
        .route("/api/analyze", post(analyze))
        .route("/api/samples", get(samples))
        .route("/api/settings", get(settings))
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting console API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| {
            error!(error = %e, "Console API server failed");
            e
        })?;

    Ok(())
}
