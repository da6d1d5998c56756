//! HTTP API: form page, JSON prediction endpoints, health checks and metrics

use crate::form::PageView;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use predict_lib::predictor::{parse_raw_values, RawValues};
use predict_lib::{AdapterError, ComponentStatus, FeatureSchema, PredictionResult};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// JSON prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: RawValues,
}

/// JSON prediction response: the result plus its display headline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub headline: String,
    #[serde(flatten)]
    pub result: PredictionResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub app: String,
    pub title: String,
    pub model_ready: bool,
    pub schema: FeatureSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

/// Adapter errors mapped onto HTTP statuses
pub struct ApiError(pub AdapterError);

pub fn status_for(err: &AdapterError) -> StatusCode {
    if err.is_validation() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else if err.is_artifact() || matches!(err, AdapterError::SchemaMismatch(_)) {
        // Setup problems: nothing can be predicted until an operator fixes them
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.0.to_string(),
            remediation: self.0.remediation(),
        };
        (status_for(&self.0), Json(body)).into_response()
    }
}

async fn index(State(state): State<Arc<AppState>>) -> Response {
    render(&state, StatusCode::OK, &PageView::initial(&state))
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let page = PageView::submitted(&state, &fields);
    let raw = match parse_raw_values(fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))) {
        Ok(raw) => raw,
        Err(err) => {
            // Unparseable text never reaches the adapter
            state.metrics.record_failure(&err);
            state.logger.log_rejection(&err);
            return render(&state, status_for(&err), &page.with_error(&err));
        }
    };

    match state.predict(&raw).await {
        Ok(result) => render(&state, StatusCode::OK, &page.with_result(&state, &result)),
        Err(err) => render(&state, status_for(&err), &page.with_error(&err)),
    }
}

fn render(state: &AppState, status: StatusCode, view: &PageView) -> Response {
    match state.renderer.render(view) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %format!("{:#}", e), "Page rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "page rendering failed").into_response()
        }
    }
}

async fn schema(State(state): State<Arc<AppState>>) -> Json<SchemaResponse> {
    Json(SchemaResponse {
        app: state.app_name.clone(),
        title: state.preset.title.clone(),
        model_ready: state.adapter().is_ok(),
        schema: state.schema().clone(),
    })
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let result = state.predict(&request.features).await.map_err(ApiError)?;
    Ok(Json(PredictResponse {
        headline: state.formatter.headline(&result),
        result,
    }))
}

fn probe_status(passing: bool) -> StatusCode {
    if passing {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Liveness: 503 only when a component is unhealthy; degraded still serves
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;
    (
        probe_status(health.status != ComponentStatus::Unhealthy),
        Json(health),
    )
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;
    (probe_status(readiness.ready), Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/api/v1/schema", get(schema))
        .route("/api/v1/predict", post(predict))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: String, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
