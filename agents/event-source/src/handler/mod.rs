//! HTTP handler for the Event Source Agent
//!
//! - POST /api/v1/events - run one envelope through the save pipeline
//! - GET /api/v1/events/schema - JSON Schema of the accepted envelope
//! - GET /health - liveness
//! - GET /metrics - Prometheus text exposition

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::contracts::*;
use crate::error::{EventSourceError, ValidationError};
use crate::pipeline::EventSource;
use crate::telemetry::EventSourceMetricsRegistry;

/// Application state
pub struct AppState {
    pub source: EventSource,
    pub metrics: EventSourceMetricsRegistry,
}

impl AppState {
    pub fn new(source: EventSource, metrics: EventSourceMetricsRegistry) -> Self {
        Self { source, metrics }
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/v1/events", post(save_event))
        .route("/api/v1/events/schema", get(event_schema))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP status for a pipeline error
pub fn status_for(err: &EventSourceError) -> StatusCode {
    match err {
        EventSourceError::Validation(_) => StatusCode::BAD_REQUEST,
        EventSourceError::NotFound { .. } => StatusCode::NOT_FOUND,
        EventSourceError::Remote { .. } | EventSourceError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: SERVICE_VERSION.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode_text() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Save an inbound event.
///
/// The body is read raw so that unparseable JSON still gets a
/// `ServiceResponse` rather than the framework's rejection.
async fn save_event(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, Json<ServiceResponse>) {
    let span = tracing::info_span!("save_event", request_id = %Uuid::new_v4());

    let result = async {
        match serde_json::from_slice::<Value>(&body) {
            Ok(message) => state.source.submit(&message).await,
            Err(e) => {
                let err = EventSourceError::from(ValidationError::MalformedJson(e.to_string()));
                state.source.metrics().record_event("unknown", err.kind());
                tracing::warn!(error = %err, "Rejected unparseable event body");
                Err(err)
            }
        }
    }
    .instrument(span)
    .await;

    match result {
        Ok(()) => (StatusCode::OK, Json(ServiceResponse::success())),
        Err(e) => (status_for(&e), Json(ServiceResponse::from(&e))),
    }
}

async fn event_schema(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.source.schema().to_json_schema())
}
