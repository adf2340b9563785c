use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use boa_core::RequestSource;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

#[derive(Clone)]
pub struct HealthState {
    source: Arc<dyn RequestSource>,
    source_mode: &'static str,
}

impl HealthState {
    pub fn new(source: Arc<dyn RequestSource>, source_mode: &'static str) -> Self {
        Self { source, source_mode }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub backend: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let backend = backend_check(&state).await;
    let ready = backend.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("boa-server running with {} request source", state.source_mode),
        },
        backend,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn backend_check(state: &HealthState) -> HealthCheck {
    match state.source.probe().await {
        Ok(()) => HealthCheck { status: "ready", detail: "backend reachable".to_string() },
        Err(error) => {
            warn!(
                event_name = "system.health.backend_unreachable",
                error_class = error.error_class(),
                error = %error,
                "backend probe failed"
            );
            HealthCheck { status: "degraded", detail: format!("backend probe failed: {error}") }
        }
    }
}
