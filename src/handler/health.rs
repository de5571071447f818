use crate::app::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::{error, info};

/// Handler for GET /v1/health
pub async fn health_handler() -> &'static str {
    info!("Health check requested");
    "Healthy"
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl HealthReport {
    fn ready() -> Self {
        Self {
            status: "ready",
            detail: None,
        }
    }

    fn degraded(detail: impl Into<String>) -> Self {
        Self {
            status: "degraded",
            detail: Some(detail.into()),
        }
    }
}

/// Handler for GET /v1/health/ready: the inference server must be live and ready.
pub async fn ready_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthReport>, (StatusCode, Json<HealthReport>)> {
    if let Err(e) = state.inference.health_check().await {
        error!(error = %e, "inference readiness check failed");
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthReport::degraded(format!("inference: {e}"))),
        ));
    }

    Ok(Json(HealthReport::ready()))
}
