use super::state::AppState;
use crate::handler::health::{health_handler, ready_handler};
use crate::handler::summarize::summarize_handler;
use axum::Router;
use axum::routing::{get, post};

/// Build the HTTP router (health, readiness, summarize).
pub fn router(state: AppState) -> Router {
    let v1_health_router = Router::new().route("/v1/health", get(health_handler));

    let stateful_router = Router::new()
        .route("/v1/health/ready", get(ready_handler))
        .route("/summarize", post(summarize_handler))
        .with_state(state);

    Router::new()
        .merge(v1_health_router)
        .merge(stateful_router)
}
