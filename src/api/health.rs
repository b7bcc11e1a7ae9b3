use axum::{response::Json, routing::get, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
}

/// GET /health - liveness probe
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health))
}
