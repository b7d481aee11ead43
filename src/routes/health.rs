use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// GET /health — liveness probe.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}
