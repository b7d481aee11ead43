pub mod health;
pub mod metrics;
pub mod tryon;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Build the public router: API endpoints plus the two static file trees.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    // The photo cap is enforced by the handler. The body limit only bounds the
    // whole multipart stream; overruns surface as multipart errors (400).
    let body_limit = state.max_upload_bytes.saturating_mul(2);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/tryon", post(tryon::submit_tryon))
        .nest_service("/uploads", ServeDir::new(state.storage.upload_dir()))
        .nest_service("/results", ServeDir::new(state.storage.results_dir()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer(cors_origins))
}

/// Restrict CORS to `origins`, or allow everything when none are configured.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
