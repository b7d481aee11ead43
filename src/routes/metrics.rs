use axum::extract::State;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Counters and histograms recorded by the try-on pipeline.
pub fn describe() {
    metrics::describe_counter!("tryon_requests_total", "Try-on requests received");
    metrics::describe_counter!(
        "tryon_requests_failed",
        "Try-on requests answered with an error, by kind"
    );
    metrics::describe_counter!("tryon_poll_attempts_total", "Result polls sent to the face API");
    metrics::describe_histogram!(
        "tryon_upstream_seconds",
        "Time spent waiting on the face API per request"
    );
    metrics::describe_counter!(
        "tryon_side_effect_failures_total",
        "Best-effort steps that failed, by target"
    );
}

/// GET /metrics in Prometheus text exposition format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> String {
    handle.render()
}

pub fn router(handle: Arc<PrometheusHandle>) -> Router {
    Router::new()
        .route("/metrics", get(prometheus_metrics))
        .with_state(handle)
}
