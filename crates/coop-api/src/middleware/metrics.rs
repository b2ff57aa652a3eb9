//! # Prometheus Metrics
//!
//! HTTP-level metrics recorded through the `metrics` facade:
//!
//! - `coop_http_requests_total{method, path, status}`
//! - `coop_http_request_duration_seconds{method, path}`
//!
//! The binary installs a `metrics-exporter-prometheus` recorder and mounts
//! [`router`] at `/metrics`. Without an installed recorder (tests, library
//! use) recording is a no-op.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

pub const REQUESTS_TOTAL: &str = "coop_http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "coop_http_request_duration_seconds";

/// Middleware that records request count and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    record_request(
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

fn record_request(method: String, path: String, status: u16, duration_secs: f64) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        REQUEST_DURATION_SECONDS,
        "method" => method,
        "path" => path
    )
    .record(duration_secs);
}

/// `GET /metrics` rendering the Prometheus exposition format.
pub fn router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}

/// Replace UUID path segments with `{id}` to bound label cardinality.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.len() == 36 && uuid::Uuid::try_parse(segment).is_ok() {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
