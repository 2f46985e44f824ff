use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Logs one line per request, at a level chosen by the response class.
/// Health probes are logged at debug so they don't drown out traffic.
pub async fn request_logger(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        tracing::error!(%method, %path, status, duration_ms, "request failed");
    } else if response.status().is_client_error() {
        tracing::warn!(%method, %path, status, duration_ms, "request rejected");
    } else if path.ends_with("/health") {
        tracing::debug!(%method, %path, status, duration_ms, "request completed");
    } else {
        tracing::info!(%method, %path, status, duration_ms, "request completed");
    }

    response
}
