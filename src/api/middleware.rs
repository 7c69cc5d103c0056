//! API Middleware
//!
//! Request logging. Authentication is intentionally absent; this service
//! runs behind an internal gateway.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};

/// Log method, path, status and latency for every request.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );

    response
}
