// SPDX-License-Identifier: Apache-2.0

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{info, Instrument};

use crate::AppState;

pub(crate) fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

pub(crate) fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

/// Collapse task-id paths to their route template so metric labels stay
/// low-cardinality.
fn route_label(path: &str) -> String {
    match path.strip_prefix("/v1/tasks/") {
        Some(rest) if !rest.is_empty() && rest != "reorder" => "/v1/tasks/:id".to_string(),
        _ => path.to_string(),
    }
}

pub(crate) async fn request_tracing_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let route = route_label(request.uri().path());
    let request_id = propagated_request_id(request.headers(), &state);
    // Make the id visible to handlers so error payloads carry the same one.
    if let Ok(value) = axum::http::HeaderValue::from_str(&request_id) {
        request.headers_mut().insert("x-request-id", value);
    }
    let started = Instant::now();

    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %method,
        route = %route,
    );

    let response = next.run(request).instrument(span).await;
    let status = response.status();
    state.metrics.observe_request(&route, status.as_u16(), started.elapsed());
    info!(
        request_id = %request_id,
        method = %method,
        route = %route,
        status = status.as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request finish"
    );
    super::response_contract::with_request_id(response, &request_id)
}
