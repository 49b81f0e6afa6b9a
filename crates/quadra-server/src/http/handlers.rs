// SPDX-License-Identifier: Apache-2.0

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use tracing::{info, warn};

use quadra_api::{
    task_to_dto, ApiError, ApiErrorCode, ApiResponseEnvelope, BulkReorderRequest,
    CreateTaskRequest, DeleteResultDto, TaskListDto, UpdateTaskRequest,
};
use quadra_model::{Quadrant, TaskId};

use crate::http::request_tracing::propagated_request_id;
use crate::http::response_contract::{api_error_response, store_error_to_api, with_request_id};
use crate::{sha256_hex, AppState};

fn is_draining(state: &AppState) -> bool {
    !state.accepting_requests.load(Ordering::Relaxed)
}

fn draining_response(request_id: &str) -> Response {
    let err = ApiError::internal("server draining; refusing new requests")
        .with_request_id(request_id);
    let body = Json(json!({"error": err}));
    (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
}

fn envelope<T: serde::Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(ApiResponseEnvelope { data })).into_response()
}

/// Map a body-extraction failure to the wire taxonomy: an oversized body is
/// its own code, everything else is a validation failure.
fn json_rejection_to_api(rejection: &JsonRejection, request_id: &str) -> ApiError {
    let err = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(
            ApiErrorCode::PayloadTooLarge,
            "request body too large",
            json!({}),
            "req-unknown",
        )
    } else {
        ApiError::validation_failed(json!([{"field": "body", "reason": rejection.body_text()}]))
    };
    err.with_request_id(request_id)
}

fn if_none_match(headers: &HeaderMap) -> Option<String> {
    headers
        .get("if-none-match")
        .and_then(|v| v.to_str().ok())
        .map(std::string::ToString::to_string)
}

pub(crate) async fn healthz_handler() -> Response {
    envelope(StatusCode::OK, json!({"status": "ok"}))
}

pub(crate) async fn readyz_handler(State(state): State<AppState>) -> Response {
    match state.store.ping() {
        Ok(()) => envelope(StatusCode::OK, json!({"status": "ready"})),
        Err(e) => {
            warn!("readiness probe failed: {e}");
            let err = ApiError::storage(e.to_string());
            let body = Json(json!({"error": err}));
            (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
        }
    }
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> Response {
    let body = state.metrics.render_prometheus();
    let mut response = (StatusCode::OK, body).into_response();
    response.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    response
}

pub(crate) async fn version_handler() -> Response {
    envelope(
        StatusCode::OK,
        json!({
            "name": crate::CRATE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "api_version": quadra_api::API_VERSION,
        }),
    )
}

pub(crate) async fn list_tasks_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    if is_draining(&state) {
        return draining_response(&request_id);
    }
    info!(request_id = %request_id, route = "/v1/tasks", "request start");

    let quadrant = match params.get("quadrant") {
        None => None,
        Some(raw) => match Quadrant::parse(raw) {
            Ok(q) => Some(q),
            Err(_) => {
                return api_error_response(
                    ApiError::invalid_param("quadrant", raw).with_request_id(&request_id),
                )
            }
        },
    };
    let completed = match params.get("completed").map(String::as_str) {
        None => None,
        Some("true") => Some(true),
        Some("false") => Some(false),
        Some(other) => {
            return api_error_response(
                ApiError::invalid_param("completed", other).with_request_id(&request_id),
            )
        }
    };

    let tasks = match state.store.list_all() {
        Ok(tasks) => tasks,
        Err(e) => return api_error_response(store_error_to_api(&e, &request_id)),
    };
    let dtos: Vec<_> = tasks
        .iter()
        .filter(|t| quadrant.is_none_or(|q| t.quadrant == q))
        .filter(|t| completed.is_none_or(|c| t.completed == c))
        .map(task_to_dto)
        .collect();

    let payload = ApiResponseEnvelope {
        data: TaskListDto { tasks: dtos },
    };
    let etag = format!(
        "\"{}\"",
        sha256_hex(&serde_json::to_vec(&payload).unwrap_or_default())
    );
    if if_none_match(&headers).as_deref() == Some(etag.as_str()) {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        if let Ok(value) = HeaderValue::from_str(&etag) {
            response.headers_mut().insert("etag", value);
        }
        return with_request_id(response, &request_id);
    }
    let mut response = (StatusCode::OK, Json(payload)).into_response();
    if let Ok(value) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert("etag", value);
    }
    response
        .headers_mut()
        .insert("cache-control", HeaderValue::from_static("no-cache"));
    with_request_id(response, &request_id)
}

pub(crate) async fn create_task_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    if is_draining(&state) {
        return draining_response(&request_id);
    }
    info!(request_id = %request_id, route = "/v1/tasks", "create task");

    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return api_error_response(json_rejection_to_api(&rejection, &request_id))
        }
    };
    let new_task = match request.validate() {
        Ok(new_task) => new_task,
        Err(e) => return api_error_response(e.with_request_id(&request_id)),
    };
    match state.store.insert(&new_task, Utc::now()) {
        Ok(task) => envelope(StatusCode::CREATED, task_to_dto(&task)),
        Err(e) => api_error_response(store_error_to_api(&e, &request_id)),
    }
}

pub(crate) async fn update_task_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    if is_draining(&state) {
        return draining_response(&request_id);
    }
    info!(request_id = %request_id, route = "/v1/tasks/:id", task_id = %raw_id, "update task");

    let id = match TaskId::parse(&raw_id) {
        Ok(id) => id,
        Err(e) => {
            return api_error_response(
                ApiError::validation_failed(json!([{"field": "id", "reason": e.to_string()}]))
                    .with_request_id(&request_id),
            )
        }
    };
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return api_error_response(json_rejection_to_api(&rejection, &request_id))
        }
    };
    let patch = match request.validate() {
        Ok(patch) => patch,
        Err(e) => return api_error_response(e.with_request_id(&request_id)),
    };
    match state.store.update_fields(&id, &patch, Utc::now()) {
        Ok(task) => envelope(StatusCode::OK, task_to_dto(&task)),
        Err(e) => api_error_response(store_error_to_api(&e, &request_id)),
    }
}

pub(crate) async fn bulk_reorder_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<BulkReorderRequest>, JsonRejection>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    if is_draining(&state) {
        return draining_response(&request_id);
    }
    info!(request_id = %request_id, route = "/v1/tasks/reorder", "bulk reorder");

    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return api_error_response(json_rejection_to_api(&rejection, &request_id))
        }
    };
    let updates = match request.validate() {
        Ok(updates) => updates,
        Err(e) => return api_error_response(e.with_request_id(&request_id)),
    };
    match state.store.apply_order_updates(&updates) {
        Ok(tasks) => envelope(
            StatusCode::OK,
            TaskListDto {
                tasks: tasks.iter().map(task_to_dto).collect(),
            },
        ),
        Err(e) => api_error_response(store_error_to_api(&e, &request_id)),
    }
}

pub(crate) async fn delete_task_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    if is_draining(&state) {
        return draining_response(&request_id);
    }
    info!(request_id = %request_id, route = "/v1/tasks/:id", task_id = %raw_id, "delete task");

    let id = match TaskId::parse(&raw_id) {
        Ok(id) => id,
        Err(e) => {
            return api_error_response(
                ApiError::validation_failed(json!([{"field": "id", "reason": e.to_string()}]))
                    .with_request_id(&request_id),
            )
        }
    };
    match state.store.delete(&id) {
        Ok(()) => envelope(StatusCode::OK, DeleteResultDto { deleted: true }),
        Err(e) => api_error_response(store_error_to_api(&e, &request_id)),
    }
}
