// SPDX-License-Identifier: Apache-2.0

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use quadra_api::{map_error_status, ApiError};
use serde_json::json;

use crate::store::StoreError;

#[must_use]
pub(crate) fn api_error_status(err: &ApiError) -> StatusCode {
    StatusCode::from_u16(map_error_status(err)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[must_use]
pub(crate) fn api_error_response(err: ApiError) -> Response {
    let status = api_error_status(&err);
    let body = Json(json!({"error": err}));
    (status, body).into_response()
}

/// Translate a store failure into the wire error taxonomy.
#[must_use]
pub(crate) fn store_error_to_api(err: &StoreError, request_id: &str) -> ApiError {
    match err {
        StoreError::NotFound(id) => ApiError::task_not_found(id),
        StoreError::Constraint(msg) => {
            ApiError::validation_failed(json!([{"field": "updates", "reason": msg}]))
        }
        StoreError::Corrupt(msg) | StoreError::Sqlite(msg) => ApiError::storage(msg.clone()),
    }
    .with_request_id(request_id)
}

#[must_use]
pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    response
}
