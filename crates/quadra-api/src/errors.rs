// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ApiErrorCode {
    ValidationFailed,
    InvalidQueryParameter,
    TaskNotFound,
    StorageFailure,
    PayloadTooLarge,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(
        code: ApiErrorCode,
        message: impl Into<String>,
        details: Value,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: request_id.into(),
        }
    }

    #[must_use]
    pub fn validation_failed(field_errors: Value) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            "validation failed",
            json!({"field_errors": field_errors}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidQueryParameter,
            format!("invalid query parameter: {name}"),
            json!({"field_errors":[{"parameter": name, "reason": "invalid", "value": value}]}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn task_not_found(id: &str) -> Self {
        Self::new(
            ApiErrorCode::TaskNotFound,
            format!("no task with id {id}"),
            json!({"task_id": id}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::StorageFailure,
            message,
            json!({}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Internal, message, json!({}), "req-unknown")
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = request_id.to_string();
        self
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_use_screaming_snake_case_on_the_wire() {
        let encoded = serde_json::to_string(&ApiErrorCode::TaskNotFound).expect("serialize");
        assert_eq!(encoded, "\"TASK_NOT_FOUND\"");
        let decoded: ApiErrorCode =
            serde_json::from_str("\"VALIDATION_FAILED\"").expect("deserialize");
        assert_eq!(decoded, ApiErrorCode::ValidationFailed);
    }

    #[test]
    fn error_round_trips_through_json() {
        let err = ApiError::task_not_found("task-9").with_request_id("req-1");
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["code"], "TASK_NOT_FOUND");
        assert_eq!(value["details"]["task_id"], "task-9");
        let back: ApiError = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, err);
    }
}
