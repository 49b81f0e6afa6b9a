// SPDX-License-Identifier: Apache-2.0

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use quadra_api::{
    ApiError, ApiResponseEnvelope, BulkReorderRequest, CreateTaskRequest, DeleteResultDto,
    TaskDto, TaskListDto, UpdateTaskRequest,
};

use super::retry::{BackoffPolicy, RetryPolicy};
use super::{TaskTransport, TransportError};

/// Blocking HTTP implementation of [`TaskTransport`].
///
/// Reads are retried per the policy; mutations are attempted once, since
/// the controller rolls its optimistic state back on failure and a blind
/// retry of a non-idempotent call could double-apply.
pub struct HttpTransport {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            retry,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        if status.is_success() {
            let envelope: ApiResponseEnvelope<T> = serde_json::from_value(body)
                .map_err(|e| TransportError::Decode(e.to_string()))?;
            return Ok(envelope.data);
        }
        match body.get("error") {
            Some(err) => {
                let api: ApiError = serde_json::from_value(err.clone())
                    .map_err(|e| TransportError::Decode(e.to_string()))?;
                Err(TransportError::Api(api))
            }
            None => Err(TransportError::Decode(format!(
                "status {status} without error envelope"
            ))),
        }
    }

    fn should_retry(status: Option<StatusCode>) -> bool {
        // Connection-level failures and 5xx answers are worth another try
        // for reads; structured 4xx answers are not.
        status.is_none_or(|s| s.is_server_error())
    }

    fn get_with_retry<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let mut last = TransportError::Network("no attempt made".to_string());
        for attempt in 1..=self.retry.max_attempts.max(1) {
            match self.client.get(self.url(path)).send() {
                Ok(response) => {
                    let status = response.status();
                    match Self::decode::<T>(response) {
                        Ok(value) => return Ok(value),
                        Err(err) => {
                            if !Self::should_retry(Some(status)) {
                                return Err(err);
                            }
                            last = err;
                        }
                    }
                }
                Err(e) => {
                    if !Self::should_retry(e.status()) {
                        return Err(TransportError::Network(e.to_string()));
                    }
                    last = TransportError::Network(e.to_string());
                }
            }
            if attempt < self.retry.max_attempts {
                debug!(attempt, path, "retrying GET after failure");
                std::thread::sleep(self.retry.delay_for_attempt(attempt));
            }
        }
        Err(last)
    }
}

impl TaskTransport for HttpTransport {
    fn list(&self) -> Result<Vec<TaskDto>, TransportError> {
        let data: TaskListDto = self.get_with_retry("/v1/tasks")?;
        Ok(data.tasks)
    }

    fn create(&self, request: &CreateTaskRequest) -> Result<TaskDto, TransportError> {
        let response = self
            .client
            .post(self.url("/v1/tasks"))
            .json(request)
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::decode(response)
    }

    fn update(&self, id: &str, request: &UpdateTaskRequest) -> Result<TaskDto, TransportError> {
        let response = self
            .client
            .patch(self.url(&format!("/v1/tasks/{id}")))
            .json(request)
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::decode(response)
    }

    fn bulk_reorder(
        &self,
        request: &BulkReorderRequest,
    ) -> Result<Vec<TaskDto>, TransportError> {
        let response = self
            .client
            .post(self.url("/v1/tasks/reorder"))
            .json(request)
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let data: TaskListDto = Self::decode(response)?;
        Ok(data.tasks)
    }

    fn delete(&self, id: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .delete(self.url(&format!("/v1/tasks/{id}")))
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let _: DeleteResultDto = Self::decode(response)?;
        Ok(())
    }
}
