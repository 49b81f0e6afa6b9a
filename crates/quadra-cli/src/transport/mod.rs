// SPDX-License-Identifier: Apache-2.0

mod fake;
mod http;
mod retry;

pub use fake::FakeTransport;
pub use http::HttpTransport;
pub use retry::{BackoffPolicy, RetryPolicy};

use quadra_api::{
    ApiError, BulkReorderRequest, CreateTaskRequest, TaskDto, UpdateTaskRequest,
};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// The server answered with a structured error envelope.
    Api(ApiError),
    /// The request never produced a decodable response.
    Network(String),
    /// The response arrived but its payload was not the expected shape.
    Decode(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api(err) => write!(f, "server error: {err}"),
            Self::Network(msg) => write!(f, "network failure: {msg}"),
            Self::Decode(msg) => write!(f, "undecodable response: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Seam between the optimistic controller and the task API.
pub trait TaskTransport {
    fn list(&self) -> Result<Vec<TaskDto>, TransportError>;
    fn create(&self, request: &CreateTaskRequest) -> Result<TaskDto, TransportError>;
    fn update(&self, id: &str, request: &UpdateTaskRequest) -> Result<TaskDto, TransportError>;
    fn bulk_reorder(&self, request: &BulkReorderRequest)
        -> Result<Vec<TaskDto>, TransportError>;
    fn delete(&self, id: &str) -> Result<(), TransportError>;
}
