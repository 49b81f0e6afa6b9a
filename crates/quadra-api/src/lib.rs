// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod convert;
mod dto;
mod error_mapping;
mod errors;
mod params;
mod responses;

pub use convert::{dto_to_task, task_to_dto, DtoDecodeError};
pub use dto::{DeleteResultDto, TaskDto, TaskListDto};
pub use error_mapping::map_error_status;
pub use errors::{ApiError, ApiErrorCode};
pub use params::{
    BulkReorderRequest, CreateTaskRequest, NewTask, OrderUpdate, ReorderEntry, TaskPatch,
    UpdateTaskRequest, MAX_REORDER_UPDATES,
};
pub use responses::ApiResponseEnvelope;

pub const CRATE_NAME: &str = "quadra-api";
pub const API_VERSION: &str = "v1";
