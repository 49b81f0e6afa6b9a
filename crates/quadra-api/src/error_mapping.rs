// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};

#[must_use]
pub fn map_error_status(error: &ApiError) -> u16 {
    match error.code {
        ApiErrorCode::ValidationFailed | ApiErrorCode::InvalidQueryParameter => 400,
        ApiErrorCode::TaskNotFound => 404,
        ApiErrorCode::PayloadTooLarge => 413,
        ApiErrorCode::StorageFailure | ApiErrorCode::Internal => 500,
    }
}
