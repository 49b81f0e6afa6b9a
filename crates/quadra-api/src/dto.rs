// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use quadra_model::Quadrant;
use serde::{Deserialize, Serialize};

/// Wire form of a task. Timestamps are RFC 3339 strings on the wire.
///
/// Responses stay extensible, so unknown fields are tolerated here; the
/// request structs in `params` are the strict side of the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDto {
    pub id: String,
    pub text: String,
    pub quadrant: Quadrant,
    pub order: u32,
    pub completed: bool,
    pub is_waiting: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListDto {
    pub tasks: Vec<TaskDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResultDto {
    pub deleted: bool,
}
