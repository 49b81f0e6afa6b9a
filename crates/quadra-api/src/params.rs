// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use quadra_model::{Quadrant, TaskId, TaskText};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::errors::ApiError;

pub const MAX_REORDER_UPDATES: usize = 500;

/// Distinguishes "field absent" from "field set to null" in PATCH bodies:
/// the outer option is presence, the inner one the value.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quadrant: Option<Quadrant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Validated form of [`CreateTaskRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub text: TaskText,
    pub quadrant: Quadrant,
    pub due_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> Result<NewTask, ApiError> {
        let text = TaskText::parse(&self.text)
            .map_err(|e| ApiError::validation_failed(json!([{"field": "text", "reason": e.to_string()}])))?;
        Ok(NewTask {
            text,
            quadrant: self.quadrant.unwrap_or(Quadrant::Inbox),
            due_date: self.due_date,
            note: normalize_note(self.note.clone()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quadrant: Option<Quadrant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_waiting: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub note: Option<Option<String>>,
}

/// Validated partial update. `None` leaves a field untouched; for the
/// nullable fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskPatch {
    pub text: Option<TaskText>,
    pub quadrant: Option<Quadrant>,
    pub completed: Option<bool>,
    pub is_waiting: Option<bool>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub note: Option<Option<String>>,
}

impl TaskPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.quadrant.is_none()
            && self.completed.is_none()
            && self.is_waiting.is_none()
            && self.due_date.is_none()
            && self.note.is_none()
    }
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> Result<TaskPatch, ApiError> {
        let mut field_errors: Vec<Value> = Vec::new();

        let text = match &self.text {
            None => None,
            Some(raw) => match TaskText::parse(raw) {
                Ok(text) => Some(text),
                Err(e) => {
                    field_errors.push(json!({"field": "text", "reason": e.to_string()}));
                    None
                }
            },
        };

        if !field_errors.is_empty() {
            return Err(ApiError::validation_failed(Value::Array(field_errors)));
        }

        let patch = TaskPatch {
            text,
            quadrant: self.quadrant,
            completed: self.completed,
            is_waiting: self.is_waiting,
            due_date: self.due_date,
            note: self.note.clone().map(normalize_note),
        };
        if patch.is_empty() {
            return Err(ApiError::validation_failed(
                json!([{"field": "*", "reason": "no fields to update"}]),
            ));
        }
        Ok(patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReorderEntry {
    pub id: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkReorderRequest {
    pub updates: Vec<ReorderEntry>,
}

/// Validated form of one [`ReorderEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    pub id: TaskId,
    pub order: u32,
    pub completed_at: Option<DateTime<Utc>>,
}

impl BulkReorderRequest {
    pub fn validate(&self) -> Result<Vec<OrderUpdate>, ApiError> {
        if self.updates.is_empty() {
            return Err(ApiError::validation_failed(
                json!([{"field": "updates", "reason": "must not be empty"}]),
            ));
        }
        if self.updates.len() > MAX_REORDER_UPDATES {
            return Err(ApiError::validation_failed(
                json!([{"field": "updates", "reason": format!("more than {MAX_REORDER_UPDATES} entries")}]),
            ));
        }

        let mut seen = std::collections::BTreeSet::new();
        let mut out = Vec::with_capacity(self.updates.len());
        for entry in &self.updates {
            let id = TaskId::parse(&entry.id).map_err(|e| {
                ApiError::validation_failed(json!([{"field": "updates.id", "reason": e.to_string()}]))
            })?;
            if !seen.insert(id.clone()) {
                return Err(ApiError::validation_failed(
                    json!([{"field": "updates.id", "reason": format!("duplicate id {id}")}]),
                ));
            }
            out.push(OrderUpdate {
                id,
                order: entry.order,
                completed_at: entry.completed_at,
            });
        }
        Ok(out)
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.and_then(|n| {
        let trimmed = n.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
