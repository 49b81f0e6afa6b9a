// SPDX-License-Identifier: Apache-2.0

use quadra_model::{ParseError, Task, TaskId, TaskText, ValidationError};

use crate::dto::TaskDto;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DtoDecodeError {
    Field(ParseError),
    Invariant(ValidationError),
}

impl std::fmt::Display for DtoDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(e) => write!(f, "undecodable task field: {e}"),
            Self::Invariant(e) => write!(f, "task violates invariant: {e}"),
        }
    }
}

impl std::error::Error for DtoDecodeError {}

impl From<ParseError> for DtoDecodeError {
    fn from(value: ParseError) -> Self {
        Self::Field(value)
    }
}

#[must_use]
pub fn task_to_dto(task: &Task) -> TaskDto {
    TaskDto {
        id: task.id.as_str().to_string(),
        text: task.text.as_str().to_string(),
        quadrant: task.quadrant,
        order: task.order,
        completed: task.completed,
        is_waiting: task.is_waiting,
        created_at: task.created_at,
        completed_at: task.completed_at,
        due_date: task.due_date,
        note: task.note.clone(),
    }
}

/// Decode a server task representation back into the domain type,
/// re-checking the completed/completed_at coupling on the way in.
pub fn dto_to_task(dto: &TaskDto) -> Result<Task, DtoDecodeError> {
    let task = Task {
        id: TaskId::parse(&dto.id)?,
        text: TaskText::parse(&dto.text)?,
        quadrant: dto.quadrant,
        order: dto.order,
        completed: dto.completed,
        is_waiting: dto.is_waiting,
        created_at: dto.created_at,
        completed_at: dto.completed_at,
        due_date: dto.due_date,
        note: dto.note.clone(),
    };
    task.validate().map_err(DtoDecodeError::Invariant)?;
    Ok(task)
}
