// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::quadrant::Quadrant;

pub const ID_MAX_LEN: usize = 128;
pub const TEXT_MAX_LEN: usize = 1024;

/// Prefix for client-generated placeholder ids used before the server has
/// assigned a real one.
const PLACEHOLDER_PREFIX: &str = "tmp-";

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    Trimmed(&'static str),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::Trimmed(name) => {
                write!(f, "{name} must not contain leading/trailing whitespace")
            }
            Self::TooLong(name, max) => write!(f, "{name} exceeds max length {max}"),
            Self::InvalidFormat(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct TaskId(String);

impl TaskId {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty("task_id"));
        }
        if input.trim() != input {
            return Err(ParseError::Trimmed("task_id"));
        }
        if input.len() > ID_MAX_LEN {
            return Err(ParseError::TooLong("task_id", ID_MAX_LEN));
        }
        Ok(Self(input.to_string()))
    }

    /// Id form used by a client for a task the server has not acknowledged yet.
    #[must_use]
    pub fn placeholder(seq: u64) -> Self {
        Self(format!("{PLACEHOLDER_PREFIX}{seq}"))
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty user-visible task text. Surrounding whitespace is dropped at
/// parse time so equality and emptiness checks see the stored form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct TaskText(String);

impl TaskText {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty("text"));
        }
        if trimmed.len() > TEXT_MAX_LEN {
            return Err(ParseError::TooLong("text", TEXT_MAX_LEN));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    CompletedWithoutTimestamp,
    TimestampWithoutCompleted,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CompletedWithoutTimestamp => {
                f.write_str("completed task must carry completed_at")
            }
            Self::TimestampWithoutCompleted => {
                f.write_str("active task must not carry completed_at")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// The single persisted entity.
///
/// `order` positions the task within its quadrant's active sequence; among
/// active tasks sharing a quadrant the values are dense and zero-based. On a
/// completed task the field is dormant until restore re-appends the task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: TaskText,
    pub quadrant: Quadrant,
    pub order: u32,
    pub completed: bool,
    pub is_waiting: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl Task {
    /// New active task as the add operation creates it.
    #[must_use]
    pub fn new(
        id: TaskId,
        text: TaskText,
        quadrant: Quadrant,
        order: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text,
            quadrant,
            order,
            completed: false,
            is_waiting: false,
            created_at,
            completed_at: None,
            due_date: None,
            note: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.completed, self.completed_at.is_some()) {
            (true, false) => Err(ValidationError::CompletedWithoutTimestamp),
            (false, true) => Err(ValidationError::TimestampWithoutCompleted),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn task_id_rejects_empty_untrimmed_and_overlong() {
        assert_eq!(TaskId::parse(""), Err(ParseError::Empty("task_id")));
        assert_eq!(TaskId::parse(" task-1"), Err(ParseError::Trimmed("task_id")));
        let long = "x".repeat(ID_MAX_LEN + 1);
        assert_eq!(
            TaskId::parse(&long),
            Err(ParseError::TooLong("task_id", ID_MAX_LEN))
        );
        assert!(TaskId::parse("task-42").is_ok());
    }

    #[test]
    fn placeholder_ids_are_recognizable() {
        let id = TaskId::placeholder(7);
        assert_eq!(id.as_str(), "tmp-7");
        assert!(id.is_placeholder());
        assert!(!TaskId::parse("task-7").unwrap().is_placeholder());
    }

    #[test]
    fn text_is_trimmed_and_must_be_non_empty() {
        assert_eq!(
            TaskText::parse("   ").unwrap_err(),
            ParseError::Empty("text")
        );
        assert_eq!(TaskText::parse("  buy milk  ").unwrap().as_str(), "buy milk");
        let long = "x".repeat(TEXT_MAX_LEN + 1);
        assert_eq!(
            TaskText::parse(&long),
            Err(ParseError::TooLong("text", TEXT_MAX_LEN))
        );
    }

    #[test]
    fn validate_couples_completed_and_completed_at() {
        let mut task = Task::new(
            TaskId::parse("task-1").unwrap(),
            TaskText::parse("a").unwrap(),
            Quadrant::Inbox,
            0,
            ts(),
        );
        assert_eq!(task.validate(), Ok(()));

        task.completed = true;
        assert_eq!(
            task.validate(),
            Err(ValidationError::CompletedWithoutTimestamp)
        );

        task.completed_at = Some(ts());
        assert_eq!(task.validate(), Ok(()));

        task.completed = false;
        assert_eq!(
            task.validate(),
            Err(ValidationError::TimestampWithoutCompleted)
        );
    }
}
