// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::Utc;
use tracing::{debug, warn};

use quadra_api::{
    dto_to_task, BulkReorderRequest, CreateTaskRequest, DtoDecodeError, ReorderEntry, TaskDto,
    TaskPatch, UpdateTaskRequest,
};
use quadra_engine::{self as engine, Board, EngineError};
use quadra_model::{Quadrant, Task, TaskId, TaskText};

use crate::transport::{TaskTransport, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    /// The whole task list could not be loaded or decoded; nothing to work
    /// with. The CLI treats this as fatal.
    LoadFailed(String),
    /// A mutation's network call failed. Local state has been rolled back
    /// to the pre-mutation snapshot.
    Transport(TransportError),
    /// The requested transform is invalid against current local state.
    Engine(EngineError),
    /// The target still carries a client placeholder id; the create that
    /// names it has not been acknowledged.
    PlaceholderPending(TaskId),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadFailed(msg) => write!(f, "could not load tasks: {msg}"),
            Self::Transport(err) => write!(f, "{err} (local changes rolled back)"),
            Self::Engine(err) => write!(f, "{err}"),
            Self::PlaceholderPending(id) => {
                write!(f, "task {id} is not acknowledged by the server yet")
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<EngineError> for SessionError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Optimistic update controller: the in-memory task list, mutated through
/// the engine transforms first and reconciled with (or rolled back from)
/// the server afterwards.
#[derive(Debug)]
pub struct Session<T: TaskTransport> {
    transport: T,
    tasks: Vec<Task>,
    placeholder_seq: u64,
    reorder_seq: BTreeMap<Quadrant, u64>,
    skipped: Vec<(String, DtoDecodeError)>,
}

impl<T: TaskTransport> Session<T> {
    /// Fetch the full task list and build a session around it.
    ///
    /// Individually undecodable rows are skipped and reported through
    /// [`Session::skipped_rows`]; a list where nothing decodes is a
    /// [`SessionError::LoadFailed`].
    pub fn load(transport: T) -> Result<Self, SessionError> {
        let dtos = transport
            .list()
            .map_err(|e| SessionError::LoadFailed(e.to_string()))?;
        let mut tasks = Vec::with_capacity(dtos.len());
        let mut skipped = Vec::new();
        for dto in &dtos {
            match dto_to_task(dto) {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    warn!(task_id = %dto.id, "skipping undecodable task: {e}");
                    skipped.push((dto.id.clone(), e));
                }
            }
        }
        if !dtos.is_empty() && tasks.is_empty() {
            return Err(SessionError::LoadFailed(
                "all stored tasks are undecodable".to_string(),
            ));
        }
        Ok(Self {
            transport,
            tasks,
            placeholder_seq: 0,
            reorder_seq: BTreeMap::new(),
            skipped,
        })
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn board(&self) -> Board<'_> {
        Board::derive(&self.tasks)
    }

    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Rows the server returned but the session could not decode.
    #[must_use]
    pub fn skipped_rows(&self) -> &[(String, DtoDecodeError)] {
        &self.skipped
    }

    #[cfg(test)]
    pub(crate) fn transport_ref(&self) -> &T {
        &self.transport
    }

    /// Create a task: rendered locally under a placeholder id immediately,
    /// then re-keyed to the server-assigned id on acknowledgement. On
    /// failure the placeholder row is rolled back, so no placeholder ever
    /// outlives the call.
    pub fn add(
        &mut self,
        text: TaskText,
        quadrant: Quadrant,
        due_date: Option<chrono::DateTime<Utc>>,
        note: Option<String>,
    ) -> Result<TaskId, SessionError> {
        self.placeholder_seq += 1;
        let placeholder = TaskId::placeholder(self.placeholder_seq);
        let mut task = Task::new(placeholder.clone(), text.clone(), quadrant, 0, Utc::now());
        task.due_date = due_date;
        task.note = note.clone();

        let snapshot = self.tasks.clone();
        engine::append(&mut self.tasks, task);

        let request = CreateTaskRequest {
            text: text.as_str().to_string(),
            quadrant: Some(quadrant),
            due_date,
            note,
        };
        let dto = match self.transport.create(&request) {
            Ok(dto) => dto,
            Err(e) => return self.roll_back(snapshot, e),
        };
        let server_task = match dto_to_task(&dto) {
            Ok(task) => task,
            Err(e) => {
                return self.roll_back(snapshot, TransportError::Decode(e.to_string()));
            }
        };
        let server_id = server_task.id.clone();
        // Re-key the optimistic row in place: exactly one row carries the
        // placeholder, so the task is neither duplicated nor lost.
        match self.tasks.iter().position(|t| t.id == placeholder) {
            Some(pos) => self.tasks[pos] = server_task,
            None => self.tasks.push(server_task),
        }
        Ok(server_id)
    }

    /// Update the non-structural fields of a task (text, note, due date,
    /// waiting flag). Quadrant and completion changes go through
    /// [`Session::move_task`], [`Session::complete`] and
    /// [`Session::restore`].
    pub fn edit(&mut self, id: &TaskId, patch: &TaskPatch) -> Result<(), SessionError> {
        if id.is_placeholder() {
            return Err(SessionError::PlaceholderPending(id.clone()));
        }
        let pos = self
            .tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| SessionError::Engine(EngineError::NotFound(id.clone())))?;

        let snapshot = self.tasks.clone();
        {
            let task = &mut self.tasks[pos];
            if let Some(text) = &patch.text {
                task.text = text.clone();
            }
            if let Some(is_waiting) = patch.is_waiting {
                task.is_waiting = is_waiting;
            }
            if let Some(due_date) = patch.due_date {
                task.due_date = due_date;
            }
            if let Some(note) = &patch.note {
                task.note = note.clone();
            }
        }

        let request = UpdateTaskRequest {
            text: patch.text.as_ref().map(|t| t.as_str().to_string()),
            quadrant: None,
            completed: None,
            is_waiting: patch.is_waiting,
            due_date: patch.due_date,
            note: patch.note.clone(),
        };
        match self.transport.update(id.as_str(), &request) {
            Ok(dto) => {
                self.reconcile_row(&dto);
                Ok(())
            }
            Err(e) => self.roll_back(snapshot, e),
        }
    }

    /// Move a task to the end of another quadrant.
    pub fn move_task(&mut self, id: &TaskId, to: Quadrant) -> Result<(), SessionError> {
        if id.is_placeholder() {
            return Err(SessionError::PlaceholderPending(id.clone()));
        }
        let snapshot = self.tasks.clone();
        let changes = engine::move_to(&mut self.tasks, id, to)?;
        if changes.is_empty() {
            return Ok(());
        }

        let request = UpdateTaskRequest {
            quadrant: Some(to),
            ..UpdateTaskRequest::default()
        };
        match self.transport.update(id.as_str(), &request) {
            Ok(dto) => {
                self.reconcile_row(&dto);
                Ok(())
            }
            Err(e) => self.roll_back(snapshot, e),
        }
    }

    /// Apply a caller-supplied total order to one quadrant and persist the
    /// full `{id, order}` list for it.
    pub fn reorder(&mut self, quadrant: Quadrant, desired: &[TaskId]) -> Result<(), SessionError> {
        if let Some(pending) = desired.iter().find(|id| id.is_placeholder()) {
            return Err(SessionError::PlaceholderPending(pending.clone()));
        }
        let seq = self.bump_reorder_seq(quadrant);
        let snapshot = self.tasks.clone();
        engine::reorder(&mut self.tasks, quadrant, desired)?;

        let request = BulkReorderRequest {
            updates: desired
                .iter()
                .enumerate()
                .map(|(index, id)| ReorderEntry {
                    id: id.as_str().to_string(),
                    order: index as u32,
                    completed_at: None,
                })
                .collect(),
        };
        match self.transport.bulk_reorder(&request) {
            Ok(dtos) => {
                self.apply_reorder_response(quadrant, seq, &dtos);
                Ok(())
            }
            Err(e) => self.roll_back(snapshot, e),
        }
    }

    /// Complete a task. The server's completion timestamp replaces the
    /// optimistic one on acknowledgement.
    pub fn complete(&mut self, id: &TaskId) -> Result<(), SessionError> {
        if id.is_placeholder() {
            return Err(SessionError::PlaceholderPending(id.clone()));
        }
        let snapshot = self.tasks.clone();
        engine::complete(&mut self.tasks, id, Utc::now())?;

        let request = UpdateTaskRequest {
            completed: Some(true),
            ..UpdateTaskRequest::default()
        };
        match self.transport.update(id.as_str(), &request) {
            Ok(dto) => {
                self.reconcile_row(&dto);
                Ok(())
            }
            Err(e) => self.roll_back(snapshot, e),
        }
    }

    /// Return a finished task to the end of its retained quadrant.
    pub fn restore(&mut self, id: &TaskId) -> Result<(), SessionError> {
        if id.is_placeholder() {
            return Err(SessionError::PlaceholderPending(id.clone()));
        }
        let snapshot = self.tasks.clone();
        engine::restore(&mut self.tasks, id)?;

        let request = UpdateTaskRequest {
            completed: Some(false),
            ..UpdateTaskRequest::default()
        };
        match self.transport.update(id.as_str(), &request) {
            Ok(dto) => {
                self.reconcile_row(&dto);
                Ok(())
            }
            Err(e) => self.roll_back(snapshot, e),
        }
    }

    /// Permanently delete a task.
    pub fn delete(&mut self, id: &TaskId) -> Result<(), SessionError> {
        if id.is_placeholder() {
            return Err(SessionError::PlaceholderPending(id.clone()));
        }
        let snapshot = self.tasks.clone();
        engine::remove(&mut self.tasks, id)?;

        match self.transport.delete(id.as_str()) {
            Ok(()) => Ok(()),
            Err(e) => self.roll_back(snapshot, e),
        }
    }

    fn bump_reorder_seq(&mut self, quadrant: Quadrant) -> u64 {
        let seq = self.reorder_seq.entry(quadrant).or_insert(0);
        *seq += 1;
        *seq
    }

    /// Apply a reorder acknowledgement unless a newer reorder of the same
    /// quadrant has been issued since; a stale response must not stomp the
    /// newer optimistic state.
    pub(crate) fn apply_reorder_response(
        &mut self,
        quadrant: Quadrant,
        seq: u64,
        dtos: &[TaskDto],
    ) -> bool {
        if self.reorder_seq.get(&quadrant).copied() != Some(seq) {
            debug!(
                quadrant = %quadrant,
                seq,
                "discarding stale reorder acknowledgement"
            );
            return false;
        }
        for dto in dtos {
            self.reconcile_row(dto);
        }
        true
    }

    fn reconcile_row(&mut self, dto: &TaskDto) {
        match dto_to_task(dto) {
            Ok(task) => {
                if let Some(pos) = self.tasks.iter().position(|t| t.id == task.id) {
                    self.tasks[pos] = task;
                } else {
                    warn!(task_id = %dto.id, "acknowledgement for unknown task; ignoring");
                }
            }
            Err(e) => {
                warn!(task_id = %dto.id, "undecodable acknowledgement; keeping optimistic row: {e}");
            }
        }
    }

    fn roll_back<R>(&mut self, snapshot: Vec<Task>, err: TransportError) -> Result<R, SessionError> {
        warn!("mutation failed, rolling local state back: {err}");
        self.tasks = snapshot;
        Err(SessionError::Transport(err))
    }
}
