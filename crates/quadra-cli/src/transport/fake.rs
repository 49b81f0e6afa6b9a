// SPDX-License-Identifier: Apache-2.0

use std::cell::{Cell, RefCell};

use chrono::Utc;
use quadra_api::{
    dto_to_task, task_to_dto, BulkReorderRequest, CreateTaskRequest, TaskDto, UpdateTaskRequest,
};
use quadra_engine as engine;
use quadra_model::{Task, TaskId};

use super::{TaskTransport, TransportError};

/// In-memory stand-in for the server, mirroring its ordering semantics
/// through the same engine transforms. Tests script failures with
/// [`FakeTransport::fail_next_call`].
#[derive(Default)]
pub struct FakeTransport {
    state: RefCell<Vec<Task>>,
    next_id: Cell<u64>,
    fail_next: RefCell<Option<TransportError>>,
    calls: RefCell<Vec<String>>,
}

impl FakeTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the fake with pre-existing server state.
    #[must_use]
    pub fn with_tasks(tasks: Vec<TaskDto>) -> Self {
        let fake = Self::new();
        let decoded: Vec<Task> = tasks
            .iter()
            .map(|dto| dto_to_task(dto).expect("seed task"))
            .collect();
        fake.next_id.set(decoded.len() as u64);
        *fake.state.borrow_mut() = decoded;
        fake
    }

    /// Make the next transport call fail with `err`, after which calls
    /// succeed again.
    pub fn fail_next_call(&self, err: TransportError) {
        *self.fail_next.borrow_mut() = Some(err);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.state.borrow().clone()
    }

    fn admit(&self, call: &str) -> Result<(), TransportError> {
        self.calls.borrow_mut().push(call.to_string());
        match self.fail_next.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn find(&self, id: &str) -> Result<TaskId, TransportError> {
        let parsed = TaskId::parse(id)
            .map_err(|e| TransportError::Api(quadra_api::ApiError::validation_failed(
                serde_json::json!([{"field": "id", "reason": e.to_string()}]),
            )))?;
        if self.state.borrow().iter().any(|t| t.id == parsed) {
            Ok(parsed)
        } else {
            Err(TransportError::Api(quadra_api::ApiError::task_not_found(id)))
        }
    }
}

impl TaskTransport for FakeTransport {
    fn list(&self) -> Result<Vec<TaskDto>, TransportError> {
        self.admit("list")?;
        Ok(self.state.borrow().iter().map(task_to_dto).collect())
    }

    fn create(&self, request: &CreateTaskRequest) -> Result<TaskDto, TransportError> {
        self.admit("create")?;
        let new_task = request
            .validate()
            .map_err(|e| TransportError::Api(e))?;
        let seq = self.next_id.get() + 1;
        self.next_id.set(seq);
        let id = TaskId::parse(&format!("task-{seq}")).expect("generated id");
        let mut task = Task::new(id, new_task.text, new_task.quadrant, 0, Utc::now());
        task.due_date = new_task.due_date;
        task.note = new_task.note;

        let mut state = self.state.borrow_mut();
        engine::append(&mut state, task);
        Ok(task_to_dto(state.last().expect("appended")))
    }

    fn update(&self, id: &str, request: &UpdateTaskRequest) -> Result<TaskDto, TransportError> {
        self.admit("update")?;
        let task_id = self.find(id)?;
        let patch = request.validate().map_err(TransportError::Api)?;
        let mut state = self.state.borrow_mut();

        if let Some(to) = patch.quadrant {
            let completed = state
                .iter()
                .find(|t| t.id == task_id)
                .is_some_and(|t| t.completed);
            if completed {
                if let Some(task) = state.iter_mut().find(|t| t.id == task_id) {
                    task.quadrant = to;
                }
            } else {
                engine::move_to(&mut state, &task_id, to)
                    .map_err(|e| TransportError::Decode(e.to_string()))?;
            }
        }
        match patch.completed {
            Some(true) => {
                let _ = engine::complete(&mut state, &task_id, Utc::now());
            }
            Some(false) => {
                let _ = engine::restore(&mut state, &task_id);
            }
            None => {}
        }
        if let Some(task) = state.iter_mut().find(|t| t.id == task_id) {
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
        let task = state
            .iter()
            .find(|t| t.id == task_id)
            .expect("updated task present");
        Ok(task_to_dto(task))
    }

    fn bulk_reorder(
        &self,
        request: &BulkReorderRequest,
    ) -> Result<Vec<TaskDto>, TransportError> {
        self.admit("bulk_reorder")?;
        let updates = request.validate().map_err(TransportError::Api)?;
        for update in &updates {
            self.find(update.id.as_str())?;
        }
        let mut state = self.state.borrow_mut();
        let mut out = Vec::with_capacity(updates.len());
        for update in &updates {
            let task = state
                .iter_mut()
                .find(|t| t.id == update.id)
                .expect("validated id present");
            task.order = update.order;
            if let Some(at) = update.completed_at {
                task.completed_at = Some(at);
            }
            out.push(task_to_dto(task));
        }
        Ok(out)
    }

    fn delete(&self, id: &str) -> Result<(), TransportError> {
        self.admit("delete")?;
        let task_id = self.find(id)?;
        let mut state = self.state.borrow_mut();
        engine::remove(&mut state, &task_id)
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(())
    }
}
