use crate::controller::{Session, SessionError};
use crate::transport::{FakeTransport, TaskTransport, TransportError};
use chrono::{TimeZone, Utc};
use quadra_api::{task_to_dto, TaskDto, TaskPatch};
use quadra_model::{Quadrant, Task, TaskId, TaskText};

fn session_with(count: usize) -> Session<FakeTransport> {
    let fake = FakeTransport::new();
    for i in 0..count {
        fake.create(&quadra_api::CreateTaskRequest {
            text: format!("task {i}"),
            quadrant: None,
            due_date: None,
            note: None,
        })
        .expect("seed create");
    }
    Session::load(fake).expect("load")
}

fn inbox_ids<T: TaskTransport>(session: &Session<T>) -> Vec<String> {
    session
        .board()
        .quadrant(Quadrant::Inbox)
        .iter()
        .map(|t| t.id.as_str().to_string())
        .collect()
}

fn id(raw: &str) -> TaskId {
    TaskId::parse(raw).expect("id")
}

/// Transport returning a fixed wire list; everything else is unreachable.
#[derive(Debug)]
struct ScriptedList(Vec<TaskDto>);

impl TaskTransport for ScriptedList {
    fn list(&self) -> Result<Vec<TaskDto>, TransportError> {
        Ok(self.0.clone())
    }
    fn create(
        &self,
        _: &quadra_api::CreateTaskRequest,
    ) -> Result<TaskDto, TransportError> {
        unreachable!("list-only transport")
    }
    fn update(
        &self,
        _: &str,
        _: &quadra_api::UpdateTaskRequest,
    ) -> Result<TaskDto, TransportError> {
        unreachable!("list-only transport")
    }
    fn bulk_reorder(
        &self,
        _: &quadra_api::BulkReorderRequest,
    ) -> Result<Vec<TaskDto>, TransportError> {
        unreachable!("list-only transport")
    }
    fn delete(&self, _: &str) -> Result<(), TransportError> {
        unreachable!("list-only transport")
    }
}

fn wire_task(raw_id: &str, order: u32) -> TaskDto {
    let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    task_to_dto(&Task::new(
        id(raw_id),
        TaskText::parse("seeded").unwrap(),
        Quadrant::Inbox,
        order,
        created,
    ))
}

#[test]
fn load_skips_undecodable_rows_but_keeps_the_rest() {
    let mut corrupt = wire_task("task-2", 1);
    corrupt.completed = true; // completed without completed_at
    let session =
        Session::load(ScriptedList(vec![wire_task("task-1", 0), corrupt])).expect("load");
    assert_eq!(session.tasks().len(), 1);
    assert_eq!(session.skipped_rows().len(), 1);
    assert_eq!(session.skipped_rows()[0].0, "task-2");
}

#[test]
fn load_fails_when_every_row_is_undecodable() {
    let mut corrupt = wire_task("task-1", 0);
    corrupt.text = String::new();
    let err = Session::load(ScriptedList(vec![corrupt])).unwrap_err();
    assert!(matches!(err, SessionError::LoadFailed(_)));
}

#[test]
fn add_rekeys_placeholder_to_server_id_without_duplication() {
    let mut session = Session::load(FakeTransport::new()).expect("load");
    let created = session
        .add(
            TaskText::parse("write minutes").unwrap(),
            Quadrant::Inbox,
            None,
            None,
        )
        .expect("add");

    assert_eq!(created.as_str(), "task-1");
    assert_eq!(session.tasks().len(), 1);
    assert!(!session.tasks()[0].id.is_placeholder());
    assert_eq!(session.tasks()[0].order, 0);
}

#[test]
fn failed_add_rolls_back_to_the_exact_snapshot() {
    let mut session = session_with(2);
    let snapshot = session.tasks().to_vec();

    // Next transport call (the create) fails.
    session_fail(&session, TransportError::Network("connection reset".to_string()));
    let err = session
        .add(TaskText::parse("doomed").unwrap(), Quadrant::Inbox, None, None)
        .unwrap_err();
    assert!(matches!(err, SessionError::Transport(_)));
    assert_eq!(session.tasks(), snapshot.as_slice());
}

fn session_fail(session: &Session<FakeTransport>, err: TransportError) {
    session.transport_ref().fail_next_call(err);
}

#[test]
fn edit_applies_locally_and_reconciles_with_server_row() {
    let mut session = session_with(1);
    let target = id("task-1");
    let patch = TaskPatch {
        note: Some(Some("remember the attachments".to_string())),
        is_waiting: Some(true),
        ..TaskPatch::default()
    };
    session.edit(&target, &patch).expect("edit");

    let task = session.get(&target).expect("present");
    assert_eq!(task.note.as_deref(), Some("remember the attachments"));
    assert!(task.is_waiting);
    // Server state agrees.
    let server = session.transport_ref().tasks();
    assert_eq!(server[0].note.as_deref(), Some("remember the attachments"));
}

#[test]
fn move_keeps_client_and_server_orderings_aligned() {
    let mut session = session_with(3);
    session
        .move_task(&id("task-2"), Quadrant::UrgentImportant)
        .expect("move");

    assert_eq!(inbox_ids(&session), vec!["task-1", "task-3"]);
    let moved = session.get(&id("task-2")).expect("present");
    assert_eq!(moved.quadrant, Quadrant::UrgentImportant);
    assert_eq!(moved.order, 0);

    let server = session.transport_ref().tasks();
    let server_moved = server.iter().find(|t| t.id == id("task-2")).unwrap();
    assert_eq!(server_moved.quadrant, Quadrant::UrgentImportant);
    assert_eq!(server_moved.order, 0);
}

#[test]
fn reorder_sends_the_full_quadrant_and_applies_it() {
    let mut session = session_with(3);
    session
        .reorder(
            Quadrant::Inbox,
            &[id("task-3"), id("task-1"), id("task-2")],
        )
        .expect("reorder");

    assert_eq!(inbox_ids(&session), vec!["task-3", "task-1", "task-2"]);
    assert!(session
        .transport_ref()
        .calls()
        .contains(&"bulk_reorder".to_string()));
}

#[test]
fn failed_reorder_rolls_back() {
    let mut session = session_with(3);
    let snapshot = session.tasks().to_vec();
    session_fail(&session, TransportError::Network("timeout".to_string()));

    let err = session
        .reorder(
            Quadrant::Inbox,
            &[id("task-3"), id("task-1"), id("task-2")],
        )
        .unwrap_err();
    assert!(matches!(err, SessionError::Transport(_)));
    assert_eq!(session.tasks(), snapshot.as_slice());
    assert_eq!(inbox_ids(&session), vec!["task-1", "task-2", "task-3"]);
}

#[test]
fn reorder_rejects_placeholder_ids() {
    let mut session = session_with(1);
    let err = session
        .reorder(Quadrant::Inbox, &[TaskId::placeholder(4)])
        .unwrap_err();
    assert!(matches!(err, SessionError::PlaceholderPending(_)));
}

#[test]
fn stale_reorder_acknowledgement_is_discarded() {
    let mut session = session_with(2);
    session
        .reorder(Quadrant::Inbox, &[id("task-2"), id("task-1")])
        .expect("reorder");

    // A response stamped with an older sequence must not overwrite state.
    let stale_rows = vec![wire_task("task-1", 0), wire_task("task-2", 1)];
    assert!(!session.apply_reorder_response(Quadrant::Inbox, 0, &stale_rows));
    assert_eq!(inbox_ids(&session), vec!["task-2", "task-1"]);

    // The current stamp is accepted.
    let current_rows: Vec<TaskDto> =
        session.transport_ref().tasks().iter().map(|t| task_to_dto(t)).collect();
    assert!(session.apply_reorder_response(Quadrant::Inbox, 1, &current_rows));
}

#[test]
fn complete_takes_the_server_timestamp() {
    let mut session = session_with(2);
    session.complete(&id("task-1")).expect("complete");

    let done = session.get(&id("task-1")).expect("present");
    assert!(done.completed);
    let server = session.transport_ref().tasks();
    let server_done = server.iter().find(|t| t.id == id("task-1")).unwrap();
    assert_eq!(done.completed_at, server_done.completed_at);
    assert_eq!(inbox_ids(&session), vec!["task-2"]);
}

#[test]
fn failed_complete_rolls_back() {
    let mut session = session_with(2);
    let snapshot = session.tasks().to_vec();
    session_fail(&session, TransportError::Network("timeout".to_string()));

    let err = session.complete(&id("task-1")).unwrap_err();
    assert!(matches!(err, SessionError::Transport(_)));
    assert_eq!(session.tasks(), snapshot.as_slice());
}

#[test]
fn restore_round_trips_through_completion() {
    let mut session = session_with(2);
    session.complete(&id("task-1")).expect("complete");
    session.restore(&id("task-1")).expect("restore");

    let restored = session.get(&id("task-1")).expect("present");
    assert!(!restored.completed);
    assert_eq!(restored.completed_at, None);
    assert_eq!(inbox_ids(&session), vec!["task-2", "task-1"]);
}

#[test]
fn delete_removes_everywhere_and_renumbers() {
    let mut session = session_with(3);
    session.delete(&id("task-1")).expect("delete");

    assert_eq!(inbox_ids(&session), vec!["task-2", "task-3"]);
    assert!(session.get(&id("task-1")).is_none());
    let server = session.transport_ref().tasks();
    assert_eq!(server.len(), 2);
    assert!(server.iter().all(|t| t.id != id("task-1")));
}

#[test]
fn engine_rejections_do_not_touch_the_transport() {
    let mut session = session_with(2);
    let calls_before = session.transport_ref().calls().len();
    let err = session
        .reorder(Quadrant::Inbox, &[id("task-1")])
        .unwrap_err();
    assert!(matches!(err, SessionError::Engine(_)));
    assert_eq!(session.transport_ref().calls().len(), calls_before);
}
