use super::*;
use chrono::{DateTime, TimeZone, Utc};
use quadra_model::{Quadrant, Task, TaskId, TaskText};

fn ts(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap()
}

fn id(raw: &str) -> TaskId {
    TaskId::parse(raw).expect("task id")
}

fn task(raw_id: &str, text: &str, quadrant: Quadrant, order: u32) -> Task {
    Task::new(
        id(raw_id),
        TaskText::parse(text).expect("text"),
        quadrant,
        order,
        ts(0),
    )
}

fn inbox_fixture() -> Vec<Task> {
    // Three creates into inbox yield orders 0, 1, 2.
    let mut tasks = Vec::new();
    for (i, name) in ["t1", "t2", "t3"].iter().enumerate() {
        let order = append(&mut tasks, task(name, &format!("task {name}"), Quadrant::Inbox, 99));
        assert_eq!(order, i as u32);
    }
    tasks
}

fn orders_in(tasks: &[Task], quadrant: Quadrant) -> Vec<(String, u32)> {
    let board = Board::derive(tasks);
    board
        .quadrant(quadrant)
        .iter()
        .map(|t| (t.id.as_str().to_string(), t.order))
        .collect()
}

#[test]
fn append_assigns_sequential_orders_per_quadrant() {
    let tasks = inbox_fixture();
    assert_eq!(
        orders_in(&tasks, Quadrant::Inbox),
        vec![
            ("t1".to_string(), 0),
            ("t2".to_string(), 1),
            ("t3".to_string(), 2)
        ]
    );
    check_density(&tasks).expect("dense after appends");
}

#[test]
fn move_appends_to_destination_and_redensifies_source() {
    let mut tasks = inbox_fixture();
    let changes = move_to(&mut tasks, &id("t2"), Quadrant::UrgentImportant).expect("move");

    assert_eq!(
        orders_in(&tasks, Quadrant::UrgentImportant),
        vec![("t2".to_string(), 0)]
    );
    assert_eq!(
        orders_in(&tasks, Quadrant::Inbox),
        vec![("t1".to_string(), 0), ("t3".to_string(), 1)]
    );
    // Moved row plus the one inbox survivor that shifted.
    assert_eq!(changes.len(), 2);
    check_density(&tasks).expect("dense after move");
}

#[test]
fn move_to_same_quadrant_is_a_no_op() {
    let mut tasks = inbox_fixture();
    let before = tasks.clone();
    let changes = move_to(&mut tasks, &id("t2"), Quadrant::Inbox).expect("move");
    assert!(changes.is_empty());
    assert_eq!(tasks, before);
}

#[test]
fn complete_removes_from_active_ordering_exactly_once() {
    let mut tasks = inbox_fixture();
    complete(&mut tasks, &id("t1"), ts(5)).expect("complete");

    let board = Board::derive(&tasks);
    assert_eq!(
        orders_in(&tasks, Quadrant::Inbox),
        vec![("t2".to_string(), 0), ("t3".to_string(), 1)]
    );
    assert_eq!(board.finished().len(), 1);
    assert_eq!(board.finished()[0].id.as_str(), "t1");
    assert!(board.finished()[0].completed);
    assert_eq!(board.finished()[0].completed_at, Some(ts(5)));
    check_density(&tasks).expect("dense after complete");
}

#[test]
fn completing_a_completed_task_is_rejected() {
    let mut tasks = inbox_fixture();
    complete(&mut tasks, &id("t1"), ts(5)).expect("complete");
    assert_eq!(
        complete(&mut tasks, &id("t1"), ts(6)),
        Err(EngineError::AlreadyCompleted(id("t1")))
    );
}

#[test]
fn restore_returns_task_to_end_of_retained_quadrant() {
    let mut tasks = inbox_fixture();
    complete(&mut tasks, &id("t1"), ts(5)).expect("complete");
    let change = restore(&mut tasks, &id("t1")).expect("restore");

    assert_eq!(change, OrderChange { id: id("t1"), order: 2 });
    assert_eq!(
        orders_in(&tasks, Quadrant::Inbox),
        vec![
            ("t2".to_string(), 0),
            ("t3".to_string(), 1),
            ("t1".to_string(), 2)
        ]
    );
    let restored = tasks.iter().find(|t| t.id == id("t1")).unwrap();
    assert!(!restored.completed);
    assert_eq!(restored.completed_at, None);
    assert!(Board::derive(&tasks).finished().is_empty());
}

#[test]
fn restore_keeps_quadrant_held_at_completion_time() {
    let mut tasks = inbox_fixture();
    move_to(&mut tasks, &id("t2"), Quadrant::NotUrgentImportant).expect("move");
    complete(&mut tasks, &id("t2"), ts(5)).expect("complete");
    restore(&mut tasks, &id("t2")).expect("restore");

    assert_eq!(
        orders_in(&tasks, Quadrant::NotUrgentImportant),
        vec![("t2".to_string(), 0)]
    );
}

#[test]
fn reorder_assigns_index_positions() {
    // Move t2 away, complete then restore t1, so the inbox already reads
    // [t3, t1]. Confirming that order is a no-op; inverting it rewrites
    // both rows.
    let mut tasks = inbox_fixture();
    move_to(&mut tasks, &id("t2"), Quadrant::UrgentImportant).expect("move");
    complete(&mut tasks, &id("t1"), ts(5)).expect("complete");
    restore(&mut tasks, &id("t1")).expect("restore");

    let changes =
        reorder(&mut tasks, Quadrant::Inbox, &[id("t3"), id("t1")]).expect("reorder");
    assert!(changes.is_empty());
    assert_eq!(
        orders_in(&tasks, Quadrant::Inbox),
        vec![("t3".to_string(), 0), ("t1".to_string(), 1)]
    );

    let changes =
        reorder(&mut tasks, Quadrant::Inbox, &[id("t1"), id("t3")]).expect("reorder");
    assert_eq!(changes.len(), 2);
    assert_eq!(
        orders_in(&tasks, Quadrant::Inbox),
        vec![("t1".to_string(), 0), ("t3".to_string(), 1)]
    );
    check_density(&tasks).expect("dense after reorder");
}

#[test]
fn reorder_reports_only_rows_that_moved() {
    let mut tasks = inbox_fixture();
    let changes = reorder(
        &mut tasks,
        Quadrant::Inbox,
        &[id("t1"), id("t3"), id("t2")],
    )
    .expect("reorder");
    assert_eq!(
        changes,
        vec![
            OrderChange { id: id("t3"), order: 1 },
            OrderChange { id: id("t2"), order: 2 }
        ]
    );
}

#[test]
fn reorder_rejects_non_permutations() {
    let mut tasks = inbox_fixture();

    // Missing member.
    assert_eq!(
        reorder(&mut tasks, Quadrant::Inbox, &[id("t1"), id("t2")]),
        Err(EngineError::SequenceMismatch(Quadrant::Inbox))
    );
    // Duplicate member.
    assert_eq!(
        reorder(
            &mut tasks,
            Quadrant::Inbox,
            &[id("t1"), id("t1"), id("t2")]
        ),
        Err(EngineError::SequenceMismatch(Quadrant::Inbox))
    );
    // Foreign member.
    assert_eq!(
        reorder(
            &mut tasks,
            Quadrant::Inbox,
            &[id("t1"), id("t2"), id("t9")]
        ),
        Err(EngineError::SequenceMismatch(Quadrant::Inbox))
    );
    // State untouched by rejected reorders.
    assert_eq!(
        orders_in(&tasks, Quadrant::Inbox),
        vec![
            ("t1".to_string(), 0),
            ("t2".to_string(), 1),
            ("t3".to_string(), 2)
        ]
    );
}

#[test]
fn remove_renumbers_survivors_densely() {
    let mut tasks = inbox_fixture();
    let changes = remove(&mut tasks, &id("t1")).expect("remove");
    assert_eq!(changes.len(), 2);
    assert_eq!(
        orders_in(&tasks, Quadrant::Inbox),
        vec![("t2".to_string(), 0), ("t3".to_string(), 1)]
    );
    assert!(tasks.iter().all(|t| t.id != id("t1")));
    check_density(&tasks).expect("dense after remove");
}

#[test]
fn remove_of_completed_task_touches_no_active_order() {
    let mut tasks = inbox_fixture();
    complete(&mut tasks, &id("t2"), ts(5)).expect("complete");
    let changes = remove(&mut tasks, &id("t2")).expect("remove");
    assert!(changes.is_empty());
    assert_eq!(
        orders_in(&tasks, Quadrant::Inbox),
        vec![("t1".to_string(), 0), ("t3".to_string(), 1)]
    );
}

#[test]
fn finished_list_is_newest_completion_first() {
    let mut tasks = inbox_fixture();
    complete(&mut tasks, &id("t1"), ts(1)).expect("complete");
    complete(&mut tasks, &id("t3"), ts(9)).expect("complete");
    complete(&mut tasks, &id("t2"), ts(4)).expect("complete");

    let board = Board::derive(&tasks);
    let finished: Vec<&str> = board.finished().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(finished, vec!["t3", "t2", "t1"]);
}

#[test]
fn unknown_ids_are_rejected_by_every_transform() {
    let mut tasks = inbox_fixture();
    let ghost = id("ghost");
    assert_eq!(
        move_to(&mut tasks, &ghost, Quadrant::Inbox),
        Err(EngineError::NotFound(ghost.clone()))
    );
    assert_eq!(
        complete(&mut tasks, &ghost, ts(1)),
        Err(EngineError::NotFound(ghost.clone()))
    );
    assert_eq!(restore(&mut tasks, &ghost), Err(EngineError::NotFound(ghost.clone())));
    assert_eq!(remove(&mut tasks, &ghost), Err(EngineError::NotFound(ghost)));
}

#[test]
fn density_holds_across_mixed_operation_sequences() {
    let mut tasks = Vec::new();
    for i in 0..12 {
        let quadrant = Quadrant::ALL[i % Quadrant::ALL.len()];
        append(&mut tasks, task(&format!("t{i}"), &format!("task {i}"), quadrant, 0));
    }
    check_density(&tasks).expect("dense after seed");

    for i in 0..12 {
        let target = id(&format!("t{i}"));
        match i % 4 {
            0 => {
                move_to(&mut tasks, &target, Quadrant::ALL[(i + 2) % 5]).expect("move");
            }
            1 => {
                complete(&mut tasks, &target, ts(i as u32)).expect("complete");
            }
            2 => {
                remove(&mut tasks, &target).expect("remove");
            }
            _ => {
                let desired: Vec<TaskId> = {
                    let board = Board::derive(&tasks);
                    let mut ids: Vec<TaskId> = board
                        .quadrant(Quadrant::Inbox)
                        .iter()
                        .map(|t| t.id.clone())
                        .collect();
                    ids.reverse();
                    ids
                };
                reorder(&mut tasks, Quadrant::Inbox, &desired).expect("reorder");
            }
        }
        check_density(&tasks).expect("dense after every step");
    }

    for i in 0..12 {
        let target = id(&format!("t{i}"));
        if tasks.iter().any(|t| t.id == target && t.completed) {
            restore(&mut tasks, &target).expect("restore");
            check_density(&tasks).expect("dense after restore");
        }
    }
}

#[test]
fn derive_is_pure_and_repeatable() {
    let tasks = inbox_fixture();
    let first: Vec<String> = Board::derive(&tasks)
        .quadrant(Quadrant::Inbox)
        .iter()
        .map(|t| t.id.as_str().to_string())
        .collect();
    let second: Vec<String> = Board::derive(&tasks)
        .quadrant(Quadrant::Inbox)
        .iter()
        .map(|t| t.id.as_str().to_string())
        .collect();
    assert_eq!(first, second);
}
