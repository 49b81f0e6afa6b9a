// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use quadra_model::{Quadrant, Task, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    NotFound(TaskId),
    AlreadyCompleted(TaskId),
    NotCompleted(TaskId),
    SequenceMismatch(Quadrant),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "no task with id {id}"),
            Self::AlreadyCompleted(id) => write!(f, "task {id} is already completed"),
            Self::NotCompleted(id) => write!(f, "task {id} is not completed"),
            Self::SequenceMismatch(q) => write!(
                f,
                "reorder sequence is not a permutation of the active tasks in {q}"
            ),
        }
    }
}

impl std::error::Error for EngineError {}

/// A row whose persisted `order` changed as part of a transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderChange {
    pub id: TaskId,
    pub order: u32,
}

/// Density violation found by [`check_density`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityError {
    pub quadrant: Quadrant,
    pub orders: Vec<u32>,
}

impl Display for DensityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "active order values in {} are not dense: {:?}",
            self.quadrant, self.orders
        )
    }
}

impl std::error::Error for DensityError {}

fn active_count(tasks: &[Task], quadrant: Quadrant) -> u32 {
    tasks
        .iter()
        .filter(|t| !t.completed && t.quadrant == quadrant)
        .count() as u32
}

fn position_of(tasks: &[Task], id: &TaskId) -> Result<usize, EngineError> {
    tasks
        .iter()
        .position(|t| &t.id == id)
        .ok_or_else(|| EngineError::NotFound(id.clone()))
}

/// Close the gap left at `removed_order` in a quadrant's active sequence.
/// Returns the rows whose `order` moved.
fn renumber_after_removal(
    tasks: &mut [Task],
    quadrant: Quadrant,
    removed_order: u32,
) -> Vec<OrderChange> {
    let mut changes = Vec::new();
    for task in tasks.iter_mut() {
        if !task.completed && task.quadrant == quadrant && task.order > removed_order {
            task.order -= 1;
            changes.push(OrderChange {
                id: task.id.clone(),
                order: task.order,
            });
        }
    }
    changes
}

/// Append a task at the end of its quadrant's active sequence.
///
/// Overwrites `task.order` with the append position and returns it.
pub fn append(tasks: &mut Vec<Task>, mut task: Task) -> u32 {
    let order = active_count(tasks, task.quadrant);
    task.order = order;
    tasks.push(task);
    order
}

/// Move an active task to the end of another quadrant, renumbering the
/// source quadrant immediately so it never stays sparse.
///
/// Moving a task to its current quadrant is a no-op.
pub fn move_to(
    tasks: &mut [Task],
    id: &TaskId,
    to: Quadrant,
) -> Result<Vec<OrderChange>, EngineError> {
    let pos = position_of(tasks, id)?;
    if tasks[pos].completed {
        return Err(EngineError::AlreadyCompleted(id.clone()));
    }
    let from = tasks[pos].quadrant;
    if from == to {
        return Ok(Vec::new());
    }

    let old_order = tasks[pos].order;
    let dest_order = active_count(tasks, to);
    tasks[pos].quadrant = to;
    tasks[pos].order = dest_order;

    let mut changes = vec![OrderChange {
        id: id.clone(),
        order: dest_order,
    }];
    changes.extend(renumber_after_removal(tasks, from, old_order));
    Ok(changes)
}

/// Apply an externally computed total order to one quadrant.
///
/// `desired` must be a permutation of the quadrant's active ids; this is the
/// only transform accepting external input, so it is the only fallible
/// ordering assignment. Returns only the rows whose `order` actually moved.
pub fn reorder(
    tasks: &mut [Task],
    quadrant: Quadrant,
    desired: &[TaskId],
) -> Result<Vec<OrderChange>, EngineError> {
    let current: BTreeSet<&TaskId> = tasks
        .iter()
        .filter(|t| !t.completed && t.quadrant == quadrant)
        .map(|t| &t.id)
        .collect();
    let requested: BTreeSet<&TaskId> = desired.iter().collect();
    if desired.len() != current.len() || requested != current {
        return Err(EngineError::SequenceMismatch(quadrant));
    }

    let mut changes = Vec::new();
    for (index, id) in desired.iter().enumerate() {
        let pos = position_of(tasks, id)?;
        let order = index as u32;
        if tasks[pos].order != order {
            tasks[pos].order = order;
            changes.push(OrderChange {
                id: id.clone(),
                order,
            });
        }
    }
    Ok(changes)
}

/// Complete an active task: set `completed`/`completed_at` and close the gap
/// in its quadrant. The finished list is derived from `completed_at`, so no
/// other finished row is rewritten. Returns the renumbered survivors.
pub fn complete(
    tasks: &mut [Task],
    id: &TaskId,
    completed_at: DateTime<Utc>,
) -> Result<Vec<OrderChange>, EngineError> {
    let pos = position_of(tasks, id)?;
    if tasks[pos].completed {
        return Err(EngineError::AlreadyCompleted(id.clone()));
    }
    let quadrant = tasks[pos].quadrant;
    let old_order = tasks[pos].order;
    tasks[pos].completed = true;
    tasks[pos].completed_at = Some(completed_at);
    Ok(renumber_after_removal(tasks, quadrant, old_order))
}

/// Restore a completed task to the end of the quadrant it held at
/// completion time.
pub fn restore(tasks: &mut [Task], id: &TaskId) -> Result<OrderChange, EngineError> {
    let pos = position_of(tasks, id)?;
    if !tasks[pos].completed {
        return Err(EngineError::NotCompleted(id.clone()));
    }
    let quadrant = tasks[pos].quadrant;
    let order = active_count(tasks, quadrant);
    tasks[pos].completed = false;
    tasks[pos].completed_at = None;
    tasks[pos].order = order;
    Ok(OrderChange {
        id: id.clone(),
        order,
    })
}

/// Permanently remove a task. Active siblings are renumbered densely.
pub fn remove(tasks: &mut Vec<Task>, id: &TaskId) -> Result<Vec<OrderChange>, EngineError> {
    let pos = position_of(tasks, id)?;
    let removed = tasks.remove(pos);
    if removed.completed {
        return Ok(Vec::new());
    }
    Ok(renumber_after_removal(
        tasks,
        removed.quadrant,
        removed.order,
    ))
}

/// Verify the density invariant: per quadrant, active `order` values are
/// exactly `{0..n-1}` with no duplicates.
pub fn check_density(tasks: &[Task]) -> Result<(), DensityError> {
    for quadrant in Quadrant::ALL {
        let mut orders: Vec<u32> = tasks
            .iter()
            .filter(|t| !t.completed && t.quadrant == quadrant)
            .map(|t| t.order)
            .collect();
        orders.sort_unstable();
        let dense = orders
            .iter()
            .enumerate()
            .all(|(i, order)| *order == i as u32);
        if !dense {
            return Err(DensityError { quadrant, orders });
        }
    }
    Ok(())
}
