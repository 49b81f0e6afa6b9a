// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use quadra_model::{Quadrant, Task};

/// Derived per-quadrant view of the flat task collection.
///
/// The board is never a source of truth: it borrows from the collection it
/// was derived from and is recomputed whenever the collection changes.
#[derive(Debug)]
pub struct Board<'a> {
    quadrants: BTreeMap<Quadrant, Vec<&'a Task>>,
    finished: Vec<&'a Task>,
}

impl<'a> Board<'a> {
    /// Partition active tasks by quadrant (ascending `order`, ties by id)
    /// and collect the finished list (newest completion first, ties by id).
    #[must_use]
    pub fn derive(tasks: &'a [Task]) -> Self {
        let mut quadrants: BTreeMap<Quadrant, Vec<&'a Task>> =
            Quadrant::ALL.iter().map(|q| (*q, Vec::new())).collect();
        let mut finished: Vec<&'a Task> = Vec::new();

        for task in tasks {
            if task.completed {
                finished.push(task);
            } else if let Some(slot) = quadrants.get_mut(&task.quadrant) {
                slot.push(task);
            }
        }

        for slot in quadrants.values_mut() {
            slot.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        }
        finished.sort_by(|a, b| {
            b.completed_at
                .cmp(&a.completed_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Self { quadrants, finished }
    }

    /// Active tasks of one quadrant in display order.
    #[must_use]
    pub fn quadrant(&self, quadrant: Quadrant) -> &[&'a Task] {
        self.quadrants
            .get(&quadrant)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Completed tasks, newest completion first.
    #[must_use]
    pub fn finished(&self) -> &[&'a Task] {
        &self.finished
    }

    #[must_use]
    pub fn active_len(&self, quadrant: Quadrant) -> usize {
        self.quadrant(quadrant).len()
    }
}
