// SPDX-License-Identifier: Apache-2.0

use quadra_engine::Board;
use quadra_model::{Quadrant, Task};

fn format_line(task: &Task) -> String {
    let mut line = format!("  [{:>2}] {}  {}", task.order, task.id, task.text);
    if task.is_waiting {
        line.push_str("  (waiting)");
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {}", due.format("%Y-%m-%d")));
    }
    if task.note.is_some() {
        line.push_str("  *");
    }
    line
}

/// Plain-text board: the five quadrant sections, then the finished list.
#[must_use]
pub fn render_board(board: &Board<'_>) -> String {
    let mut out = String::new();
    for quadrant in Quadrant::ALL {
        let tasks = board.quadrant(quadrant);
        out.push_str(&format!("{} ({})\n", quadrant.label(), tasks.len()));
        if tasks.is_empty() {
            out.push_str("  -\n");
        }
        for task in tasks {
            out.push_str(&format_line(task));
            out.push('\n');
        }
        out.push('\n');
    }

    let finished = board.finished();
    out.push_str(&format!("Finished ({})\n", finished.len()));
    if finished.is_empty() {
        out.push_str("  -\n");
    }
    for task in finished {
        let when = task
            .completed_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        out.push_str(&format!("  [x] {}  {}  {when}\n", task.id, task.text));
    }
    out
}

/// Single-task detail view for `show`.
#[must_use]
pub fn render_task(task: &Task) -> String {
    let mut out = String::new();
    out.push_str(&format!("id:        {}\n", task.id));
    out.push_str(&format!("text:      {}\n", task.text));
    out.push_str(&format!("quadrant:  {}\n", task.quadrant.as_str()));
    out.push_str(&format!("order:     {}\n", task.order));
    out.push_str(&format!("completed: {}\n", task.completed));
    out.push_str(&format!("waiting:   {}\n", task.is_waiting));
    out.push_str(&format!(
        "created:   {}\n",
        task.created_at.format("%Y-%m-%d %H:%M")
    ));
    if let Some(at) = task.completed_at {
        out.push_str(&format!("finished:  {}\n", at.format("%Y-%m-%d %H:%M")));
    }
    if let Some(due) = task.due_date {
        out.push_str(&format!("due:       {}\n", due.format("%Y-%m-%d")));
    }
    if let Some(note) = &task.note {
        out.push_str(&format!("note:      {note}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use quadra_model::{TaskId, TaskText};

    #[test]
    fn board_lists_all_sections_even_when_empty() {
        let tasks: Vec<Task> = Vec::new();
        let board = Board::derive(&tasks);
        let text = render_board(&board);
        for quadrant in Quadrant::ALL {
            assert!(text.contains(quadrant.label()));
        }
        assert!(text.contains("Finished (0)"));
    }

    #[test]
    fn waiting_and_due_markers_show_up() {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut task = Task::new(
            TaskId::parse("task-1").unwrap(),
            TaskText::parse("chase invoice").unwrap(),
            Quadrant::UrgentImportant,
            0,
            created,
        );
        task.is_waiting = true;
        task.due_date = Some(created);
        let tasks = vec![task];
        let text = render_board(&Board::derive(&tasks));
        assert!(text.contains("(waiting)"));
        assert!(text.contains("due 2026-03-01"));
    }
}
