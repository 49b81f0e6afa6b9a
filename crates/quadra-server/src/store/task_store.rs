// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Mutex;

use quadra_api::{NewTask, OrderUpdate, TaskPatch};
use quadra_model::{Quadrant, Task, TaskId, TaskText};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  public_id TEXT NOT NULL UNIQUE,
  text TEXT NOT NULL,
  quadrant TEXT NOT NULL,
  ord INTEGER NOT NULL,
  completed INTEGER NOT NULL DEFAULT 0,
  is_waiting INTEGER NOT NULL DEFAULT 0,
  created_at_ms INTEGER NOT NULL,
  completed_at_ms INTEGER,
  due_date_ms INTEGER,
  note TEXT
);
CREATE INDEX IF NOT EXISTS idx_tasks_board ON tasks(quadrant, completed, ord);
";

const TASK_COLUMNS: &str =
    "public_id, text, quadrant, ord, completed, is_waiting, created_at_ms, completed_at_ms, due_date_ms, note";

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    NotFound(String),
    Constraint(String),
    Corrupt(String),
    Sqlite(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "no task with id {id}"),
            Self::Constraint(msg) => write!(f, "constraint violated: {msg}"),
            Self::Corrupt(msg) => write!(f, "stored row is undecodable: {msg}"),
            Self::Sqlite(msg) => write!(f, "sqlite failure: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value.to_string())
    }
}

fn ms_to_datetime(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {ms}")))
}

/// Single-writer task table. The connection is mutex-guarded; every
/// multi-row mutation runs inside one transaction so a mid-batch failure
/// can never leave a quadrant's order values torn.
pub struct TaskStore {
    conn: Mutex<Connection>,
}

impl TaskStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock means a prior panic mid-statement; the connection
        // itself is still usable and rolls back any open transaction.
        self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// All tasks, board order: active before finished, then quadrant, then
    /// position.
    pub fn list_all(&self) -> Result<Vec<Task>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY completed, quadrant, ord, public_id"
        ))?;
        let rows = stmt.query_map([], row_to_task)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row??);
        }
        Ok(tasks)
    }

    pub fn get(&self, id: &TaskId) -> Result<Task, StoreError> {
        let conn = self.lock();
        get_in(&conn, id)
    }

    /// Insert a new task at the end of its quadrant's active sequence.
    ///
    /// The position is computed inside the insert transaction, so two
    /// concurrent creates cannot collide on `ord`.
    pub fn insert(&self, new_task: &NewTask, now: DateTime<Utc>) -> Result<Task, StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let ord: u32 = tx.query_row(
            "SELECT COUNT(*) FROM tasks WHERE quadrant = ?1 AND completed = 0",
            params![new_task.quadrant.as_str()],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO tasks (public_id, text, quadrant, ord, completed, is_waiting, created_at_ms, completed_at_ms, due_date_ms, note)
             VALUES ('', ?1, ?2, ?3, 0, 0, ?4, NULL, ?5, ?6)",
            params![
                new_task.text.as_str(),
                new_task.quadrant.as_str(),
                ord,
                now.timestamp_millis(),
                new_task.due_date.map(|d| d.timestamp_millis()),
                new_task.note,
            ],
        )?;
        let rowid = tx.last_insert_rowid();
        let public_id = format!("task-{rowid}");
        tx.execute(
            "UPDATE tasks SET public_id = ?1 WHERE id = ?2",
            params![public_id, rowid],
        )?;
        let task = get_by_public_id(&tx, &public_id)?
            .ok_or_else(|| StoreError::Sqlite("inserted row vanished".to_string()))?;
        tx.commit()?;
        Ok(task)
    }

    /// Apply a validated partial update. Quadrant changes re-append at the
    /// end of the destination and renumber the source; completion
    /// transitions set or clear `completed_at` and keep the active
    /// orderings dense. Repeating an update with identical values is a
    /// no-op.
    pub fn update_fields(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Task, StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let mut current = get_in(&tx, id)?;

        if let Some(to) = patch.quadrant {
            if to != current.quadrant {
                if current.completed {
                    // Retained quadrant of a finished task: plain column
                    // update, no active ordering is touched.
                    tx.execute(
                        "UPDATE tasks SET quadrant = ?1 WHERE public_id = ?2",
                        params![to.as_str(), id.as_str()],
                    )?;
                } else {
                    let dest_ord: u32 = tx.query_row(
                        "SELECT COUNT(*) FROM tasks WHERE quadrant = ?1 AND completed = 0",
                        params![to.as_str()],
                        |row| row.get(0),
                    )?;
                    tx.execute(
                        "UPDATE tasks SET quadrant = ?1, ord = ?2 WHERE public_id = ?3",
                        params![to.as_str(), dest_ord, id.as_str()],
                    )?;
                    close_gap(&tx, current.quadrant, current.order)?;
                }
                current = get_in(&tx, id)?;
            }
        }

        match patch.completed {
            Some(true) if !current.completed => {
                tx.execute(
                    "UPDATE tasks SET completed = 1, completed_at_ms = ?1 WHERE public_id = ?2",
                    params![now.timestamp_millis(), id.as_str()],
                )?;
                close_gap(&tx, current.quadrant, current.order)?;
            }
            Some(false) if current.completed => {
                let ord: u32 = tx.query_row(
                    "SELECT COUNT(*) FROM tasks WHERE quadrant = ?1 AND completed = 0",
                    params![current.quadrant.as_str()],
                    |row| row.get(0),
                )?;
                tx.execute(
                    "UPDATE tasks SET completed = 0, completed_at_ms = NULL, ord = ?1 WHERE public_id = ?2",
                    params![ord, id.as_str()],
                )?;
            }
            _ => {}
        }

        if let Some(text) = &patch.text {
            tx.execute(
                "UPDATE tasks SET text = ?1 WHERE public_id = ?2",
                params![text.as_str(), id.as_str()],
            )?;
        }
        if let Some(is_waiting) = patch.is_waiting {
            tx.execute(
                "UPDATE tasks SET is_waiting = ?1 WHERE public_id = ?2",
                params![is_waiting, id.as_str()],
            )?;
        }
        if let Some(due_date) = patch.due_date {
            tx.execute(
                "UPDATE tasks SET due_date_ms = ?1 WHERE public_id = ?2",
                params![due_date.map(|d| d.timestamp_millis()), id.as_str()],
            )?;
        }
        if let Some(note) = &patch.note {
            tx.execute(
                "UPDATE tasks SET note = ?1 WHERE public_id = ?2",
                params![note, id.as_str()],
            )?;
        }

        let task = get_in(&tx, id)?;
        tx.commit()?;
        Ok(task)
    }

    /// Apply a batch of order updates atomically: every id is resolved
    /// before anything is written, and all writes share one transaction.
    pub fn apply_order_updates(&self, updates: &[OrderUpdate]) -> Result<Vec<Task>, StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        for update in updates {
            let current = get_in(&tx, &update.id)?;
            if update.completed_at.is_some() && !current.completed {
                return Err(StoreError::Constraint(format!(
                    "completed_at supplied for active task {}",
                    update.id
                )));
            }
        }
        for update in updates {
            match update.completed_at {
                Some(at) => {
                    tx.execute(
                        "UPDATE tasks SET ord = ?1, completed_at_ms = ?2 WHERE public_id = ?3",
                        params![update.order, at.timestamp_millis(), update.id.as_str()],
                    )?;
                }
                None => {
                    tx.execute(
                        "UPDATE tasks SET ord = ?1 WHERE public_id = ?2",
                        params![update.order, update.id.as_str()],
                    )?;
                }
            }
        }
        let mut tasks = Vec::with_capacity(updates.len());
        for update in updates {
            tasks.push(get_in(&tx, &update.id)?);
        }
        tx.commit()?;
        Ok(tasks)
    }

    /// Permanent removal. Active siblings are renumbered in the same
    /// transaction.
    pub fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let current = get_in(&tx, id)?;
        tx.execute(
            "DELETE FROM tasks WHERE public_id = ?1",
            params![id.as_str()],
        )?;
        if !current.completed {
            close_gap(&tx, current.quadrant, current.order)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Cheap readiness probe.
    pub fn ping(&self) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

fn close_gap(tx: &Transaction<'_>, quadrant: Quadrant, removed_ord: u32) -> Result<(), StoreError> {
    tx.execute(
        "UPDATE tasks SET ord = ord - 1 WHERE quadrant = ?1 AND completed = 0 AND ord > ?2",
        params![quadrant.as_str(), removed_ord],
    )?;
    Ok(())
}

fn get_in(conn: &Connection, id: &TaskId) -> Result<Task, StoreError> {
    get_by_public_id(conn, id.as_str())?.ok_or_else(|| StoreError::NotFound(id.to_string()))
}

fn get_by_public_id(conn: &Connection, public_id: &str) -> Result<Option<Task>, StoreError> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE public_id = ?1"),
        params![public_id],
        row_to_task,
    )
    .optional()?
    .transpose()
}

type RowResult = Result<Task, StoreError>;

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<RowResult> {
    let public_id: String = row.get(0)?;
    let text: String = row.get(1)?;
    let quadrant: String = row.get(2)?;
    let ord: u32 = row.get(3)?;
    let completed: bool = row.get(4)?;
    let is_waiting: bool = row.get(5)?;
    let created_at_ms: i64 = row.get(6)?;
    let completed_at_ms: Option<i64> = row.get(7)?;
    let due_date_ms: Option<i64> = row.get(8)?;
    let note: Option<String> = row.get(9)?;

    Ok(decode_task(
        public_id,
        text,
        quadrant,
        ord,
        completed,
        is_waiting,
        created_at_ms,
        completed_at_ms,
        due_date_ms,
        note,
    ))
}

fn decode_task(
    public_id: String,
    text: String,
    quadrant: String,
    ord: u32,
    completed: bool,
    is_waiting: bool,
    created_at_ms: i64,
    completed_at_ms: Option<i64>,
    due_date_ms: Option<i64>,
    note: Option<String>,
) -> RowResult {
    let task = Task {
        id: TaskId::parse(&public_id).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        text: TaskText::parse(&text).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        quadrant: Quadrant::parse(&quadrant).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        order: ord,
        completed,
        is_waiting,
        created_at: ms_to_datetime(created_at_ms)?,
        completed_at: completed_at_ms.map(ms_to_datetime).transpose()?,
        due_date: due_date_ms.map(ms_to_datetime).transpose()?,
        note,
    };
    task.validate()
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    Ok(task)
}
