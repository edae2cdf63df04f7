//! Task rows: CRUD and the conditional writes used by completion and sweep.

use super::Database;
use crate::error::EngineError;
use crate::types::{Task, TaskStatus};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;

    Ok(Task {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        // Unknown status text would mean external schema tampering; surface
        // it as a type error rather than guessing.
        status: TaskStatus::from_str(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown task status: {}", status).into(),
            )
        })?,
        is_missed: row.get::<_, i64>("is_missed")? != 0,
        created_at: row.get("created_at")?,
        completed_at: row.get("completed_at")?,
    })
}

/// Load a task inside an open transaction.
pub(crate) fn get_task_in_tx(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    match stmt.query_row(params![task_id], parse_task_row) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Mark a pending task completed inside an open transaction.
///
/// Guarded on `status = 'pending'` so a terminal task can never be flipped
/// even if validation raced something outside this transaction.
pub(crate) fn mark_completed_in_tx(conn: &Connection, task_id: i64, now: i64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE tasks SET status = 'completed', completed_at = ?1
         WHERE id = ?2 AND status = 'pending'",
        params![now, task_id],
    )?;

    if updated != 1 {
        return Err(EngineError::invalid_state(format!(
            "task {} was not pending at write time",
            task_id
        ))
        .into());
    }
    Ok(())
}

/// Fail every pending task created before `cutoff`, marking it missed.
/// Returns the number of tasks failed.
pub(crate) fn fail_stale_pending_in_tx(
    conn: &Connection,
    user_id: i64,
    cutoff: i64,
) -> Result<i64> {
    let failed = conn.execute(
        "UPDATE tasks SET status = 'failed', is_missed = 1
         WHERE user_id = ?1 AND status = 'pending' AND created_at < ?2",
        params![user_id, cutoff],
    )?;

    Ok(failed as i64)
}

impl Database {
    /// Create a pending task for a user.
    pub fn create_task(&self, user_id: i64, title: &str, now: i64) -> Result<Task> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (user_id, title, status, created_at) VALUES (?1, ?2, 'pending', ?3)",
                params![user_id, title, now],
            )?;
            let id = conn.last_insert_rowid();

            Ok(Task {
                id,
                user_id,
                title: title.to_string(),
                status: TaskStatus::Pending,
                is_missed: false,
                created_at: now,
                completed_at: None,
            })
        })
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_in_tx(conn, task_id))
    }

    /// List a user's tasks, optionally filtered by status, newest first.
    pub fn list_tasks(&self, user_id: i64, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let tasks = match status {
                Some(status) => {
                    let mut stmt = conn.prepare(
                        "SELECT * FROM tasks WHERE user_id = ?1 AND status = ?2
                         ORDER BY created_at DESC, id DESC",
                    )?;
                    stmt.query_map(params![user_id, status.as_str()], parse_task_row)?
                        .collect::<Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT * FROM tasks WHERE user_id = ?1
                         ORDER BY created_at DESC, id DESC",
                    )?;
                    stmt.query_map(params![user_id], parse_task_row)?
                        .collect::<Result<Vec<_>, _>>()?
                }
            };

            Ok(tasks)
        })
    }
}
