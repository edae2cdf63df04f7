//! User rows: CRUD, streak state writes, and completion evidence queries.
//!
//! Streak fields are only written by functions taking a [`rusqlite::Connection`]
//! obtained inside [`Database::with_user_lock`]; the public methods on
//! [`Database`] are read/create paths.

use super::Database;
use crate::types::{User, UserStats};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

pub(crate) fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        current_streak: row.get("current_streak")?,
        longest_streak: row.get("longest_streak")?,
        total_tasks_completed: row.get("total_tasks_completed")?,
        total_habits_completed: row.get("total_habits_completed")?,
        last_task_reset: row.get("last_task_reset")?,
        created_at: row.get("created_at")?,
    })
}

/// Load a user inside an open transaction.
pub(crate) fn get_user_in_tx(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1")?;

    match stmt.query_row(params![user_id], parse_user_row) {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write the user's streak pair inside an open transaction.
pub(crate) fn update_streak_in_tx(
    conn: &Connection,
    user_id: i64,
    current_streak: i64,
    longest_streak: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE users SET current_streak = ?1, longest_streak = ?2 WHERE id = ?3",
        params![current_streak, longest_streak, user_id],
    )?;
    Ok(())
}

/// Increment one of the monotonic completion counters.
pub(crate) fn increment_counter_in_tx(
    conn: &Connection,
    user_id: i64,
    column: CounterColumn,
) -> Result<()> {
    let sql = match column {
        CounterColumn::Tasks => {
            "UPDATE users SET total_tasks_completed = total_tasks_completed + 1 WHERE id = ?1"
        }
        CounterColumn::Habits => {
            "UPDATE users SET total_habits_completed = total_habits_completed + 1 WHERE id = ?1"
        }
    };
    conn.execute(sql, params![user_id])?;
    Ok(())
}

/// Which monotonic counter to bump.
#[derive(Debug, Clone, Copy)]
pub(crate) enum CounterColumn {
    Tasks,
    Habits,
}

/// Advance the sweep watermark inside an open transaction.
pub(crate) fn set_last_task_reset_in_tx(conn: &Connection, user_id: i64, now: i64) -> Result<()> {
    conn.execute(
        "UPDATE users SET last_task_reset = ?1 WHERE id = ?2",
        params![now, user_id],
    )?;
    Ok(())
}

/// Whether the user has any qualifying completion in `[window_start, window_end)`.
///
/// Evidence is the union of completed tasks and ticked habits; either source
/// keeps the user-level streak alive. The entity currently being completed is
/// excluded so it cannot count as evidence before its own write lands.
pub(crate) fn has_completion_in_window(
    conn: &Connection,
    user_id: i64,
    window_start: i64,
    window_end: i64,
    exclude_task: Option<i64>,
    exclude_habit: Option<i64>,
) -> Result<bool> {
    let found: bool = conn.query_row(
        "SELECT
            EXISTS(
                SELECT 1 FROM tasks
                WHERE user_id = ?1 AND status = 'completed'
                  AND completed_at >= ?2 AND completed_at < ?3
                  AND (?4 IS NULL OR id <> ?4)
            )
            OR
            EXISTS(
                SELECT 1 FROM habits
                WHERE user_id = ?1
                  AND last_checked_at >= ?2 AND last_checked_at < ?3
                  AND (?5 IS NULL OR id <> ?5)
            )",
        params![user_id, window_start, window_end, exclude_task, exclude_habit],
        |row| row.get(0),
    )?;

    Ok(found)
}

impl Database {
    /// Create a user with default streak state.
    pub fn create_user(&self, name: &str, now: i64) -> Result<User> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, created_at) VALUES (?1, ?2)",
                params![name, now],
            )?;
            let id = conn.last_insert_rowid();

            Ok(User {
                id,
                name: name.to_string(),
                current_streak: 0,
                longest_streak: 0,
                total_tasks_completed: 0,
                total_habits_completed: 0,
                last_task_reset: 0,
                created_at: now,
            })
        })
    }

    /// Get a user by ID.
    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| get_user_in_tx(conn, user_id))
    }

    /// Aggregate statistics for one user.
    pub fn get_user_stats(&self, user_id: i64) -> Result<Option<UserStats>> {
        self.with_conn(|conn| {
            let Some(user) = get_user_in_tx(conn, user_id)? else {
                return Ok(None);
            };

            let (pending, completed, failed): (i64, i64, i64) = conn.query_row(
                "SELECT
                    COALESCE(SUM(status = 'pending'), 0),
                    COALESCE(SUM(status = 'completed'), 0),
                    COALESCE(SUM(status = 'failed'), 0)
                 FROM tasks WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

            let habits: i64 = conn.query_row(
                "SELECT COUNT(*) FROM habits WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?;

            Ok(Some(UserStats {
                user_id: user.id,
                current_streak: user.current_streak,
                longest_streak: user.longest_streak,
                total_tasks_completed: user.total_tasks_completed,
                total_habits_completed: user.total_habits_completed,
                pending_tasks: pending,
                completed_tasks: completed,
                failed_tasks: failed,
                habits,
                last_task_reset: user.last_task_reset,
            }))
        })
    }
}
