//! Habit rows: CRUD and tick recording.
//!
//! The milestone set is stored as a JSON integer array in the `milestones`
//! column and deserialized alongside the row.

use super::Database;
use crate::error::EngineError;
use crate::types::{Habit, HabitKind};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

pub(crate) fn parse_habit_row(row: &Row) -> rusqlite::Result<Habit> {
    let kind: String = row.get("kind")?;
    let milestones_json: String = row.get("milestones")?;

    Ok(Habit {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        kind: HabitKind::from_str(&kind).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown habit kind: {}", kind).into(),
            )
        })?,
        interval_days: row.get("interval_days")?,
        streak_days: row.get("streak_days")?,
        longest_streak: row.get("longest_streak")?,
        last_checked_at: row.get("last_checked_at")?,
        total_completions: row.get("total_completions")?,
        milestones: serde_json::from_str(&milestones_json).unwrap_or_default(),
        created_at: row.get("created_at")?,
    })
}

/// Load a habit inside an open transaction.
pub(crate) fn get_habit_in_tx(conn: &Connection, habit_id: i64) -> Result<Option<Habit>> {
    let mut stmt = conn.prepare("SELECT * FROM habits WHERE id = ?1")?;

    match stmt.query_row(params![habit_id], parse_habit_row) {
        Ok(habit) => Ok(Some(habit)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Record a tick inside an open transaction: advances `last_checked_at`,
/// writes the new streak pair, bumps the completion counter, and persists
/// the milestone set.
pub(crate) fn record_tick_in_tx(
    conn: &Connection,
    habit_id: i64,
    now: i64,
    streak_days: i64,
    longest_streak: i64,
    milestones: &[i64],
) -> Result<()> {
    let milestones_json = serde_json::to_string(milestones)?;

    conn.execute(
        "UPDATE habits SET
            last_checked_at = ?1,
            streak_days = ?2,
            longest_streak = ?3,
            total_completions = total_completions + 1,
            milestones = ?4
         WHERE id = ?5",
        params![now, streak_days, longest_streak, milestones_json, habit_id],
    )?;

    Ok(())
}

impl Database {
    /// Create a habit for a user.
    ///
    /// `interval_days` is required for `CustomInterval` habits and must be
    /// positive; it is rejected for other kinds.
    pub fn create_habit(
        &self,
        user_id: i64,
        title: &str,
        kind: HabitKind,
        interval_days: Option<i64>,
        now: i64,
    ) -> Result<Habit> {
        match (kind, interval_days) {
            (HabitKind::CustomInterval, None) => {
                return Err(EngineError::invalid_value(
                    "interval_days",
                    "interval_days is required for custom_interval habits",
                )
                .into());
            }
            (HabitKind::CustomInterval, Some(days)) if days < 1 => {
                return Err(
                    EngineError::invalid_value("interval_days", "interval_days must be >= 1")
                        .into(),
                );
            }
            (HabitKind::Daily | HabitKind::Weekly, Some(_)) => {
                return Err(EngineError::invalid_value(
                    "interval_days",
                    "interval_days only applies to custom_interval habits",
                )
                .into());
            }
            _ => {}
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO habits (user_id, title, kind, interval_days, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, title, kind.as_str(), interval_days, now],
            )?;
            let id = conn.last_insert_rowid();

            Ok(Habit {
                id,
                user_id,
                title: title.to_string(),
                kind,
                interval_days,
                streak_days: 0,
                longest_streak: 0,
                last_checked_at: None,
                total_completions: 0,
                milestones: Vec::new(),
                created_at: now,
            })
        })
    }

    /// Get a habit by ID.
    pub fn get_habit(&self, habit_id: i64) -> Result<Option<Habit>> {
        self.with_conn(|conn| get_habit_in_tx(conn, habit_id))
    }

    /// List a user's habits, oldest first.
    pub fn list_habits(&self, user_id: i64) -> Result<Vec<Habit>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM habits WHERE user_id = ?1 ORDER BY id ASC")?;

            let habits = stmt
                .query_map(params![user_id], parse_habit_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(habits)
        })
    }
}
