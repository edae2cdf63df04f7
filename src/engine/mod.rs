//! The completion transaction coordinator and the daily reset sweep.
//!
//! Every operation here runs whole inside [`Database::with_user_lock`]: the
//! user row is loaded under an immediate write transaction, all reads and
//! writes for the event happen against that transaction, and either every
//! effect commits together or none do. Validation errors are raised before
//! the first write; any error rolls the transaction back.

pub mod cadence;
pub mod milestones;
pub mod streak;
pub mod sweep;

use crate::config::StreakConfig;
use crate::db::users::CounterColumn;
use crate::db::{Database, habits, tasks, users};
use crate::error::{EngineError, EngineResult};
use crate::types::{
    Habit, HabitTick, ONE_DAY_MS, SweepOutcome, Task, TaskCompletion, TaskStatus, User,
};
use anyhow::Result;
use rusqlite::Connection;
use tracing::{debug, info};

use streak::StreakUpdate;

/// Streak and cadence consistency engine.
///
/// Holds the database handle and the streak tunables. All operations take
/// `now` explicitly; the engine never reads ambient time or global state.
#[derive(Clone)]
pub struct Engine {
    db: Database,
    config: StreakConfig,
}

impl Engine {
    pub fn new(db: Database, config: StreakConfig) -> Self {
        Self { db, config }
    }

    /// Complete a pending task for a user.
    ///
    /// Marks the task completed, advances the user's streak, and bumps the
    /// task counter, atomically.
    pub fn complete_task(&self, user_id: i64, task_id: i64, now: i64) -> EngineResult<TaskCompletion> {
        self.db
            .with_user_lock(user_id, |tx, user| {
                let task = tasks::get_task_in_tx(tx, task_id)?
                    .ok_or_else(|| EngineError::task_not_found(task_id))?;

                if task.user_id != user.id {
                    return Err(EngineError::not_owner("Task", task_id, user.id).into());
                }
                if task.status.is_terminal() {
                    return Err(
                        EngineError::already_terminal(task_id, task.status.as_str()).into()
                    );
                }

                let update = self.decide_user_streak(tx, &user, now, Some(task_id), None)?;

                tasks::mark_completed_in_tx(tx, task_id, now)?;
                users::update_streak_in_tx(tx, user.id, update.current, update.longest)?;
                users::increment_counter_in_tx(tx, user.id, CounterColumn::Tasks)?;

                debug!(
                    user_id,
                    task_id,
                    streak = update.current,
                    first_of_day = update.first_of_day,
                    "task completed"
                );

                Ok(TaskCompletion {
                    task: Task {
                        status: TaskStatus::Completed,
                        completed_at: Some(now),
                        ..task
                    },
                    new_streak: update.current,
                    longest_streak: update.longest,
                    milestone: None,
                })
            })
            .map_err(EngineError::from)
    }

    /// Tick a habit for a user.
    ///
    /// The cadence gate is consulted first; a permitted tick records the
    /// habit's new streak, detects at most one milestone, advances the user's
    /// streak, and bumps the habit counter, atomically.
    pub fn tick_habit(&self, user_id: i64, habit_id: i64, now: i64) -> EngineResult<HabitTick> {
        self.db
            .with_user_lock(user_id, |tx, user| {
                let habit = habits::get_habit_in_tx(tx, habit_id)?
                    .ok_or_else(|| EngineError::habit_not_found(habit_id))?;

                if habit.user_id != user.id {
                    return Err(EngineError::not_owner("Habit", habit_id, user.id).into());
                }

                cadence::check_tick(&habit, now, &self.config)?;

                let update = self.decide_user_streak(tx, &user, now, None, Some(habit_id))?;

                let streak_days = cadence::next_streak_days(&habit, now, &self.config);
                let habit_longest = habit.longest_streak.max(streak_days);

                let mut achieved = habit.milestones.clone();
                let milestone =
                    milestones::record_crossed(streak_days, &mut achieved, &self.config.milestones);

                habits::record_tick_in_tx(tx, habit.id, now, streak_days, habit_longest, &achieved)?;
                users::update_streak_in_tx(tx, user.id, update.current, update.longest)?;
                users::increment_counter_in_tx(tx, user.id, CounterColumn::Habits)?;

                debug!(
                    user_id,
                    habit_id,
                    habit_streak = streak_days,
                    user_streak = update.current,
                    ?milestone,
                    "habit ticked"
                );

                Ok(HabitTick {
                    habit: Habit {
                        streak_days,
                        longest_streak: habit_longest,
                        last_checked_at: Some(now),
                        total_completions: habit.total_completions + 1,
                        milestones: achieved,
                        ..habit
                    },
                    new_user_streak: update.current,
                    milestone_achieved: milestone,
                })
            })
            .map_err(EngineError::from)
    }

    /// Retroactively fail stale pending tasks for a user.
    ///
    /// Runs at most once per 24h window; an ineligible call is a successful
    /// no-op. Failing tasks is silent with respect to streaks and counters.
    pub fn run_daily_reset_sweep(&self, user_id: i64, now: i64) -> EngineResult<SweepOutcome> {
        self.db
            .with_user_lock(user_id, |tx, user| {
                if !sweep::eligible(user.last_task_reset, now) {
                    debug!(user_id, last_task_reset = user.last_task_reset, "sweep not eligible");
                    return Ok(SweepOutcome {
                        failed_count: 0,
                        reset_applied: false,
                        next_reset_at: user.last_task_reset + ONE_DAY_MS,
                    });
                }

                let cutoff = sweep::cutoff(user.last_task_reset, now, self.config.sweep_grace_ms);
                let failed_count = tasks::fail_stale_pending_in_tx(tx, user.id, cutoff)?;

                // Advance the watermark even when nothing was swept; this is
                // what makes repeated sweeps within 24h idempotent no-ops.
                users::set_last_task_reset_in_tx(tx, user.id, now)?;

                info!(user_id, failed_count, cutoff, "reset sweep applied");

                Ok(SweepOutcome {
                    failed_count,
                    reset_applied: true,
                    next_reset_at: now + ONE_DAY_MS,
                })
            })
            .map_err(EngineError::from)
    }

    /// Gather completion evidence for today and (if needed) yesterday, then
    /// compute the new streak pair.
    ///
    /// The entity being completed is excluded from today's window so it
    /// cannot count as evidence before its own write lands. Yesterday's
    /// window carries no exclusion: a habit's previous tick landing yesterday
    /// is exactly the evidence that keeps the streak alive.
    fn decide_user_streak(
        &self,
        conn: &Connection,
        user: &User,
        now: i64,
        exclude_task: Option<i64>,
        exclude_habit: Option<i64>,
    ) -> Result<StreakUpdate> {
        let day_start = streak::day_start(now);

        let completed_today = users::has_completion_in_window(
            conn,
            user.id,
            day_start,
            now,
            exclude_task,
            exclude_habit,
        )?;

        let completed_yesterday = if completed_today {
            false
        } else {
            users::has_completion_in_window(
                conn,
                user.id,
                day_start - ONE_DAY_MS,
                day_start,
                None,
                None,
            )?
        };

        Ok(streak::advance(
            user.current_streak,
            user.longest_streak,
            completed_today,
            completed_yesterday,
        ))
    }
}
