//! Core types for the streak engine.

use serde::{Deserialize, Serialize};

/// One UTC calendar day, in milliseconds.
pub const ONE_DAY_MS: i64 = 86_400_000;

/// A user and their streak state.
///
/// Streak fields are mutated exclusively by the engine inside a per-user
/// transaction; CRUD paths only ever set the initial defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Consecutive calendar days with at least one qualifying completion.
    pub current_streak: i64,
    /// High-water mark of `current_streak`, never decreases.
    pub longest_streak: i64,
    pub total_tasks_completed: i64,
    pub total_habits_completed: i64,
    /// Timestamp of the most recent applied reset sweep (0 = never swept).
    pub last_task_reset: i64,
    pub created_at: i64,
}

/// Task lifecycle status. Completed and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "completed" => Some(TaskStatus::Completed),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}

/// A task owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub status: TaskStatus,
    /// Set only by the reset sweep when it fails a stale pending task.
    pub is_missed: bool,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

/// Habit cadence kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitKind {
    Daily,
    Weekly,
    CustomInterval,
}

impl HabitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitKind::Daily => "daily",
            HabitKind::Weekly => "weekly",
            HabitKind::CustomInterval => "custom_interval",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(HabitKind::Daily),
            "weekly" => Some(HabitKind::Weekly),
            "custom_interval" => Some(HabitKind::CustomInterval),
            _ => None,
        }
    }
}

/// A habit owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub kind: HabitKind,
    /// Days between ticks; meaningful only when `kind` is `CustomInterval`.
    pub interval_days: Option<i64>,
    /// Consecutive on-cadence ticks of this habit.
    pub streak_days: i64,
    pub longest_streak: i64,
    /// Only advances forward; `None` until the first tick.
    pub last_checked_at: Option<i64>,
    pub total_completions: i64,
    /// Streak thresholds already celebrated, each recorded at most once.
    pub milestones: Vec<i64>,
    pub created_at: i64,
}

/// Result of completing a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub task: Task,
    /// The user's streak after this completion.
    pub new_streak: i64,
    pub longest_streak: i64,
    /// Reserved: tasks carry no milestone state under the current model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<i64>,
}

/// Result of ticking a habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitTick {
    pub habit: Habit,
    /// The user's streak after this tick (user-level, not the habit's own).
    pub new_user_streak: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_achieved: Option<i64>,
}

/// Result of a daily reset sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// Number of pending tasks failed by this sweep.
    pub failed_count: i64,
    /// False when the sweep ran inside the 24h window and was a no-op.
    pub reset_applied: bool,
    /// Earliest timestamp at which the next sweep will be eligible.
    pub next_reset_at: i64,
}

/// Aggregate per-user statistics for read-only consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub total_tasks_completed: i64,
    pub total_habits_completed: i64,
    pub pending_tasks: i64,
    pub completed_tasks: i64,
    pub failed_tasks: i64,
    pub habits: i64,
    pub last_task_reset: i64,
}
