//! Cadence gate: decides whether a habit tick is currently permitted, and
//! whether a permitted tick continues or restarts the habit's own streak.

use crate::config::StreakConfig;
use crate::error::{EngineError, EngineResult};
use crate::types::{Habit, HabitKind, ONE_DAY_MS};

/// Expected interval between ticks for a habit, in milliseconds.
pub fn cadence_ms(kind: HabitKind, interval_days: Option<i64>) -> i64 {
    match kind {
        HabitKind::Daily => ONE_DAY_MS,
        HabitKind::Weekly => 7 * ONE_DAY_MS,
        // interval_days is validated at habit creation; a row without it is
        // treated as daily rather than panicking on repair-damaged data.
        HabitKind::CustomInterval => interval_days.unwrap_or(1) * ONE_DAY_MS,
    }
}

/// Minimum elapsed time before the next tick is permitted.
///
/// Grace forgives lateness near a boundary; the floor keeps a large grace
/// relative to a short cadence from permitting near-instant re-ticking.
pub fn required_interval_ms(cadence_ms: i64, grace_ms: i64, min_gap_ms: i64) -> i64 {
    min_gap_ms.max(cadence_ms - grace_ms)
}

/// Check whether the habit may be ticked at `now`.
///
/// A habit that has never been ticked is always permitted. Otherwise the
/// elapsed time since the last tick must reach the required interval, or the
/// tick is rejected with `CadenceNotElapsed` and no state change.
pub fn check_tick(habit: &Habit, now: i64, config: &StreakConfig) -> EngineResult<()> {
    let Some(last_checked_at) = habit.last_checked_at else {
        return Ok(());
    };

    let cadence = cadence_ms(habit.kind, habit.interval_days);
    let required = required_interval_ms(cadence, config.cadence_grace_ms, config.min_tick_gap_ms);
    let elapsed = now - last_checked_at;

    if elapsed >= required {
        Ok(())
    } else {
        Err(EngineError::cadence_not_elapsed(habit.id, required - elapsed))
    }
}

/// The habit's streak after a permitted tick at `now`.
///
/// A tick within one cadence (plus grace) of the previous tick continues the
/// streak; a later tick was discontinuous and restarts at 1, never 0.
pub fn next_streak_days(habit: &Habit, now: i64, config: &StreakConfig) -> i64 {
    let Some(last_checked_at) = habit.last_checked_at else {
        return 1;
    };

    let cadence = cadence_ms(habit.kind, habit.interval_days);
    let elapsed = now - last_checked_at;

    if elapsed <= cadence + config.cadence_grace_ms {
        habit.streak_days + 1
    } else {
        1
    }
}
