//! Streak continuity calculation over UTC calendar-day windows.
//!
//! Days are fixed 86,400,000 ms windows aligned to UTC midnight. The
//! calculator is pure: evidence booleans are gathered by the coordinator
//! inside its transaction and passed in.

use crate::types::ONE_DAY_MS;

/// Start of the UTC calendar day containing `now`.
pub fn day_start(now: i64) -> i64 {
    now - now.rem_euclid(ONE_DAY_MS)
}

/// Outcome of a streak advance for one completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub current: i64,
    pub longest: i64,
    /// True when this event was the first completion of the calendar day.
    pub first_of_day: bool,
}

/// Compute the user's new streak pair.
///
/// When the user already completed something today the streak is unchanged,
/// floored at 1: completing anything today always yields a streak of at
/// least one day. Otherwise this is the first completion of the day and the
/// streak either continues from yesterday or restarts at 1.
pub fn advance(
    prev_current: i64,
    prev_longest: i64,
    completed_today: bool,
    completed_yesterday: bool,
) -> StreakUpdate {
    if completed_today {
        let current = prev_current.max(1);
        return StreakUpdate {
            current,
            longest: prev_longest.max(current),
            first_of_day: false,
        };
    }

    let current = if completed_yesterday {
        prev_current + 1
    } else {
        // Covers both "missed yesterday" and "first ever completion".
        1
    };

    StreakUpdate {
        current,
        longest: prev_longest.max(current),
        first_of_day: true,
    }
}
