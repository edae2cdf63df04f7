//! Milestone detection for habit streaks.

/// Record a newly crossed milestone, if any.
///
/// Thresholds are checked in ascending order against the habit's new streak
/// by exact match (not `>=`). The first matching threshold not already in
/// `achieved` is appended and reported; a threshold already recorded is never
/// reported again, even after a reset-then-regrowth cycle returns the streak
/// to the same value. At most one milestone is reported per tick.
pub fn record_crossed(new_streak: i64, achieved: &mut Vec<i64>, thresholds: &[i64]) -> Option<i64> {
    for &threshold in thresholds {
        if threshold == new_streak && !achieved.contains(&threshold) {
            achieved.push(threshold);
            return Some(threshold);
        }
    }
    None
}
