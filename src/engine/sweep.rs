//! Cutoff math for the daily reset sweep.

use crate::types::ONE_DAY_MS;

/// Whether a sweep is eligible to run: at least 24h since the last applied
/// sweep (`last_task_reset` is 0 for a user who has never been swept).
pub fn eligible(last_task_reset: i64, now: i64) -> bool {
    now - last_task_reset >= ONE_DAY_MS
}

/// Staleness cutoff for a sweep running at `now`.
///
/// The base is the later of the previous sweep and 24h ago, so a long-idle
/// user is not punished for tasks created during the idle gap twice over.
/// The grace period protects tasks created just before the boundary; the
/// `min(_, now)` clamp keeps a pathological grace from pushing the cutoff
/// into the future.
pub fn cutoff(last_task_reset: i64, now: i64, grace_ms: i64) -> i64 {
    let reset_base = last_task_reset.max(now - ONE_DAY_MS);
    (reset_base - grace_ms).min(now)
}
