//! Streak & Cadence Consistency Engine
//!
//! Decides, under concurrent and possibly retried requests, whether a user's
//! daily streak continues, resets, or starts fresh when a task is completed
//! or a habit is ticked, and retroactively fails stale pending tasks with a
//! grace-period-tolerant daily sweep.

pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod types;
