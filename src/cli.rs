//! CLI command definitions.
//!
//! The CLI is a thin shell around the engine: it resolves configuration,
//! reads the wall clock once, and hands explicit timestamps to the engine.

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::{HabitKind, TaskStatus};

/// Streak engine CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a user
    AddUser {
        /// Display name
        name: String,
    },

    /// Create a pending task for a user
    AddTask {
        /// Owning user ID
        #[arg(short, long)]
        user: i64,
        /// Task title
        title: String,
    },

    /// Create a habit for a user
    AddHabit {
        /// Owning user ID
        #[arg(short, long)]
        user: i64,
        /// Habit title
        title: String,
        /// Cadence kind
        #[arg(short, long, value_enum, default_value = "daily")]
        kind: HabitKindArg,
        /// Days between ticks (custom cadence only)
        #[arg(short, long)]
        interval_days: Option<i64>,
    },

    /// Complete a pending task
    CompleteTask {
        /// Acting user ID
        #[arg(short, long)]
        user: i64,
        /// Task ID
        task: i64,
    },

    /// Tick a habit
    TickHabit {
        /// Acting user ID
        #[arg(short, long)]
        user: i64,
        /// Habit ID
        habit: i64,
    },

    /// Run the daily reset sweep for a user
    Sweep {
        /// User ID to sweep
        #[arg(short, long)]
        user: i64,
    },

    /// Show aggregate statistics for a user
    Stats {
        /// User ID
        #[arg(short, long)]
        user: i64,
    },

    /// List a user's tasks
    ListTasks {
        /// Owning user ID
        #[arg(short, long)]
        user: i64,
        /// Filter by status
        #[arg(short, long, value_enum)]
        status: Option<TaskStatusArg>,
    },
}

/// Habit cadence kind as a CLI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HabitKindArg {
    Daily,
    Weekly,
    CustomInterval,
}

impl From<HabitKindArg> for HabitKind {
    fn from(arg: HabitKindArg) -> Self {
        match arg {
            HabitKindArg::Daily => HabitKind::Daily,
            HabitKindArg::Weekly => HabitKind::Weekly,
            HabitKindArg::CustomInterval => HabitKind::CustomInterval,
        }
    }
}

/// Task status as a CLI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskStatusArg {
    Pending,
    Completed,
    Failed,
}

impl From<TaskStatusArg> for TaskStatus {
    fn from(arg: TaskStatusArg) -> Self {
        match arg {
            TaskStatusArg::Pending => TaskStatus::Pending,
            TaskStatusArg::Completed => TaskStatus::Completed,
            TaskStatusArg::Failed => TaskStatus::Failed,
        }
    }
}
