//! Streak engine CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use streak_engine::cli::{Cli, Command};
use streak_engine::config::Config;
use streak_engine::db::{Database, now_ms};
use streak_engine::engine::Engine;
use streak_engine::error::EngineError;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new().create(true).append(true).open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    // Load configuration, then apply CLI overrides
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }

    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)?;
    let engine = Engine::new(db.clone(), config.streaks.clone());

    let now = now_ms();

    let outcome = match cli.command {
        Command::AddUser { name } => {
            let user = db.create_user(&name, now)?;
            serde_json::to_value(user)?
        }
        Command::AddTask { user, title } => {
            let task = db.create_task(user, &title, now)?;
            serde_json::to_value(task)?
        }
        Command::AddHabit {
            user,
            title,
            kind,
            interval_days,
        } => {
            let habit = db.create_habit(user, &title, kind.into(), interval_days, now)?;
            serde_json::to_value(habit)?
        }
        Command::CompleteTask { user, task } => {
            report(engine.complete_task(user, task, now))?
        }
        Command::TickHabit { user, habit } => report(engine.tick_habit(user, habit, now))?,
        Command::Sweep { user } => report(engine.run_daily_reset_sweep(user, now))?,
        Command::Stats { user } => {
            let stats = db
                .get_user_stats(user)?
                .ok_or_else(|| EngineError::user_not_found(user))?;
            serde_json::to_value(stats)?
        }
        Command::ListTasks { user, status } => {
            let tasks = db.list_tasks(user, status.map(Into::into))?;
            serde_json::to_value(tasks)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// Print engine errors as structured JSON on stderr and exit non-zero.
fn report<T: serde::Serialize>(result: Result<T, EngineError>) -> Result<serde_json::Value> {
    match result {
        Ok(value) => Ok(serde_json::to_value(value)?),
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&err)?);
            std::process::exit(1);
        }
    }
}
