//! Configuration loading and management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub streaks: StreakConfig,
}

/// Storage and process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".streak-engine/streaks.db")
}

/// Tunables for the cadence gate, reset sweep, and milestone detector.
///
/// The grace and floor values are product policy rather than invariants, so
/// they live in config instead of constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Tolerance allowing a habit tick slightly before its cadence boundary.
    #[serde(default = "default_cadence_grace_ms")]
    pub cadence_grace_ms: i64,

    /// Absolute floor between ticks of one habit, regardless of grace.
    #[serde(default = "default_min_tick_gap_ms")]
    pub min_tick_gap_ms: i64,

    /// Tolerance protecting tasks created just before the sweep boundary.
    #[serde(default = "default_sweep_grace_ms")]
    pub sweep_grace_ms: i64,

    /// Habit streak thresholds that trigger a one-time milestone, ascending.
    #[serde(default = "default_milestones")]
    pub milestones: Vec<i64>,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            cadence_grace_ms: default_cadence_grace_ms(),
            min_tick_gap_ms: default_min_tick_gap_ms(),
            sweep_grace_ms: default_sweep_grace_ms(),
            milestones: default_milestones(),
        }
    }
}

fn default_cadence_grace_ms() -> i64 {
    2 * 60 * 60 * 1000 // 2 hours
}

fn default_min_tick_gap_ms() -> i64 {
    60 * 60 * 1000 // 1 hour
}

fn default_sweep_grace_ms() -> i64 {
    15 * 60 * 1000 // 15 minutes
}

fn default_milestones() -> Vec<i64> {
    vec![7, 30, 100]
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default locations or return defaults.
    ///
    /// Resolution order: `streak-engine/config.yaml` in the working directory,
    /// then the user config directory, then environment variables on top of
    /// built-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::load("streak-engine/config.yaml") {
            return config;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("streak-engine").join("config.yaml");
            if let Ok(config) = Self::load(path) {
                return config;
            }
        }

        let mut config = Self::default();

        if let Ok(db_path) = std::env::var("STREAK_ENGINE_DB_PATH") {
            config.server.db_path = PathBuf::from(db_path);
        }

        if let Ok(grace) = std::env::var("STREAK_ENGINE_CADENCE_GRACE_MS") {
            if let Ok(grace) = grace.parse() {
                config.streaks.cadence_grace_ms = grace;
            }
        }

        if let Ok(gap) = std::env::var("STREAK_ENGINE_MIN_TICK_GAP_MS") {
            if let Ok(gap) = gap.parse() {
                config.streaks.min_tick_gap_ms = gap;
            }
        }

        if let Ok(grace) = std::env::var("STREAK_ENGINE_SWEEP_GRACE_MS") {
            if let Ok(grace) = grace.parse() {
                config.streaks.sweep_grace_ms = grace;
            }
        }

        config
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
