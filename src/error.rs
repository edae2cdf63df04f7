//! Structured error types for engine operations.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors: detected before any write, no side effect
    InvalidFieldValue,
    InvalidState,
    AlreadyTerminal,
    CadenceNotElapsed,
    NotOwner,

    // Not found errors
    UserNotFound,
    TaskNotFound,
    HabitNotFound,

    // Internal errors: the whole transaction was rolled back
    DatabaseError,
    InternalError,
}

/// Structured error surfaced at the engine boundary.
#[derive(Debug, Serialize)]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl EngineError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, message)
    }

    pub fn user_not_found(user_id: i64) -> Self {
        Self::new(ErrorCode::UserNotFound, format!("User not found: {}", user_id))
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("Task not found: {}", task_id))
    }

    pub fn habit_not_found(habit_id: i64) -> Self {
        Self::new(ErrorCode::HabitNotFound, format!("Habit not found: {}", habit_id))
    }

    pub fn not_owner(entity: &str, entity_id: i64, user_id: i64) -> Self {
        Self::new(
            ErrorCode::NotOwner,
            format!("{} {} is not owned by user {}", entity, entity_id, user_id),
        )
    }

    pub fn already_terminal(task_id: i64, status: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyTerminal,
            format!("Task {} is already {}", task_id, status),
        )
    }

    pub fn cadence_not_elapsed(habit_id: i64, remaining_ms: i64) -> Self {
        Self::new(
            ErrorCode::CadenceNotElapsed,
            format!(
                "Habit {} cannot be ticked yet ({} ms remaining)",
                habit_id, remaining_ms
            ),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EngineError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        // Try to downcast to EngineError first
        match err.downcast::<EngineError>() {
            Ok(engine_err) => engine_err,
            Err(err) => EngineError::internal(err),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
