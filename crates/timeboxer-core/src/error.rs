//! Core error types for timeboxer-core.
//!
//! This module defines the error hierarchy using thiserror. Scheduling
//! itself never fails with an error for lack of capacity -- unscheduled
//! remainder is reported in the plan outcome, not here.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for timeboxer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Validation errors at the model boundary
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Calendar sync errors
    #[error("Sync error: {0}")]
    Sync(#[from] crate::sync::SyncError),

    /// A recalculation was refused because one finished too recently
    #[error("Recalculation debounced: previous run finished {elapsed_ms}ms ago")]
    Debounced { elapsed_ms: i64 },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Storage-specific errors.
///
/// Any of these during the persist step of a recalculation is fatal for
/// the whole run; the driver aborts before touching the remote calendar.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Row referenced an entity that does not exist
    #[error("Not found: {entity} '{id}'")]
    NotFound { entity: &'static str, id: String },
}

/// Validation errors.
///
/// Raised at the model boundary so malformed input never reaches the
/// allocation loop.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Clock time string not in HH:MM form or out of range
    #[error("Invalid clock time '{value}': expected HH:MM")]
    InvalidClockTime { value: String },

    /// Weekday outside 0..=6
    #[error("Invalid weekday {value}: expected 0 (Sunday) through 6 (Saturday)")]
    InvalidWeekday { value: u8 },

    /// Estimated hours must be non-negative and finite
    #[error("Invalid estimated hours {value} for '{name}'")]
    InvalidHours { name: String, value: f64 },

    /// Priority must be a positive integer (1 = highest)
    #[error("Invalid priority {value}: must be >= 1")]
    InvalidPriority { value: i64 },

    /// Rule window must end after it starts
    #[error("Invalid rule window: end {end} must be after start {start}")]
    InvalidRuleWindow { start: String, end: String },

    /// Empty name
    #[error("Empty name for {entity}")]
    EmptyName { entity: &'static str },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
