//! Types shared across the calendar sync layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sync error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Calendar API error: {0}")]
    CalendarApi(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Not authenticated with the calendar provider")]
    AuthenticationRequired,

    #[error("Calendar not found: {0}")]
    CalendarNotFound(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Counts for the per-item remote operations of one reconciliation.
///
/// Remote failures are isolated per item and tallied here; they never
/// abort the batch and never roll back local state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteOpCounts {
    pub deleted: usize,
    pub delete_failures: usize,
    pub created: usize,
    pub create_failures: usize,
}

/// User-facing report for one full recalculation.
///
/// Counts rather than a single pass/fail: a run with residue or partial
/// remote failures is still a completed run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecalcReport {
    pub assignments_created: usize,
    pub conflicts_avoided: usize,
    pub unscheduled_items: usize,
    pub unscheduled_hours: f64,
    pub remote: RemoteOpCounts,
    pub finished_at: Option<DateTime<Utc>>,
}
