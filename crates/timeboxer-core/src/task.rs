//! Work item types.
//!
//! A work item is a prioritized unit of work with a fixed hour budget that
//! the engine time-boxes into availability windows. Mutating a work item
//! (hours, priority, status) is what triggers a recalculation upstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Work item status.
///
/// Valid transitions:
/// - Pending → Scheduled (the engine produced at least one assignment)
/// - Scheduled → Pending (assignments cleared by a recalculation)
/// - Pending | Scheduled → Completed (user action, terminal)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkItemStatus {
    /// Not yet placed on the calendar
    Pending,
    /// Has at least one committed assignment
    Scheduled,
    /// Finished (terminal); ignored by the scheduler
    Completed,
}

impl Default for WorkItemStatus {
    fn default() -> Self {
        WorkItemStatus::Pending
    }
}

/// A prioritized unit of work with an hour budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItem {
    pub id: String,
    pub name: String,
    /// Hour budget still to be placed, as a whole (not per week).
    pub estimated_hours: f64,
    /// 1 = highest. Reordering in the UI rewrites these.
    pub priority: u32,
    pub status: WorkItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    /// Create a new pending work item with a fresh id.
    ///
    /// # Errors
    /// Returns a validation error for an empty name, a non-finite or
    /// negative hour budget, or a priority below 1.
    pub fn new(name: &str, estimated_hours: f64, priority: u32) -> Result<Self, ValidationError> {
        validate_hours(name, estimated_hours)?;
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName { entity: "work item" });
        }
        if priority < 1 {
            return Err(ValidationError::InvalidPriority {
                value: priority as i64,
            });
        }

        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            estimated_hours,
            priority,
            status: WorkItemStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the scheduler should consider this item at all.
    pub fn is_schedulable(&self) -> bool {
        self.status != WorkItemStatus::Completed && self.estimated_hours > 0.0
    }
}

/// Reject non-finite or negative hour budgets at the boundary.
pub fn validate_hours(name: &str, hours: f64) -> Result<(), ValidationError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(ValidationError::InvalidHours {
            name: name.to_string(),
            value: hours,
        });
    }
    Ok(())
}

/// Total outstanding hours across schedulable items.
///
/// Used for horizon sizing; completed items contribute nothing.
pub fn outstanding_hours(items: &[WorkItem]) -> f64 {
    items
        .iter()
        .filter(|i| i.is_schedulable())
        .map(|i| i.estimated_hours)
        .sum()
}
