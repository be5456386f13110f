//! Priority-ordered greedy allocation of work items into slots.
//!
//! This module provides the allocation half of the engine:
//! - Stable ascending-priority ordering of outstanding items
//! - First-fit consumption of available slots, one item per slot
//! - A defensive busy re-check at commit time
//! - Explicit reporting of unmet remainder instead of silent loss

pub mod resolver;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::{overlaps, BusyInterval};
use crate::slots::TimeSlot;
use crate::task::{WorkItem, WorkItemStatus};

/// Hours below this are treated as fully scheduled.
const REMAINDER_EPSILON: f64 = 1e-9;

/// Palette cycled by priority for calendar rendering.
const SESSION_COLORS: [&str; 8] = [
    "#4f46e5", "#0ea5e9", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#14b8a6",
];

/// Assignment status.
///
/// Transitions: Scheduled → Completed (user action, terminal);
/// Scheduled → Conflicted (new busy interval overlaps);
/// Conflicted → Scheduled (successful reschedule). A conflicted
/// assignment with no replacement stays conflicted until the next full
/// recalculation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Scheduled,
    Completed,
    Conflicted,
}

/// A committed mapping of part of a work item's hours onto a window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: String,
    pub work_item_id: String,
    /// Denormalized for calendar event titles.
    pub work_item_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_hours: f64,
    pub status: AssignmentStatus,
    /// Copied from the owning item at creation time.
    pub priority: u32,
    pub color: String,
    /// Id of the calendar event mirroring this assignment, once created.
    #[serde(default)]
    pub remote_event_id: Option<String>,
}

impl Assignment {
    /// Create a new scheduled assignment with a fresh id.
    pub fn new(item: &WorkItem, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            work_item_id: item.id.clone(),
            work_item_name: item.name.clone(),
            start,
            end,
            duration_hours: (end - start).num_seconds() as f64 / 3600.0,
            status: AssignmentStatus::Scheduled,
            priority: item.priority,
            color: color_for_priority(item.priority),
            remote_event_id: None,
        }
    }
}

/// Deterministic palette pick; priority 1 gets the first color.
pub fn color_for_priority(priority: u32) -> String {
    SESSION_COLORS[priority.saturating_sub(1) as usize % SESSION_COLORS.len()].to_string()
}

/// Hours an item wanted but the pass could not place.
///
/// A normal residual state, not an error: observable so callers can
/// report it, never materialized as an assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnscheduledRemainder {
    pub work_item_id: String,
    pub work_item_name: String,
    pub remaining_hours: f64,
}

/// Result of one allocation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    /// In ascending priority order of the owning items.
    pub assignments: Vec<Assignment>,
    pub unscheduled: Vec<UnscheduledRemainder>,
}

/// Greedily allocate items into available slots in priority order.
///
/// Completed items are skipped; the rest are stable-sorted ascending by
/// priority so equal priorities keep their input order. Each item walks
/// the slots in start order and takes the first available one. The
/// candidate window is re-checked against `busy` at commit time (earlier
/// blocking may be stale); a conflict there blocks the slot and moves on
/// without consuming any of the item's remaining hours. A committed slot
/// is consumed whole -- the unused tail of a slot is never offered to
/// another item within the same pass.
///
/// Identical inputs produce an identical assignment list.
pub fn schedule(
    items: &[WorkItem],
    slots: &mut [TimeSlot],
    busy: &[BusyInterval],
) -> ScheduleOutcome {
    let mut ordered: Vec<&WorkItem> = items
        .iter()
        .filter(|i| i.status != WorkItemStatus::Completed)
        .collect();
    ordered.sort_by_key(|i| i.priority);

    let mut outcome = ScheduleOutcome::default();

    for item in ordered {
        let mut remaining = item.estimated_hours;

        for slot in slots.iter_mut() {
            if remaining <= REMAINDER_EPSILON {
                break;
            }
            if !slot.available {
                continue;
            }

            let take = slot.duration_hours.min(remaining);
            let candidate_end = slot.start + hours_to_duration(take);

            // Defensive second pass: prior blocking may be stale.
            if busy
                .iter()
                .any(|b| overlaps(slot.start, candidate_end, b.start, b.end))
            {
                slot.available = false;
                continue;
            }

            outcome
                .assignments
                .push(Assignment::new(item, slot.start, candidate_end));
            remaining -= take;
            slot.available = false;
        }

        if remaining > REMAINDER_EPSILON {
            outcome.unscheduled.push(UnscheduledRemainder {
                work_item_id: item.id.clone(),
                work_item_name: item.name.clone(),
                remaining_hours: remaining,
            });
        }
    }

    outcome
}

fn hours_to_duration(hours: f64) -> Duration {
    Duration::seconds((hours * 3600.0).round() as i64)
}
