//! Conflict detection and targeted reschedule.
//!
//! The incremental recovery path: when a calendar poll discovers new busy
//! intervals between full rebuilds, committed assignments overlapping
//! them are relabeled conflicted and only those get rebuilt, leaving the
//! rest of the plan untouched.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::AvailabilityRule;
use crate::conflict::{block_conflicting, overlaps, BusyInterval};
use crate::scheduler::{Assignment, AssignmentStatus};
use crate::slots::generate_slots;
use crate::task::{WorkItem, WorkItemStatus};

/// Fresh horizon used when rebuilding conflicted assignments. Wider than
/// a typical remaining plan so a displaced session has somewhere to go.
pub const RESCHEDULE_HORIZON_DAYS: i64 = 30;

/// Relabel every non-completed assignment overlapping a conflict
/// interval as conflicted. Everything else is returned unchanged.
pub fn resolve_conflicts(
    assignments: &[Assignment],
    conflicts: &[BusyInterval],
) -> Vec<Assignment> {
    assignments
        .iter()
        .map(|a| {
            let hit = a.status != AssignmentStatus::Completed
                && conflicts
                    .iter()
                    .any(|c| overlaps(a.start, a.end, c.start, c.end));
            if hit {
                let mut flagged = a.clone();
                flagged.status = AssignmentStatus::Conflicted;
                flagged
            } else {
                a.clone()
            }
        })
        .collect()
}

/// Result of a targeted reschedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RescheduleOutcome {
    /// Kept assignments plus replacements, ascending by start.
    pub assignments: Vec<Assignment>,
    /// Conflicted assignments no replacement window could be found for.
    /// They are absent from `assignments`; a full recalculation is the
    /// way to recover their hours.
    pub dropped: Vec<Assignment>,
}

/// First-fit conflicted assignments into a fresh slot horizon.
///
/// Slots already covered by a non-conflicted assignment or by a busy
/// interval are blocked up front with the same half-open overlap test the
/// filter pass uses. Each conflicted assignment, in input order, takes
/// the earliest available slot at least as long as its original
/// duration; the replacement keeps the work item link, name, priority
/// and color, with status reset to scheduled and a fresh id. A
/// conflicted assignment whose owning item is gone or completed is
/// dropped rather than replaced.
pub fn reschedule(
    assignments: &[Assignment],
    items: &[WorkItem],
    rules: &[AvailabilityRule],
    busy: &[BusyInterval],
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> RescheduleOutcome {
    let (conflicted, kept): (Vec<&Assignment>, Vec<&Assignment>) = assignments
        .iter()
        .partition(|a| a.status == AssignmentStatus::Conflicted);

    let mut slots = generate_slots(rules, RESCHEDULE_HORIZON_DAYS, now, tz);

    let occupied: Vec<BusyInterval> = kept
        .iter()
        .map(|a| BusyInterval::new(a.start, a.end))
        .collect();
    block_conflicting(&mut slots, &occupied);
    block_conflicting(&mut slots, busy);

    let mut outcome = RescheduleOutcome {
        assignments: kept.into_iter().cloned().collect(),
        dropped: Vec::new(),
    };

    for original in conflicted {
        let owner_live = items
            .iter()
            .any(|i| i.id == original.work_item_id && i.status != WorkItemStatus::Completed);
        if !owner_live {
            outcome.dropped.push(original.clone());
            continue;
        }

        let fit = slots
            .iter_mut()
            .find(|s| s.available && s.duration_hours + 1e-9 >= original.duration_hours);

        match fit {
            Some(slot) => {
                let end = slot.start
                    + chrono::Duration::seconds((original.duration_hours * 3600.0).round() as i64);
                outcome.assignments.push(Assignment {
                    id: uuid::Uuid::new_v4().to_string(),
                    work_item_id: original.work_item_id.clone(),
                    work_item_name: original.work_item_name.clone(),
                    start: slot.start,
                    end,
                    duration_hours: original.duration_hours,
                    status: AssignmentStatus::Scheduled,
                    priority: original.priority,
                    color: original.color.clone(),
                    remote_event_id: None,
                });
                slot.available = false;
            }
            None => outcome.dropped.push(original.clone()),
        }
    }

    outcome.assignments.sort_by_key(|a| a.start);
    outcome
}
