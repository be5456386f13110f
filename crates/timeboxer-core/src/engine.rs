//! The full planning pipeline.
//!
//! rules + horizon -> slots -> busy blocking -> priority allocation.
//! Stateless: everything the pass needs (items, rules, busy intervals,
//! "now", timezone) arrives as arguments, so concurrent passes for
//! different data sets cannot interfere.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::{weekly_capacity_hours, AvailabilityRule};
use crate::conflict::{block_conflicting, BusyInterval};
use crate::scheduler::{schedule, Assignment, UnscheduledRemainder};
use crate::slots::generate_slots;
use crate::task::{outstanding_hours, WorkItem};

/// Hard cap on slot search, in days. Bounds worst-case runtime and
/// guarantees termination when availability can never satisfy demand.
pub const SAFETY_HORIZON_DAYS: i64 = 365;

/// Minimum horizon in weeks regardless of demand.
pub const HORIZON_FLOOR_WEEKS: i64 = 8;

/// Extra weeks added on top of the demand-derived horizon.
pub const HORIZON_MARGIN_WEEKS: i64 = 2;

/// Size the slot horizon from outstanding demand and weekly capacity.
///
/// weeks = max(ceil(outstanding / weekly capacity), floor) + margin,
/// capped at the safety horizon. A zero weekly capacity substitutes 1,
/// which yields an intentionally oversized fallback horizon rather than
/// a division by zero.
pub fn plan_horizon_days(items: &[WorkItem], rules: &[AvailabilityRule]) -> i64 {
    let total = outstanding_hours(items);
    let mut weekly = weekly_capacity_hours(rules);
    if weekly <= 0.0 {
        weekly = 1.0;
    }

    let weeks_needed = (total / weekly).ceil() as i64;
    let weeks = weeks_needed.max(HORIZON_FLOOR_WEEKS) + HORIZON_MARGIN_WEEKS;
    (weeks * 7).min(SAFETY_HORIZON_DAYS)
}

/// Everything one pass produced, reported as counts plus the artifacts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub assignments: Vec<Assignment>,
    /// Per-item hours the horizon could not place. Residual state, not
    /// an error.
    pub unscheduled: Vec<UnscheduledRemainder>,
    pub horizon_days: i64,
    pub slots_generated: usize,
    /// Slots removed by busy-interval blocking before allocation.
    pub conflicts_avoided: usize,
}

/// Run the whole pipeline for one pass.
pub fn build_plan(
    items: &[WorkItem],
    rules: &[AvailabilityRule],
    busy: &[BusyInterval],
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> PlanOutcome {
    let horizon_days = plan_horizon_days(items, rules);
    let mut slots = generate_slots(rules, horizon_days, now, tz);
    let slots_generated = slots.len();

    let conflicts_avoided = block_conflicting(&mut slots, busy);
    let outcome = schedule(items, &mut slots, busy);

    PlanOutcome {
        assignments: outcome.assignments,
        unscheduled: outcome.unscheduled,
        horizon_days,
        slots_generated,
        conflicts_avoided,
    }
}
