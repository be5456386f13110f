//! Reconciliation driver around the pure engine.
//!
//! Orchestrates one full recalculation: fetch busy intervals, tear down
//! the previous plan locally and remotely, rerun the engine, persist,
//! and mirror the new assignments to the provider. Remote operations are
//! per-item and independently fallible; local persistence failures are
//! fatal and abort before any remote create is attempted.

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{build_plan, plan_horizon_days};
use crate::error::{CoreError, StorageError};
use crate::scheduler::resolver::{reschedule, resolve_conflicts, RESCHEDULE_HORIZON_DAYS};
use crate::scheduler::AssignmentStatus;
use crate::storage::{PlanDb, PlannerConfig};
use crate::sync::gateway::CalendarGateway;
use crate::sync::types::{RecalcReport, RemoteOpCounts};
use crate::task::WorkItemStatus;

/// Report for one incremental repair pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairReport {
    /// Assignments found overlapping newly discovered busy intervals.
    pub conflicted: usize,
    /// Conflicted assignments that got a replacement window.
    pub rescheduled: usize,
    /// Conflicted assignments dropped for lack of a window. Their hours
    /// come back on the next full recalculation.
    pub dropped: usize,
    pub remote: RemoteOpCounts,
}

/// Drives full and incremental recalculations against storage and a
/// calendar provider.
///
/// The engine itself is pure; this type owns the surrounding sequence
/// and the debounce guard that keeps rapid triggers from racing two
/// rebuilds over the same records.
pub struct Recalculator<G: CalendarGateway> {
    db: PlanDb,
    gateway: G,
    tz: FixedOffset,
    debounce: Duration,
    last_finished: Mutex<Option<DateTime<Utc>>>,
}

impl<G: CalendarGateway> Recalculator<G> {
    pub fn new(db: PlanDb, gateway: G, config: &PlannerConfig) -> Self {
        Self {
            db,
            gateway,
            tz: config.timezone(),
            debounce: Duration::milliseconds(config.recalc_debounce_ms.max(0)),
            last_finished: Mutex::new(None),
        }
    }

    /// Full rebuild: discard all non-completed assignments, refetch busy
    /// intervals, and rerun the whole pipeline from zero.
    ///
    /// # Errors
    /// Fails on debounce, busy-interval fetch failure, or any local
    /// persistence failure. Per-item remote failures are counted in the
    /// report instead.
    pub async fn recalculate(&self, now: DateTime<Utc>) -> Result<RecalcReport, CoreError> {
        self.check_debounce(now)?;

        let items = store(self.db.list_work_items())?;
        let rules = store(self.db.list_rules())?;

        // (a) Busy intervals over the whole slot search window. Without
        // them nothing else is safe to do.
        let horizon_days = plan_horizon_days(&items, &rules);
        let busy = self
            .gateway
            .fetch_busy(now, now + Duration::days(horizon_days))
            .await?;

        let mut remote = RemoteOpCounts::default();

        // (b) Remove provider-side events of the plan being discarded.
        let prior = store(self.db.list_non_completed_assignments())?;
        for assignment in &prior {
            let Some(remote_id) = assignment.remote_event_id.as_deref() else {
                continue;
            };
            match self.gateway.delete_event(remote_id).await {
                Ok(()) => remote.deleted += 1,
                Err(_) => remote.delete_failures += 1,
            }
        }

        // (c) Clear local records. Fatal from here on.
        store(self.db.delete_non_completed_assignments())?;

        // (d) The pure engine pass.
        let plan = build_plan(&items, &rules, &busy, now, self.tz);

        // (e) Persist before any remote create; once this succeeds the
        // local plan is valid even if mirroring partially fails.
        store(self.db.insert_assignments(&plan.assignments))?;
        for item in items.iter().filter(|i| i.status != WorkItemStatus::Completed) {
            let placed = plan.assignments.iter().any(|a| a.work_item_id == item.id);
            let status = if placed {
                WorkItemStatus::Scheduled
            } else {
                WorkItemStatus::Pending
            };
            if status != item.status {
                store(self.db.set_work_item_status(&item.id, status))?;
            }
        }

        // (f) Mirror each new assignment, isolated per item.
        for assignment in &plan.assignments {
            match self.gateway.create_event(assignment).await {
                Ok(remote_id) => {
                    match self.db.set_remote_event_id(&assignment.id, Some(&remote_id)) {
                        Ok(()) => remote.created += 1,
                        Err(_) => remote.create_failures += 1,
                    }
                }
                Err(_) => remote.create_failures += 1,
            }
        }

        *self.last_finished.lock().unwrap() = Some(now);

        Ok(RecalcReport {
            assignments_created: plan.assignments.len(),
            conflicts_avoided: plan.conflicts_avoided,
            unscheduled_items: plan.unscheduled.len(),
            unscheduled_hours: plan.unscheduled.iter().map(|u| u.remaining_hours).sum(),
            remote,
            finished_at: Some(now),
        })
    }

    /// Incremental repair: detect assignments invalidated by newly
    /// discovered busy intervals and rebuild replacements for just
    /// those, leaving the rest of the plan untouched.
    ///
    /// # Errors
    /// Fails on busy-interval fetch failure or local persistence
    /// failure; per-item remote failures are counted.
    pub async fn repair(&self, now: DateTime<Utc>) -> Result<RepairReport, CoreError> {
        let busy = self
            .gateway
            .fetch_busy(now, now + Duration::days(RESCHEDULE_HORIZON_DAYS))
            .await?;

        let assignments = store(self.db.list_assignments())?;
        let resolved = resolve_conflicts(&assignments, &busy);
        let conflicted = resolved
            .iter()
            .filter(|a| a.status == AssignmentStatus::Conflicted)
            .count();
        if conflicted == 0 {
            return Ok(RepairReport::default());
        }

        let items = store(self.db.list_work_items())?;
        let rules = store(self.db.list_rules())?;
        let outcome = reschedule(&resolved, &items, &rules, &busy, now, self.tz);

        let mut remote = RemoteOpCounts::default();

        // The displaced originals' events no longer match reality.
        for original in resolved
            .iter()
            .filter(|a| a.status == AssignmentStatus::Conflicted)
        {
            let Some(remote_id) = original.remote_event_id.as_deref() else {
                continue;
            };
            match self.gateway.delete_event(remote_id).await {
                Ok(()) => remote.deleted += 1,
                Err(_) => remote.delete_failures += 1,
            }
        }

        // Swap the non-completed records for the repaired set.
        store(self.db.delete_non_completed_assignments())?;
        let replacement_rows: Vec<_> = outcome
            .assignments
            .iter()
            .filter(|a| a.status != AssignmentStatus::Completed)
            .cloned()
            .collect();
        store(self.db.insert_assignments(&replacement_rows))?;

        // Only freshly placed windows need a new event.
        for assignment in replacement_rows
            .iter()
            .filter(|a| a.remote_event_id.is_none())
        {
            match self.gateway.create_event(assignment).await {
                Ok(remote_id) => {
                    match self.db.set_remote_event_id(&assignment.id, Some(&remote_id)) {
                        Ok(()) => remote.created += 1,
                        Err(_) => remote.create_failures += 1,
                    }
                }
                Err(_) => remote.create_failures += 1,
            }
        }

        Ok(RepairReport {
            conflicted,
            rescheduled: conflicted - outcome.dropped.len(),
            dropped: outcome.dropped.len(),
            remote,
        })
    }

    /// Direct read access for callers that only present data.
    pub fn db(&self) -> &PlanDb {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    fn check_debounce(&self, now: DateTime<Utc>) -> Result<(), CoreError> {
        let last = self.last_finished.lock().unwrap();
        if let Some(finished) = *last {
            let elapsed = now - finished;
            if elapsed < self.debounce {
                return Err(CoreError::Debounced {
                    elapsed_ms: elapsed.num_milliseconds(),
                });
            }
        }
        Ok(())
    }
}

fn store<T>(result: Result<T, rusqlite::Error>) -> Result<T, CoreError> {
    result.map_err(|e| CoreError::Storage(StorageError::from(e)))
}
