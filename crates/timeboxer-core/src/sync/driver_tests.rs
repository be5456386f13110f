//! Tests for the reconciliation driver, using an in-memory fake gateway.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::availability::AvailabilityRule;
    use crate::conflict::BusyInterval;
    use crate::error::CoreError;
    use crate::scheduler::{Assignment, AssignmentStatus};
    use crate::storage::{PlanDb, PlannerConfig};
    use crate::sync::driver::Recalculator;
    use crate::sync::gateway::CalendarGateway;
    use crate::sync::types::SyncError;
    use crate::task::{WorkItem, WorkItemStatus};

    /// Fake provider recording every call, with injectable failures.
    #[derive(Default)]
    struct FakeGateway {
        busy: Vec<BusyInterval>,
        fail_fetch: bool,
        fail_first_creates: usize,
        fail_deletes: bool,
        created: Mutex<Vec<String>>,
        deleted: Mutex<Vec<String>>,
        create_calls: AtomicUsize,
    }

    impl CalendarGateway for FakeGateway {
        async fn fetch_busy(
            &self,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> Result<Vec<BusyInterval>, SyncError> {
            if self.fail_fetch {
                return Err(SyncError::CalendarApi("freeBusy unavailable".into()));
            }
            Ok(self.busy.clone())
        }

        async fn create_event(&self, assignment: &Assignment) -> Result<String, SyncError> {
            let call = self.create_calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first_creates {
                return Err(SyncError::CalendarApi("insert failed".into()));
            }
            self.created.lock().unwrap().push(assignment.id.clone());
            Ok(format!("evt-{call}"))
        }

        async fn delete_event(&self, remote_event_id: &str) -> Result<(), SyncError> {
            if self.fail_deletes {
                return Err(SyncError::CalendarApi("delete failed".into()));
            }
            self.deleted
                .lock()
                .unwrap()
                .push(remote_event_id.to_string());
            Ok(())
        }
    }

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
    }

    // 2026-03-02 is a Monday.
    fn monday_morning() -> DateTime<Utc> {
        utc(2, 8, 0)
    }

    fn seeded_db(hours: f64) -> PlanDb {
        let db = PlanDb::open_memory().unwrap();
        db.create_work_item(&WorkItem::new("Deep work", hours, 1).unwrap())
            .unwrap();
        db.create_rule(
            &AvailabilityRule::new("Weekday hour", vec![1, 2, 3, 4, 5], "09:00", "10:00").unwrap(),
        )
        .unwrap();
        db
    }

    fn recalculator(db: PlanDb, gateway: FakeGateway) -> Recalculator<FakeGateway> {
        Recalculator::new(db, gateway, &PlannerConfig::default())
    }

    #[tokio::test]
    async fn full_recalculation_persists_and_mirrors() {
        let recalc = recalculator(seeded_db(2.0), FakeGateway::default());
        let report = recalc.recalculate(monday_morning()).await.unwrap();

        assert_eq!(report.assignments_created, 2);
        assert_eq!(report.remote.created, 2);
        assert_eq!(report.remote.create_failures, 0);
        assert_eq!(report.unscheduled_items, 0);

        let rows = recalc.db().list_assignments().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start, utc(2, 9, 0));
        for row in &rows {
            assert!(row.remote_event_id.is_some());
        }

        let items = recalc.db().list_work_items().unwrap();
        assert_eq!(items[0].status, WorkItemStatus::Scheduled);
    }

    #[tokio::test]
    async fn partial_create_failure_does_not_abort_batch() {
        let gateway = FakeGateway {
            fail_first_creates: 1,
            ..Default::default()
        };
        let recalc = recalculator(seeded_db(3.0), gateway);
        let report = recalc.recalculate(monday_morning()).await.unwrap();

        assert_eq!(report.assignments_created, 3);
        assert_eq!(report.remote.create_failures, 1);
        assert_eq!(report.remote.created, 2);

        // Local state stays valid despite the partial remote failure.
        assert_eq!(recalc.db().list_assignments().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_before_any_teardown() {
        let db = seeded_db(1.0);
        let item = db.list_work_items().unwrap().remove(0);
        let prior = Assignment::new(&item, utc(2, 9, 0), utc(2, 10, 0));
        db.insert_assignments(&[prior]).unwrap();

        let gateway = FakeGateway {
            fail_fetch: true,
            ..Default::default()
        };
        let recalc = recalculator(db, gateway);

        let err = recalc.recalculate(monday_morning()).await.unwrap_err();
        assert!(matches!(err, CoreError::Sync(_)));
        // Nothing was discarded.
        assert_eq!(recalc.db().list_assignments().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn prior_remote_events_are_deleted() {
        let db = seeded_db(1.0);
        let item = db.list_work_items().unwrap().remove(0);
        let mut prior = Assignment::new(&item, utc(2, 9, 0), utc(2, 10, 0));
        prior.remote_event_id = Some("stale-evt".to_string());
        db.insert_assignments(&[prior]).unwrap();

        let recalc = recalculator(db, FakeGateway::default());
        let report = recalc.recalculate(monday_morning()).await.unwrap();

        assert_eq!(report.remote.deleted, 1);
        assert_eq!(
            *recalc.gateway().deleted.lock().unwrap(),
            vec!["stale-evt".to_string()]
        );
    }

    #[tokio::test]
    async fn delete_failures_counted_not_fatal() {
        let db = seeded_db(1.0);
        let item = db.list_work_items().unwrap().remove(0);
        let mut prior = Assignment::new(&item, utc(2, 9, 0), utc(2, 10, 0));
        prior.remote_event_id = Some("stale-evt".to_string());
        db.insert_assignments(&[prior]).unwrap();

        let gateway = FakeGateway {
            fail_deletes: true,
            ..Default::default()
        };
        let recalc = recalculator(db, gateway);
        let report = recalc.recalculate(monday_morning()).await.unwrap();

        assert_eq!(report.remote.delete_failures, 1);
        assert_eq!(report.assignments_created, 1);
    }

    #[tokio::test]
    async fn rapid_second_trigger_is_debounced() {
        let recalc = recalculator(seeded_db(1.0), FakeGateway::default());
        let now = monday_morning();

        recalc.recalculate(now).await.unwrap();

        let err = recalc
            .recalculate(now + Duration::milliseconds(500))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Debounced { .. }));

        // After the debounce window it runs again.
        recalc.recalculate(now + Duration::seconds(2)).await.unwrap();
    }

    #[tokio::test]
    async fn repair_moves_conflicted_assignment() {
        let db = seeded_db(1.0);
        let item = db.list_work_items().unwrap().remove(0);
        let mut committed = Assignment::new(&item, utc(2, 9, 0), utc(2, 10, 0));
        committed.remote_event_id = Some("old-evt".to_string());
        db.insert_assignments(&[committed]).unwrap();

        let gateway = FakeGateway {
            // A meeting landed exactly on the committed window.
            busy: vec![BusyInterval::new(utc(2, 9, 0), utc(2, 10, 0))],
            ..Default::default()
        };
        let recalc = recalculator(db, gateway);
        let report = recalc.repair(monday_morning()).await.unwrap();

        assert_eq!(report.conflicted, 1);
        assert_eq!(report.rescheduled, 1);
        assert_eq!(report.dropped, 0);
        assert_eq!(report.remote.deleted, 1);
        assert_eq!(report.remote.created, 1);

        let rows = recalc.db().list_assignments().unwrap();
        assert_eq!(rows.len(), 1);
        // Replacement lands on Tuesday, scheduled again, freshly
        // mirrored.
        assert_eq!(rows[0].start, utc(3, 9, 0));
        assert_eq!(rows[0].status, AssignmentStatus::Scheduled);
        assert!(rows[0].remote_event_id.is_some());
        assert_ne!(rows[0].remote_event_id.as_deref(), Some("old-evt"));
    }

    #[tokio::test]
    async fn repair_without_conflicts_is_a_noop() {
        let db = seeded_db(1.0);
        let item = db.list_work_items().unwrap().remove(0);
        let committed = Assignment::new(&item, utc(2, 9, 0), utc(2, 10, 0));
        db.insert_assignments(&[committed.clone()]).unwrap();

        let gateway = FakeGateway {
            busy: vec![BusyInterval::new(utc(2, 12, 0), utc(2, 13, 0))],
            ..Default::default()
        };
        let recalc = recalculator(db, gateway);
        let report = recalc.repair(monday_morning()).await.unwrap();

        assert_eq!(report.conflicted, 0);
        let rows = recalc.db().list_assignments().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, committed.id);
    }
}
