//! Calendar provider seam.

use chrono::{DateTime, Utc};

use crate::conflict::BusyInterval;
use crate::scheduler::Assignment;
use crate::sync::types::SyncError;

/// The narrow interface the reconciliation driver needs from a calendar
/// provider. Busy intervals are read-only; one remote event is created
/// per committed assignment and deleted when the assignment goes away.
pub trait CalendarGateway: Send + Sync {
    /// Fetch busy intervals covering `[from, to)`.
    fn fetch_busy(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<BusyInterval>, SyncError>> + Send;

    /// Create the remote representation of one assignment, returning
    /// the provider-side event id.
    fn create_event(
        &self,
        assignment: &Assignment,
    ) -> impl std::future::Future<Output = Result<String, SyncError>> + Send;

    /// Delete one remote event.
    fn delete_event(
        &self,
        remote_event_id: &str,
    ) -> impl std::future::Future<Output = Result<(), SyncError>> + Send;
}
