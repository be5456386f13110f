//! Calendar provider integration layer.
//!
//! Busy intervals flow in from the provider; one event per committed
//! assignment flows out. The driver in this module owns the full
//! recalculation sequence and the incremental repair path.

pub mod driver;
pub mod gateway;
pub mod google;
pub mod types;

#[cfg(test)]
mod driver_tests;
#[cfg(test)]
mod google_tests;

pub use driver::{Recalculator, RepairReport};
pub use gateway::CalendarGateway;
pub use google::{parse_free_busy, GoogleCalendarGateway};
pub use types::{RecalcReport, RemoteOpCounts, SyncError};
