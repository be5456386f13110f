//! # Timeboxer Core Library
//!
//! Core business logic for Timeboxer, a personal planner that time-boxes
//! prioritized work items into recurring weekly availability windows
//! while steering around externally supplied busy time. The standalone
//! CLI binary is a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Engine**: stateless pure functions -- slot materialization,
//!   busy-interval blocking, priority-ordered greedy allocation, and
//!   conflict detection with targeted reschedule
//! - **Storage**: SQLite-based plan storage and TOML-based configuration
//! - **Sync**: Google Calendar gateway plus the reconciliation driver
//!   that reruns the engine against fresh busy intervals
//!
//! ## Key Components
//!
//! - [`engine::build_plan`]: run the whole pipeline for one pass
//! - [`Recalculator`]: full-rebuild and incremental-repair driver
//! - [`PlanDb`]: work item, rule, and assignment persistence
//! - [`CalendarGateway`]: the seam a calendar provider implements

pub mod availability;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod slots;
pub mod storage;
pub mod sync;
pub mod task;

pub use availability::{parse_clock_time, weekly_capacity_hours, AvailabilityRule};
pub use conflict::{block_conflicting, overlaps, BusyInterval};
pub use engine::{build_plan, plan_horizon_days, PlanOutcome, SAFETY_HORIZON_DAYS};
pub use error::{CoreError, StorageError, ValidationError};
pub use scheduler::resolver::{reschedule, resolve_conflicts, RescheduleOutcome};
pub use scheduler::{schedule, Assignment, AssignmentStatus, ScheduleOutcome, UnscheduledRemainder};
pub use slots::{generate_slots, TimeSlot};
pub use storage::{PlanDb, PlannerConfig};
pub use sync::{CalendarGateway, GoogleCalendarGateway, RecalcReport, Recalculator, SyncError};
pub use task::{WorkItem, WorkItemStatus};
