//! Busy-interval blocking.
//!
//! Busy intervals come from an external calendar and are opaque and
//! read-only here; the engine only ever compares endpoints against
//! candidate windows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::slots::TimeSlot;

/// An externally supplied occupied time range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Half-open overlap test. Touching endpoints do not overlap.
pub fn overlaps(
    start_a: DateTime<Utc>,
    end_a: DateTime<Utc>,
    start_b: DateTime<Utc>,
    end_b: DateTime<Utc>,
) -> bool {
    start_a < end_b && start_b < end_a
}

/// Mark every slot overlapping a busy interval unavailable.
///
/// A cleared flag is never set back within the same pass, so calling this
/// again with the same busy list is a no-op for already-blocked slots.
/// Returns the number of slots blocked by this call.
pub fn block_conflicting(slots: &mut [TimeSlot], busy: &[BusyInterval]) -> usize {
    if busy.is_empty() {
        return 0;
    }

    let mut blocked = 0;
    for slot in slots.iter_mut().filter(|s| s.available) {
        if busy
            .iter()
            .any(|b| overlaps(slot.start, slot.end, b.start, b.end))
        {
            slot.available = false;
            blocked += 1;
        }
    }
    blocked
}
