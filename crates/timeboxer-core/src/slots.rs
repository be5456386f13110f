//! Slot materialization: rules x horizon -> dated candidate windows.
//!
//! Slots are ephemeral. They are regenerated from scratch on every pass
//! and never persisted; only committed assignments survive a pass.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::{parse_clock_time, AvailabilityRule};

/// A concrete, dated candidate window derived from one rule occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_hours: f64,
    /// Cleared by conflict blocking or consumption; never set back
    /// within the same pass.
    pub available: bool,
}

impl TimeSlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            duration_hours: (end - start).num_seconds() as f64 / 3600.0,
            available: true,
        }
    }
}

/// Round up to the next quarter-hour boundary: zero out seconds and
/// sub-second parts, then ceil minutes to a multiple of 15.
pub fn round_up_to_quarter(t: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = t
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t);

    let rem = truncated.minute() % 15;
    if rem == 0 {
        truncated
    } else {
        truncated + chrono::Duration::minutes((15 - rem) as i64)
    }
}

/// Materialize active rules into a time-ordered slot list over a horizon.
///
/// Rule clock times are interpreted in the caller-supplied offset and
/// converted to absolute instants immediately; all later overlap and
/// ordering math happens on instants. Candidates wholly in the past are
/// discarded; a candidate straddling `now` is clamped to start at `now`
/// rounded up to the next quarter hour. The result is sorted ascending
/// by start; two rules overlapping the same day keep their input order.
pub fn generate_slots(
    rules: &[AvailabilityRule],
    horizon_days: i64,
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> Vec<TimeSlot> {
    let mut slots = Vec::new();
    let today = now.with_timezone(&tz).date_naive();

    for day_offset in 0..horizon_days.max(0) as u64 {
        let Some(date) = today.checked_add_days(Days::new(day_offset)) else {
            break;
        };
        let weekday = date.weekday().num_days_from_sunday() as u8;

        for rule in rules.iter().filter(|r| r.active) {
            if !rule.weekdays.contains(&weekday) {
                continue;
            }

            let (Ok(start_min), Ok(end_min)) = (
                parse_clock_time(&rule.start_time),
                parse_clock_time(&rule.end_time),
            ) else {
                // Unparseable rows are skipped, not fatal.
                continue;
            };

            let Some(start_local) = clock_on(date, start_min) else { continue };
            let Some(end_local) = clock_on(date, end_min) else { continue };

            let Some(mut start) = to_instant(start_local, tz) else { continue };
            let Some(end) = to_instant(end_local, tz) else { continue };

            if end <= now {
                continue;
            }
            if start < now {
                start = round_up_to_quarter(now);
            }
            if start >= end {
                continue;
            }

            let slot = TimeSlot::new(start, end);
            if let Some(min) = rule.min_duration_minutes {
                if (slot.end - slot.start).num_minutes() < min {
                    continue;
                }
            }
            slots.push(slot);
        }
    }

    slots.sort_by_key(|s| s.start);
    slots
}

fn clock_on(date: chrono::NaiveDate, minutes_from_midnight: u32) -> Option<chrono::NaiveDateTime> {
    let time = NaiveTime::from_hms_opt(minutes_from_midnight / 60, minutes_from_midnight % 60, 0)?;
    Some(date.and_time(time))
}

fn to_instant(local: chrono::NaiveDateTime, tz: FixedOffset) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .single()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn weekday_rule(start: &str, end: &str) -> AvailabilityRule {
        AvailabilityRule::new("Weekdays", vec![1, 2, 3, 4, 5], start, end).unwrap()
    }

    const UTC_OFFSET: i32 = 0;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(UTC_OFFSET).unwrap()
    }

    #[test]
    fn rounds_up_to_next_quarter() {
        assert_eq!(
            round_up_to_quarter(utc(2026, 3, 2, 9, 7)),
            utc(2026, 3, 2, 9, 15)
        );
        assert_eq!(
            round_up_to_quarter(utc(2026, 3, 2, 9, 46)),
            utc(2026, 3, 2, 10, 0)
        );
        // Already on a boundary: unchanged.
        assert_eq!(
            round_up_to_quarter(utc(2026, 3, 2, 9, 30)),
            utc(2026, 3, 2, 9, 30)
        );
    }

    #[test]
    fn one_slot_per_matching_weekday() {
        // 2026-03-02 is a Monday.
        let now = utc(2026, 3, 2, 8, 0);
        let slots = generate_slots(&[weekday_rule("09:00", "10:00")], 7, now, tz());

        // Mon..Fri of this week: 5 occurrences, weekend skipped.
        assert_eq!(slots.len(), 5);
        assert_eq!(slots[0].start, utc(2026, 3, 2, 9, 0));
        assert_eq!(slots[4].start, utc(2026, 3, 6, 9, 0));
        for slot in &slots {
            assert!((slot.duration_hours - 1.0).abs() < 1e-9);
            assert!(slot.available);
        }
    }

    #[test]
    fn past_occurrences_discarded() {
        // Monday 10:30, after today's window closed.
        let now = utc(2026, 3, 2, 10, 30);
        let slots = generate_slots(&[weekday_rule("09:00", "10:00")], 7, now, tz());
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].start, utc(2026, 3, 3, 9, 0));
    }

    #[test]
    fn straddling_slot_clamped_and_rounded() {
        // Monday 09:07, inside today's 09:00-11:00 window.
        let now = utc(2026, 3, 2, 9, 7);
        let slots = generate_slots(&[weekday_rule("09:00", "11:00")], 1, now, tz());
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start, utc(2026, 3, 2, 9, 15));
        assert_eq!(slots[0].end, utc(2026, 3, 2, 11, 0));
        assert!((slots[0].duration_hours - 1.75).abs() < 1e-9);
    }

    #[test]
    fn clamp_to_empty_window_skipped() {
        // Monday 09:50; rounding lands on 10:00 == end.
        let now = utc(2026, 3, 2, 9, 50);
        let slots = generate_slots(&[weekday_rule("09:00", "10:00")], 1, now, tz());
        assert!(slots.is_empty());
    }

    #[test]
    fn min_duration_filters_clamped_slot() {
        let mut rule = weekday_rule("09:00", "10:00");
        rule.min_duration_minutes = Some(30);

        // Clamped to 09:45-10:00 = 15 minutes, below the 30-minute floor.
        let now = utc(2026, 3, 2, 9, 42);
        assert!(generate_slots(&[rule.clone()], 1, now, tz()).is_empty());

        // Untouched occurrences still pass.
        let now = utc(2026, 3, 2, 8, 0);
        assert_eq!(generate_slots(&[rule], 1, now, tz()).len(), 1);
    }

    #[test]
    fn rule_times_interpreted_in_caller_offset() {
        // UTC+9: a 09:00 local rule is 00:00 UTC.
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = utc(2026, 3, 1, 12, 0); // Sunday noon UTC = Sunday 21:00 local
        let rule = weekday_rule("09:00", "10:00");
        let slots = generate_slots(&[rule], 3, now, tokyo);

        // Local Monday 09:00 is Monday 00:00 UTC.
        assert_eq!(slots[0].start, utc(2026, 3, 2, 0, 0));
    }

    #[test]
    fn overlapping_rules_keep_input_order_on_ties() {
        let a = AvailabilityRule::new("A", vec![1], "09:00", "10:00").unwrap();
        let b = AvailabilityRule::new("B", vec![1], "09:00", "11:00").unwrap();
        let now = utc(2026, 3, 2, 8, 0);

        let slots = generate_slots(&[a.clone(), b.clone()], 1, now, tz());
        assert_eq!(slots.len(), 2);
        // Stable sort: equal starts keep A before B.
        assert_eq!(slots[0].end, utc(2026, 3, 2, 10, 0));
        assert_eq!(slots[1].end, utc(2026, 3, 2, 11, 0));

        let again = generate_slots(&[a, b], 1, now, tz());
        assert_eq!(slots, again);
    }

    proptest! {
        #[test]
        fn slots_sorted_future_and_nonempty_windows(
            start_hour in 0u32..23,
            len_minutes in 15i64..600,
            now_hour in 0u32..24,
            now_minute_quarter in 0u32..4,
            horizon in 1i64..60,
        ) {
            let end_minutes = (start_hour as i64 * 60 + len_minutes).min(24 * 60 - 1);
            let rule = AvailabilityRule::new(
                "Prop",
                vec![0, 1, 2, 3, 4, 5, 6],
                &format!("{:02}:{:02}", start_hour, 0),
                &format!("{:02}:{:02}", end_minutes / 60, end_minutes % 60),
            );
            prop_assume!(rule.is_ok());
            let rule = rule.unwrap();

            // Whole-quarter now so the literal clamp rule cannot land behind it.
            let now = utc(2026, 3, 2, 0, 0)
                + chrono::Duration::minutes(now_hour as i64 * 60 + now_minute_quarter as i64 * 15);
            let slots = generate_slots(&[rule], horizon, now, tz());

            for pair in slots.windows(2) {
                prop_assert!(pair[0].start <= pair[1].start);
            }
            for slot in &slots {
                prop_assert!(slot.start >= now);
                prop_assert!(slot.start < slot.end);
                prop_assert!(slot.available);
            }
        }
    }
}
