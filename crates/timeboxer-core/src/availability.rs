//! Availability rules: recurring weekly templates of open time.
//!
//! A rule is not tied to absolute dates; it names weekdays plus a local
//! clock-time window and gets materialized into dated slots by the
//! `slots` module.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A recurring weekly availability window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityRule {
    pub id: String,
    pub name: String,
    /// 0 = Sunday ... 6 = Saturday.
    pub weekdays: Vec<u8>,
    /// HH:MM, local to the planner timezone.
    pub start_time: String,
    /// HH:MM, local to the planner timezone. Must be after start_time.
    pub end_time: String,
    pub active: bool,
    /// Slots shorter than this after now-clamping are not emitted.
    pub min_duration_minutes: Option<i64>,
}

impl AvailabilityRule {
    /// Create a new active rule with a fresh id.
    ///
    /// # Errors
    /// Returns a validation error for malformed clock times, weekdays
    /// outside 0..=6, an empty name, or a window that does not end after
    /// it starts.
    pub fn new(
        name: &str,
        weekdays: Vec<u8>,
        start_time: &str,
        end_time: &str,
    ) -> Result<Self, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName { entity: "availability rule" });
        }
        for day in &weekdays {
            if *day > 6 {
                return Err(ValidationError::InvalidWeekday { value: *day });
            }
        }
        let start = parse_clock_time(start_time)?;
        let end = parse_clock_time(end_time)?;
        if end <= start {
            return Err(ValidationError::InvalidRuleWindow {
                start: start_time.to_string(),
                end: end_time.to_string(),
            });
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            weekdays,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            active: true,
            min_duration_minutes: None,
        })
    }

    /// Duration of one occurrence, in hours.
    ///
    /// Returns 0.0 for a rule whose times no longer parse (possible for
    /// rows written by hand into the database).
    pub fn occurrence_hours(&self) -> f64 {
        match (parse_clock_time(&self.start_time), parse_clock_time(&self.end_time)) {
            (Ok(start), Ok(end)) if end > start => (end - start) as f64 / 60.0,
            _ => 0.0,
        }
    }
}

/// Parse an HH:MM clock time into minutes from midnight.
///
/// # Errors
/// Returns `ValidationError::InvalidClockTime` for anything that is not
/// two colon-separated numbers within 0..24 / 0..60.
pub fn parse_clock_time(value: &str) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::InvalidClockTime {
        value: value.to_string(),
    };

    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 2 {
        return Err(invalid());
    }

    let hour: u32 = parts[0].parse().map_err(|_| invalid())?;
    let minute: u32 = parts[1].parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }

    Ok(hour * 60 + minute)
}

/// Implied average weekly available hours across active rules.
///
/// Sum over active rules of per-occurrence duration times the number of
/// weekdays the rule covers. Drives horizon sizing.
pub fn weekly_capacity_hours(rules: &[AvailabilityRule]) -> f64 {
    rules
        .iter()
        .filter(|r| r.active)
        .map(|r| r.occurrence_hours() * r.weekdays.len() as f64)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_clock_times() {
        assert_eq!(parse_clock_time("09:00").unwrap(), 540);
        assert_eq!(parse_clock_time("00:00").unwrap(), 0);
        assert_eq!(parse_clock_time("23:59").unwrap(), 1439);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(parse_clock_time("9").is_err());
        assert!(parse_clock_time("24:00").is_err());
        assert!(parse_clock_time("12:60").is_err());
        assert!(parse_clock_time("ab:cd").is_err());
        assert!(parse_clock_time("09:00:00").is_err());
    }

    #[test]
    fn rule_rejects_inverted_window() {
        assert!(AvailabilityRule::new("Evening", vec![1], "18:00", "17:00").is_err());
        assert!(AvailabilityRule::new("Empty", vec![1], "09:00", "09:00").is_err());
    }

    #[test]
    fn rule_rejects_bad_weekday() {
        assert!(AvailabilityRule::new("Bad day", vec![7], "09:00", "10:00").is_err());
    }

    #[test]
    fn occurrence_hours_for_weekday_mornings() {
        let rule = AvailabilityRule::new("Mornings", vec![1, 2, 3, 4, 5], "09:00", "10:30").unwrap();
        assert!((rule.occurrence_hours() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn weekly_capacity_counts_active_rules_only() {
        let mornings =
            AvailabilityRule::new("Mornings", vec![1, 2, 3, 4, 5], "09:00", "10:00").unwrap();
        let mut weekend = AvailabilityRule::new("Weekend", vec![0, 6], "10:00", "14:00").unwrap();
        weekend.active = false;

        // 5 x 1h active; the inactive 2 x 4h contributes nothing.
        assert!((weekly_capacity_hours(&[mornings, weekend]) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn rule_serialization() {
        let rule = AvailabilityRule::new("Mornings", vec![1, 3, 5], "08:00", "11:00").unwrap();
        let json = serde_json::to_string(&rule).unwrap();
        let decoded: AvailabilityRule = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, rule);
    }
}
