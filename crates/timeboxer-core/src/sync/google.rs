//! Google Calendar gateway.
//!
//! Thin REST client implementing [`CalendarGateway`]. Token acquisition
//! is the caller's problem -- an access token arrives at construction
//! and OAuth exchange stays outside this crate.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::conflict::BusyInterval;
use crate::scheduler::Assignment;
use crate::sync::gateway::CalendarGateway;
use crate::sync::types::SyncError;

const GOOGLE_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar REST gateway.
pub struct GoogleCalendarGateway {
    http: reqwest::Client,
    base_url: String,
    calendar_id: String,
    access_token: String,
}

impl GoogleCalendarGateway {
    /// Create a gateway for one calendar with a ready access token.
    pub fn new(access_token: &str, calendar_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: GOOGLE_API_BASE.to_string(),
            calendar_id: calendar_id.to_string(),
            access_token: access_token.to_string(),
        }
    }

    /// Point the gateway at a different API root (tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        )
    }
}

impl CalendarGateway for GoogleCalendarGateway {
    async fn fetch_busy(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, SyncError> {
        let body = json!({
            "timeMin": from.to_rfc3339(),
            "timeMax": to.to_rfc3339(),
            "items": [{"id": &self.calendar_id}],
        });

        let resp = self
            .http
            .post(format!("{}/freeBusy", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SyncError::AuthenticationRequired);
        }
        if !resp.status().is_success() {
            return Err(SyncError::CalendarApi(format!(
                "freeBusy returned {}",
                resp.status()
            )));
        }

        let payload: serde_json::Value = resp.json().await?;
        Ok(parse_free_busy(&payload, &self.calendar_id))
    }

    async fn create_event(&self, assignment: &Assignment) -> Result<String, SyncError> {
        let body = json!({
            "summary": &assignment.work_item_name,
            "start": {"dateTime": assignment.start.to_rfc3339()},
            "end": {"dateTime": assignment.end.to_rfc3339()},
            "extendedProperties": {
                "private": {
                    "timeboxer_assignment": &assignment.id,
                    "timeboxer_item": &assignment.work_item_id,
                }
            },
        });

        let resp = self
            .http
            .post(self.events_url())
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SyncError::CalendarApi(format!(
                "event insert returned {}",
                resp.status()
            )));
        }

        let payload: serde_json::Value = resp.json().await?;
        payload["id"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| SyncError::MalformedResponse("event insert response has no id".into()))
    }

    async fn delete_event(&self, remote_event_id: &str) -> Result<(), SyncError> {
        let url = format!(
            "{}/{}",
            self.events_url(),
            urlencoding::encode(remote_event_id)
        );

        let resp = self
            .http
            .delete(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        // 404/410 mean the event is already gone; that is the outcome
        // we wanted.
        if resp.status().is_success()
            || resp.status() == reqwest::StatusCode::NOT_FOUND
            || resp.status() == reqwest::StatusCode::GONE
        {
            Ok(())
        } else {
            Err(SyncError::CalendarApi(format!(
                "event delete returned {}",
                resp.status()
            )))
        }
    }
}

/// Extract busy intervals for one calendar from a freeBusy response.
///
/// Entries missing either endpoint, or with endpoints that do not parse
/// as RFC3339, are skipped -- a malformed provider row must never crash
/// the pass or block a slot it does not actually cover.
pub fn parse_free_busy(payload: &serde_json::Value, calendar_id: &str) -> Vec<BusyInterval> {
    let Some(entries) = payload["calendars"][calendar_id]["busy"].as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let start = parse_instant(entry["start"].as_str()?)?;
            let end = parse_instant(entry["end"].as_str()?)?;
            Some(BusyInterval::new(start, end))
        })
        .collect()
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_free_busy_reads_intervals() {
        let payload = json!({
            "kind": "calendar#freeBusy",
            "calendars": {
                "primary": {
                    "busy": [
                        {"start": "2026-03-02T09:00:00Z", "end": "2026-03-02T10:00:00Z"},
                        {"start": "2026-03-03T14:00:00Z", "end": "2026-03-03T15:30:00Z"}
                    ]
                }
            }
        });

        let busy = parse_free_busy(&payload, "primary");
        assert_eq!(busy.len(), 2);
        assert_eq!(busy[0].start.to_rfc3339(), "2026-03-02T09:00:00+00:00");
    }

    #[test]
    fn parse_free_busy_skips_incomplete_entries() {
        let payload = json!({
            "calendars": {
                "primary": {
                    "busy": [
                        {"start": "2026-03-02T09:00:00Z"},
                        {"end": "2026-03-02T10:00:00Z"},
                        {"start": "not a time", "end": "2026-03-02T10:00:00Z"},
                        {"start": "2026-03-04T09:00:00Z", "end": "2026-03-04T10:00:00Z"}
                    ]
                }
            }
        });

        let busy = parse_free_busy(&payload, "primary");
        assert_eq!(busy.len(), 1);
        assert_eq!(busy[0].end.to_rfc3339(), "2026-03-04T10:00:00+00:00");
    }

    #[test]
    fn parse_free_busy_handles_missing_calendar() {
        let payload = json!({"calendars": {}});
        assert!(parse_free_busy(&payload, "primary").is_empty());
    }
}
