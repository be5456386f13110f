//! HTTP-level tests for the Google gateway against a mock server.

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::scheduler::Assignment;
    use crate::sync::gateway::CalendarGateway;
    use crate::sync::google::GoogleCalendarGateway;
    use crate::sync::types::SyncError;
    use crate::task::WorkItem;

    fn window() -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn fetch_busy_parses_provider_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/freeBusy")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"calendars": {"primary": {"busy": [
                    {"start": "2026-03-02T09:00:00Z", "end": "2026-03-02T10:00:00Z"},
                    {"start": "2026-03-03T09:00:00Z"}
                ]}}}"#,
            )
            .create_async()
            .await;

        let gateway =
            GoogleCalendarGateway::new("token", "primary").with_base_url(&server.url());
        let (from, to) = window();
        let busy = gateway.fetch_busy(from, to).await.unwrap();

        mock.assert_async().await;
        // The entry missing its end is skipped, never a crash.
        assert_eq!(busy.len(), 1);
        assert_eq!(
            busy[0].start,
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn fetch_busy_maps_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/freeBusy")
            .with_status(401)
            .create_async()
            .await;

        let gateway =
            GoogleCalendarGateway::new("expired", "primary").with_base_url(&server.url());
        let (from, to) = window();
        let err = gateway.fetch_busy(from, to).await.unwrap_err();
        assert!(matches!(err, SyncError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn create_event_returns_remote_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/calendars/primary/events")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "evt-123", "status": "confirmed"}"#)
            .create_async()
            .await;

        let gateway =
            GoogleCalendarGateway::new("token", "primary").with_base_url(&server.url());
        let item = WorkItem::new("Mirror me", 1.0, 1).unwrap();
        let assignment = Assignment::new(
            &item,
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
        );

        let remote_id = gateway.create_event(&assignment).await.unwrap();
        mock.assert_async().await;
        assert_eq!(remote_id, "evt-123");
    }

    #[tokio::test]
    async fn delete_event_tolerates_already_gone() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/calendars/primary/events/evt-9")
            .with_status(410)
            .create_async()
            .await;

        let gateway =
            GoogleCalendarGateway::new("token", "primary").with_base_url(&server.url());
        gateway.delete_event("evt-9").await.unwrap();
    }

    #[tokio::test]
    async fn delete_event_surfaces_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/calendars/primary/events/evt-9")
            .with_status(500)
            .create_async()
            .await;

        let gateway =
            GoogleCalendarGateway::new("token", "primary").with_base_url(&server.url());
        let err = gateway.delete_event("evt-9").await.unwrap_err();
        assert!(matches!(err, SyncError::CalendarApi(_)));
    }
}
