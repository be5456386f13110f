//! SQLite-based storage for work items, availability rules, and
//! committed assignments.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use super::migrations;
use crate::scheduler::{Assignment, AssignmentStatus};
use crate::availability::AvailabilityRule;
use crate::task::{WorkItem, WorkItemStatus};

// === Helper Functions ===

/// Parse work item status from database string
fn parse_item_status(status_str: &str) -> WorkItemStatus {
    match status_str {
        "scheduled" => WorkItemStatus::Scheduled,
        "completed" => WorkItemStatus::Completed,
        _ => WorkItemStatus::Pending,
    }
}

/// Format work item status for database storage
fn format_item_status(status: WorkItemStatus) -> &'static str {
    match status {
        WorkItemStatus::Pending => "pending",
        WorkItemStatus::Scheduled => "scheduled",
        WorkItemStatus::Completed => "completed",
    }
}

/// Parse assignment status from database string
fn parse_assignment_status(status_str: &str) -> AssignmentStatus {
    match status_str {
        "completed" => AssignmentStatus::Completed,
        "conflicted" => AssignmentStatus::Conflicted,
        _ => AssignmentStatus::Scheduled,
    }
}

/// Format assignment status for database storage
fn format_assignment_status(status: AssignmentStatus) -> &'static str {
    match status {
        AssignmentStatus::Scheduled => "scheduled",
        AssignmentStatus::Completed => "completed",
        AssignmentStatus::Conflicted => "conflicted",
    }
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Build a WorkItem from a database row
fn row_to_work_item(row: &rusqlite::Row) -> Result<WorkItem, rusqlite::Error> {
    let status_str: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;

    Ok(WorkItem {
        id: row.get(0)?,
        name: row.get(1)?,
        estimated_hours: row.get(2)?,
        priority: row.get::<_, i64>(3)? as u32,
        status: parse_item_status(&status_str),
        created_at: parse_datetime_fallback(&created_at),
        updated_at: parse_datetime_fallback(&updated_at),
    })
}

/// Build an AvailabilityRule from a database row
fn row_to_rule(row: &rusqlite::Row) -> Result<AvailabilityRule, rusqlite::Error> {
    let weekdays_json: String = row.get(2)?;

    Ok(AvailabilityRule {
        id: row.get(0)?,
        name: row.get(1)?,
        weekdays: serde_json::from_str(&weekdays_json).unwrap_or_default(),
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        active: row.get::<_, i64>(5)? != 0,
        min_duration_minutes: row.get(6)?,
    })
}

/// Build an Assignment from a database row
fn row_to_assignment(row: &rusqlite::Row) -> Result<Assignment, rusqlite::Error> {
    let start: String = row.get(3)?;
    let end: String = row.get(4)?;
    let status_str: String = row.get(6)?;

    Ok(Assignment {
        id: row.get(0)?,
        work_item_id: row.get(1)?,
        work_item_name: row.get(2)?,
        start: parse_datetime_fallback(&start),
        end: parse_datetime_fallback(&end),
        duration_hours: row.get(5)?,
        status: parse_assignment_status(&status_str),
        priority: row.get::<_, i64>(7)? as u32,
        color: row.get(8)?,
        remote_event_id: row.get(9)?,
    })
}

const ASSIGNMENT_COLUMNS: &str = "id, work_item_id, work_item_name, start_time, end_time, \
     duration_hours, status, priority, color, remote_event_id";

/// SQLite-backed plan storage.
pub struct PlanDb {
    conn: Connection,
}

impl PlanDb {
    /// Open (and migrate) the database at the default location.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("timeboxer.db");
        Self::open_at(&path)
    }

    /// Open (and migrate) a database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let conn = Connection::open(path)?;
        migrations::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, Box<dyn std::error::Error>> {
        let conn = Connection::open_in_memory()?;
        migrations::migrate(&conn)?;
        Ok(Self { conn })
    }

    // === Work items ===

    pub fn create_work_item(&self, item: &WorkItem) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO work_items (id, name, estimated_hours, priority, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.id,
                item.name,
                item.estimated_hours,
                item.priority as i64,
                format_item_status(item.status),
                item.created_at.to_rfc3339(),
                item.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_work_item(&self, id: &str) -> Result<Option<WorkItem>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT id, name, estimated_hours, priority, status, created_at, updated_at
                 FROM work_items WHERE id = ?1",
                params![id],
                row_to_work_item,
            )
            .optional()
    }

    /// All work items, ascending by priority then creation time.
    pub fn list_work_items(&self) -> Result<Vec<WorkItem>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, estimated_hours, priority, status, created_at, updated_at
             FROM work_items ORDER BY priority ASC, created_at ASC",
        )?;
        let items = stmt
            .query_map([], row_to_work_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn update_work_item(&self, item: &WorkItem) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "UPDATE work_items
             SET name = ?2, estimated_hours = ?3, priority = ?4, status = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                item.id,
                item.name,
                item.estimated_hours,
                item.priority as i64,
                format_item_status(item.status),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn set_work_item_status(
        &self,
        id: &str,
        status: WorkItemStatus,
    ) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "UPDATE work_items SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, format_item_status(status), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Rewrite priorities so the given ids rank 1..n in order. Ids not
    /// listed keep their old priority.
    pub fn reorder_work_items(&self, ids_in_order: &[String]) -> Result<(), rusqlite::Error> {
        for (index, id) in ids_in_order.iter().enumerate() {
            self.conn.execute(
                "UPDATE work_items SET priority = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, (index + 1) as i64, Utc::now().to_rfc3339()],
            )?;
        }
        Ok(())
    }

    pub fn delete_work_item(&self, id: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM assignments WHERE work_item_id = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM work_items WHERE id = ?1", params![id])?;
        Ok(())
    }

    // === Availability rules ===

    pub fn create_rule(&self, rule: &AvailabilityRule) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO availability_rules
             (id, name, weekdays, start_time, end_time, active, min_duration_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                rule.id,
                rule.name,
                serde_json::to_string(&rule.weekdays).unwrap_or_else(|_| "[]".to_string()),
                rule.start_time,
                rule.end_time,
                rule.active as i64,
                rule.min_duration_minutes,
            ],
        )?;
        Ok(())
    }

    pub fn list_rules(&self) -> Result<Vec<AvailabilityRule>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, weekdays, start_time, end_time, active, min_duration_minutes
             FROM availability_rules ORDER BY name ASC",
        )?;
        let rules = stmt
            .query_map([], row_to_rule)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    pub fn set_rule_active(&self, id: &str, active: bool) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "UPDATE availability_rules SET active = ?2 WHERE id = ?1",
            params![id, active as i64],
        )?;
        Ok(())
    }

    pub fn delete_rule(&self, id: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM availability_rules WHERE id = ?1", params![id])?;
        Ok(())
    }

    // === Assignments ===

    pub fn insert_assignments(&self, assignments: &[Assignment]) -> Result<(), rusqlite::Error> {
        for a in assignments {
            self.conn.execute(
                "INSERT INTO assignments
                 (id, work_item_id, work_item_name, start_time, end_time,
                  duration_hours, status, priority, color, remote_event_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    a.id,
                    a.work_item_id,
                    a.work_item_name,
                    a.start.to_rfc3339(),
                    a.end.to_rfc3339(),
                    a.duration_hours,
                    format_assignment_status(a.status),
                    a.priority as i64,
                    a.color,
                    a.remote_event_id,
                ],
            )?;
        }
        Ok(())
    }

    /// All assignments, ascending by start time.
    pub fn list_assignments(&self) -> Result<Vec<Assignment>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments ORDER BY start_time ASC"
        ))?;
        let assignments = stmt
            .query_map([], row_to_assignment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assignments)
    }

    /// Assignments a recalculation is allowed to discard.
    pub fn list_non_completed_assignments(&self) -> Result<Vec<Assignment>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments
             WHERE status != 'completed' ORDER BY start_time ASC"
        ))?;
        let assignments = stmt
            .query_map([], row_to_assignment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assignments)
    }

    /// Discard every non-completed assignment record.
    pub fn delete_non_completed_assignments(&self) -> Result<usize, rusqlite::Error> {
        self.conn
            .execute("DELETE FROM assignments WHERE status != 'completed'", [])
    }

    pub fn set_assignment_status(
        &self,
        id: &str,
        status: AssignmentStatus,
    ) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "UPDATE assignments SET status = ?2 WHERE id = ?1",
            params![id, format_assignment_status(status)],
        )?;
        Ok(())
    }

    pub fn set_remote_event_id(
        &self,
        id: &str,
        remote_event_id: Option<&str>,
    ) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "UPDATE assignments SET remote_event_id = ?2 WHERE id = ?1",
            params![id, remote_event_id],
        )?;
        Ok(())
    }
}
