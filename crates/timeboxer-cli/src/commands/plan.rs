//! Plan building and calendar reconciliation commands for CLI.

use clap::Subcommand;
use timeboxer_core::conflict::BusyInterval;
use timeboxer_core::engine::build_plan;
use timeboxer_core::storage::{PlanDb, PlannerConfig};
use timeboxer_core::sync::{GoogleCalendarGateway, Recalculator};
use timeboxer_core::task::WorkItemStatus;

#[derive(Subcommand)]
pub enum PlanAction {
    /// Rebuild the plan locally, without touching the calendar provider
    Build {
        /// JSON file with busy intervals ([{"start": ..., "end": ...}])
        #[arg(long)]
        busy_file: Option<std::path::PathBuf>,
    },
    /// Show committed assignments
    Show,
    /// Discard all non-completed assignments
    Clear,
    /// Full reconciliation against the calendar provider
    ///
    /// Reads the access token from GOOGLE_ACCESS_TOKEN.
    Sync,
    /// Detect and repair assignments invalidated by new busy intervals
    Repair,
}

pub fn run(action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = PlanDb::open()?;
    let config = PlannerConfig::load_or_default();

    match action {
        PlanAction::Build { busy_file } => {
            let busy: Vec<BusyInterval> = match busy_file {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
                None => Vec::new(),
            };

            let items = db.list_work_items()?;
            let rules = db.list_rules()?;
            let plan = build_plan(&items, &rules, &busy, chrono::Utc::now(), config.timezone());

            db.delete_non_completed_assignments()?;
            db.insert_assignments(&plan.assignments)?;
            for item in items.iter().filter(|i| i.status != WorkItemStatus::Completed) {
                let scheduled = plan.assignments.iter().any(|a| a.work_item_id == item.id);
                let status = if scheduled {
                    WorkItemStatus::Scheduled
                } else {
                    WorkItemStatus::Pending
                };
                if status != item.status {
                    db.set_work_item_status(&item.id, status)?;
                }
            }

            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        PlanAction::Show => {
            println!("{}", serde_json::to_string_pretty(&db.list_assignments()?)?);
        }
        PlanAction::Clear => {
            let removed = db.delete_non_completed_assignments()?;
            println!("Assignments discarded: {removed}");
        }
        PlanAction::Sync => {
            let report = tokio::runtime::Runtime::new()?
                .block_on(recalculator(db, &config)?.recalculate(chrono::Utc::now()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        PlanAction::Repair => {
            let report = tokio::runtime::Runtime::new()?
                .block_on(recalculator(db, &config)?.repair(chrono::Utc::now()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn recalculator(
    db: PlanDb,
    config: &PlannerConfig,
) -> Result<Recalculator<GoogleCalendarGateway>, Box<dyn std::error::Error>> {
    let token = std::env::var("GOOGLE_ACCESS_TOKEN")
        .map_err(|_| "GOOGLE_ACCESS_TOKEN is not set")?;
    let gateway = GoogleCalendarGateway::new(&token, &config.calendar_id);
    Ok(Recalculator::new(db, gateway, config))
}
