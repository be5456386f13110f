//! Work item management commands for CLI.

use clap::Subcommand;
use timeboxer_core::storage::PlanDb;
use timeboxer_core::task::{WorkItem, WorkItemStatus};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new work item
    Add {
        /// Item name
        name: String,
        /// Hour budget to schedule
        #[arg(long)]
        hours: f64,
        /// Priority, 1 = highest (default: appended after existing items)
        #[arg(long)]
        priority: Option<u32>,
    },
    /// List work items
    List {
        /// Include completed items
        #[arg(long)]
        all: bool,
    },
    /// Update a work item
    Update {
        /// Item ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New hour budget
        #[arg(long)]
        hours: Option<f64>,
        /// New priority
        #[arg(long)]
        priority: Option<u32>,
    },
    /// Mark a work item completed
    Done {
        /// Item ID
        id: String,
    },
    /// Rewrite priorities from an ordered id list
    Reorder {
        /// Comma-separated item ids, highest priority first
        ids: String,
    },
    /// Delete a work item and its assignments
    Delete {
        /// Item ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = PlanDb::open()?;

    match action {
        TaskAction::Add { name, hours, priority } => {
            let priority = match priority {
                Some(p) => p,
                None => db.list_work_items()?.len() as u32 + 1,
            };
            let item = WorkItem::new(&name, hours, priority)?;
            db.create_work_item(&item)?;
            println!("Work item created: {}", item.id);
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        TaskAction::List { all } => {
            let items: Vec<_> = db
                .list_work_items()?
                .into_iter()
                .filter(|i| all || i.status != WorkItemStatus::Completed)
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        TaskAction::Update { id, name, hours, priority } => {
            let mut item = db
                .get_work_item(&id)?
                .ok_or(format!("Work item not found: {id}"))?;

            if let Some(n) = name {
                item.name = n;
            }
            if let Some(h) = hours {
                timeboxer_core::task::validate_hours(&item.name, h)?;
                item.estimated_hours = h;
            }
            if let Some(p) = priority {
                item.priority = p;
            }

            db.update_work_item(&item)?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        TaskAction::Done { id } => {
            db.set_work_item_status(&id, WorkItemStatus::Completed)?;
            println!("Work item completed: {id}");
        }
        TaskAction::Reorder { ids } => {
            let ordered: Vec<String> = ids.split(',').map(|s| s.trim().to_string()).collect();
            db.reorder_work_items(&ordered)?;
            println!("{}", serde_json::to_string_pretty(&db.list_work_items()?)?);
        }
        TaskAction::Delete { id } => {
            db.delete_work_item(&id)?;
            println!("Work item deleted: {id}");
        }
    }
    Ok(())
}
