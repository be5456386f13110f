//! Availability rule management commands for CLI.

use clap::Subcommand;
use timeboxer_core::availability::AvailabilityRule;
use timeboxer_core::storage::PlanDb;

#[derive(Subcommand)]
pub enum RuleAction {
    /// Create a new availability rule
    Add {
        /// Rule name
        name: String,
        /// Comma-separated weekdays, 0 = Sunday .. 6 = Saturday
        #[arg(long)]
        days: String,
        /// Window start, HH:MM
        #[arg(long)]
        start: String,
        /// Window end, HH:MM
        #[arg(long)]
        end: String,
        /// Minimum slot duration in minutes
        #[arg(long)]
        min_minutes: Option<i64>,
    },
    /// List availability rules
    List,
    /// Activate a rule
    Enable {
        /// Rule ID
        id: String,
    },
    /// Deactivate a rule without deleting it
    Disable {
        /// Rule ID
        id: String,
    },
    /// Delete a rule
    Delete {
        /// Rule ID
        id: String,
    },
}

pub fn run(action: RuleAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = PlanDb::open()?;

    match action {
        RuleAction::Add { name, days, start, end, min_minutes } => {
            let weekdays = days
                .split(',')
                .map(|s| s.trim().parse::<u8>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| format!("Invalid weekday list: {days}"))?;

            let mut rule = AvailabilityRule::new(&name, weekdays, &start, &end)?;
            rule.min_duration_minutes = min_minutes;
            db.create_rule(&rule)?;
            println!("Rule created: {}", rule.id);
            println!("{}", serde_json::to_string_pretty(&rule)?);
        }
        RuleAction::List => {
            println!("{}", serde_json::to_string_pretty(&db.list_rules()?)?);
        }
        RuleAction::Enable { id } => {
            db.set_rule_active(&id, true)?;
            println!("Rule enabled: {id}");
        }
        RuleAction::Disable { id } => {
            db.set_rule_active(&id, false)?;
            println!("Rule disabled: {id}");
        }
        RuleAction::Delete { id } => {
            db.delete_rule(&id)?;
            println!("Rule deleted: {id}");
        }
    }
    Ok(())
}
