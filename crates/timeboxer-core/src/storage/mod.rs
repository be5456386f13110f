mod config;
pub mod migrations;
pub mod plan_db;

pub use config::PlannerConfig;
pub use plan_db::PlanDb;

use std::path::PathBuf;

/// Returns `~/.config/timeboxer[-dev]/` based on TIMEBOXER_ENV.
///
/// Set TIMEBOXER_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TIMEBOXER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("timeboxer-dev")
    } else {
        base_dir.join("timeboxer")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
