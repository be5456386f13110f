//! TOML-based planner configuration.
//!
//! Stores the knobs the engine itself takes as arguments:
//! - The timezone offset rule clock times are interpreted in
//! - The recalculation debounce interval
//! - Which provider calendar to reconcile against
//!
//! Stored at `~/.config/timeboxer/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;

/// Planner configuration.
///
/// Serialized to/from TOML at `~/.config/timeboxer/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannerConfig {
    /// Offset in minutes east of UTC used to interpret rule clock
    /// times. 0 means rules are in UTC.
    #[serde(default)]
    pub timezone_offset_minutes: i32,
    /// Minimum gap between full recalculations, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub recalc_debounce_ms: i64,
    /// Provider calendar to fetch busy intervals from and mirror
    /// assignments into.
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
}

fn default_debounce_ms() -> i64 {
    1000
}
fn default_calendar_id() -> String {
    "primary".to_string()
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            timezone_offset_minutes: 0,
            recalc_debounce_ms: default_debounce_ms(),
            calendar_id: default_calendar_id(),
        }
    }
}

impl PlannerConfig {
    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// The configured offset as a chrono FixedOffset.
    ///
    /// Falls back to UTC if the stored offset is out of range.
    pub fn timezone(&self) -> chrono::FixedOffset {
        chrono::FixedOffset::east_opt(self.timezone_offset_minutes * 60)
            .unwrap_or_else(|| chrono::FixedOffset::east_opt(0).unwrap())
    }
}
