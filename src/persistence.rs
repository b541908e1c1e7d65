//! Calendar save files.
//!
//! A save file wraps the calendar definition (including its current date)
//! with a format version and a timestamp. Bare definitions, such as the
//! embedded defaults, are accepted on load as well.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calendar::{Calendar, CalendarDefinition, CalendarError};
use crate::config::EngineConfig;

/// Metadata wrapper for the save file format.
#[derive(Serialize, Deserialize)]
struct CalendarSaveFile {
    /// Format version for forward compatibility
    version: u32,
    /// RFC 3339 time the file was written
    #[serde(default)]
    saved_at: String,
    calendar: CalendarDefinition,
}

const SAVE_VERSION: u32 = 1;

/// Save a calendar to a JSON file and clear its changed flag.
pub fn save_calendar(calendar: &mut Calendar, path: &Path) -> Result<(), CalendarError> {
    let save = CalendarSaveFile {
        version: SAVE_VERSION,
        saved_at: chrono::Utc::now().to_rfc3339(),
        calendar: calendar.to_definition(),
    };
    let json = serde_json::to_string_pretty(&save)?;
    fs::write(path, json)?;
    calendar.mark_saved();
    info!(path = %path.display(), calendar = %calendar.name(), "saved calendar");
    Ok(())
}

/// Load a calendar from a save file or a bare definition file.
pub fn load_calendar(path: &Path, config: &EngineConfig) -> Result<Calendar, CalendarError> {
    let contents = fs::read_to_string(path)?;
    let definition = parse_definition(&contents)?;
    Calendar::from_definition(definition, config)
}

/// Parse either a save file or a bare definition, and validate it.
pub fn parse_definition(json: &str) -> Result<CalendarDefinition, CalendarError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let definition = if value.get("calendar").is_some() {
        let save: CalendarSaveFile = serde_json::from_value(value)?;
        if save.version > SAVE_VERSION {
            return Err(CalendarError::UnsupportedVersion {
                found: save.version,
                supported: SAVE_VERSION,
            });
        }
        save.calendar
    } else {
        serde_json::from_value(value)?
    };
    definition.validate()?;
    Ok(definition)
}
