//! Calendar registry.
//!
//! Holds every calendar of a world keyed by id. Default calendars are
//! embedded in the binary via `include_str!`; a data directory can add new
//! calendars or override embedded ones by id.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use super::date::MudDate;
use super::error::CalendarError;
use super::Calendar;
use crate::config::EngineConfig;
use crate::persistence;

// Embedded default calendar definitions
const DEFAULT_CALENDARS: &[(&str, &str)] = &[
    ("common.json", include_str!("../../data/defaults/calendars/common.json")),
    ("reckoning.json", include_str!("../../data/defaults/calendars/reckoning.json")),
];

/// Every calendar known to the world, keyed by id.
#[derive(Debug, Default)]
pub struct CalendarRegistry {
    calendars: BTreeMap<u64, Calendar>,
}

impl CalendarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the embedded default calendars.
    pub fn defaults(config: &EngineConfig) -> Result<Self, CalendarError> {
        let mut registry = Self::new();
        for (file, json) in DEFAULT_CALENDARS {
            let definition = persistence::parse_definition(json).map_err(|e| {
                CalendarError::Definition(format!("embedded {}: {}", file, e))
            })?;
            registry.insert(Calendar::from_definition(definition, config)?);
        }
        Ok(registry)
    }

    /// Load the embedded defaults, then every `*.json` file in `dir`.
    ///
    /// A file whose calendar id matches an embedded calendar replaces it.
    /// Files that fail to load are skipped with a warning.
    pub fn load_from(dir: &Path, config: &EngineConfig) -> Result<Self, CalendarError> {
        let mut registry = Self::defaults(config)?;
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "calendar directory not readable");
                return Ok(registry);
            }
        };

        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            match persistence::load_calendar(&path, config) {
                Ok(calendar) => {
                    info!(path = %path.display(), id = calendar.id(), "loaded calendar override");
                    registry.insert(calendar);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "failed to load calendar"),
            }
        }
        Ok(registry)
    }

    /// Add a calendar, returning the one it replaced.
    pub fn insert(&mut self, calendar: Calendar) -> Option<Calendar> {
        self.calendars.insert(calendar.id(), calendar)
    }

    pub fn remove(&mut self, id: u64) -> Option<Calendar> {
        self.calendars.remove(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Calendar> {
        self.calendars.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Calendar> {
        self.calendars.get_mut(&id)
    }

    /// Look a calendar up by name, case-insensitive.
    pub fn by_name(&self, name: &str) -> Option<&Calendar> {
        self.calendars
            .values()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut Calendar> {
        self.calendars
            .values_mut()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Calendar> {
        self.calendars.values()
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    /// Parse `<calendarId>_<day>/<alias>/<year>`.
    pub fn parse_roundtrip(&self, text: &str) -> Result<MudDate, CalendarError> {
        let invalid = |reason: &str| CalendarError::InvalidDate {
            input: text.to_string(),
            reason: reason.to_string(),
        };
        let (id, rest) = text
            .trim()
            .split_once('_')
            .ok_or_else(|| invalid("expected <calendar>_<day>/<month>/<year>"))?;
        let id: u64 = id.parse().map_err(|_| invalid("calendar id is not a number"))?;
        let calendar = self.get(id).ok_or(CalendarError::UnknownCalendar { id })?;

        let parts: Vec<&str> = rest.splitn(3, '/').collect();
        if parts.len() != 3 {
            return Err(invalid("expected <calendar>_<day>/<month>/<year>"));
        }
        calendar.get_date(&parts.join("-"))
    }

    /// Days from `b` to `a` (positive if `a` is later).
    ///
    /// Dates of the same calendar are compared directly. Dates of different
    /// calendars are each measured against their own calendar's current date
    /// and the two offsets subtracted, which is only meaningful when both
    /// calendars' current dates track the same moment.
    pub fn days_between(&self, a: &MudDate, b: &MudDate) -> Result<i64, CalendarError> {
        if a.calendar_id() == b.calendar_id() {
            return Ok(a.days_since(b));
        }
        let anchor = |date: &MudDate| -> Result<i64, CalendarError> {
            let calendar = self
                .get(date.calendar_id())
                .ok_or(CalendarError::UnknownCalendar {
                    id: date.calendar_id(),
                })?;
            Ok(date.day_number() - calendar.current_date().day_number())
        };
        Ok(anchor(a)? - anchor(b)?)
    }

    /// Whole years from `b` to `a`, for dates of the same calendar; for
    /// different calendars the day difference divided by the length of the
    /// later date's year.
    pub fn years_between(&self, a: &MudDate, b: &MudDate) -> Result<i64, CalendarError> {
        if a.calendar_id() == b.calendar_id() {
            return Ok(a.years_since(b));
        }
        let days = self.days_between(a, b)?;
        let year_length = a.this_year().days().max(1) as i64;
        Ok(days / year_length)
    }
}
