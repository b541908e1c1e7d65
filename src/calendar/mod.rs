//! Rule-driven perpetual calendars.
//!
//! A [`Calendar`] owns a [`CalendarSystem`] (weekday names, month templates,
//! intercalary rules) and one primary [`MudDate`], the calendar's "now".
//! Advancing the primary date notifies subscribers of the day, month and
//! year boundaries it crossed.

pub mod cache;
pub mod date;
pub mod definition;
pub mod display;
pub mod error;
pub mod month;
pub mod registry;
pub mod rule;
pub mod system;
pub mod year;

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};

pub use date::{compare_optional, DateChange, MudDate};
pub use definition::{CalendarDefinition, Epoch};
pub use display::DisplayMode;
pub use error::CalendarError;
pub use month::{DayName, IntercalaryDay, IntercalaryMonth, Month, MonthDefinition};
pub use registry::CalendarRegistry;
pub use rule::IntercalaryRule;
pub use system::CalendarSystem;
pub use year::Year;

use crate::config::EngineConfig;

/// Boundary crossed by the primary date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CalendarEvent {
    DaysUpdated,
    MonthsUpdated,
    YearsUpdated,
}

impl CalendarEvent {
    /// Events implied by a change report, smallest unit first.
    pub fn from_change(change: DateChange) -> Vec<CalendarEvent> {
        let mut events = Vec::new();
        if change.days {
            events.push(CalendarEvent::DaysUpdated);
        }
        if change.months {
            events.push(CalendarEvent::MonthsUpdated);
        }
        if change.years {
            events.push(CalendarEvent::YearsUpdated);
        }
        events
    }
}

/// Callback invoked with each event and the primary date after the move.
pub type DateListener = Box<dyn FnMut(CalendarEvent, &MudDate) + Send>;

/// A named calendar with its primary date.
pub struct Calendar {
    system: Arc<CalendarSystem>,
    config: EngineConfig,
    current: MudDate,
    changed: bool,
    listeners: Vec<DateListener>,
}

impl Calendar {
    pub fn from_definition(definition: CalendarDefinition, config: &EngineConfig) -> Result<Self, CalendarError> {
        let current_text = definition.current_date.clone();
        let system = Arc::new(CalendarSystem::new(definition, config)?);
        let current = system.parse_date(&current_text)?.into_primary();
        info!(calendar = %system.name(), id = system.id(), current = %current, "loaded calendar");
        Ok(Self {
            system,
            config: config.clone(),
            current,
            changed: false,
            listeners: Vec::new(),
        })
    }

    pub fn from_json(json: &str, config: &EngineConfig) -> Result<Self, CalendarError> {
        Self::from_definition(CalendarDefinition::from_json(json)?, config)
    }

    /// Snapshot of the definition, with the current date filled in.
    pub fn to_definition(&self) -> CalendarDefinition {
        let mut definition = self.system.definition().clone();
        definition.current_date = self.current.date_string();
        definition
    }

    pub fn id(&self) -> u64 {
        self.system.id()
    }

    pub fn name(&self) -> &str {
        self.system.name()
    }

    pub fn system(&self) -> &Arc<CalendarSystem> {
        &self.system
    }

    pub fn weekdays(&self) -> &[String] {
        self.system.weekdays()
    }

    pub fn month_definitions(&self) -> &[MonthDefinition] {
        self.system.month_definitions()
    }

    pub fn intercalary_months(&self) -> &[IntercalaryMonth] {
        self.system.intercalary_months()
    }

    /// Whether anything changed since the last save.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn mark_saved(&mut self) {
        self.changed = false;
    }

    // -------------------------------------------------------------------------
    // Year accounting
    // -------------------------------------------------------------------------

    pub fn create_year(&self, year: i64) -> Arc<Year> {
        self.system.create_year(year)
    }

    pub fn count_days_in_year(&self, year: i64) -> u32 {
        self.system.count_days_in_year(year)
    }

    pub fn count_weekdays_in_year(&self, year: i64) -> u32 {
        self.system.count_weekdays_in_year(year)
    }

    pub fn count_days_between_years(&self, from: i64, to: i64) -> i64 {
        self.system.count_days_between_years(from, to)
    }

    pub fn first_weekday(&self, year: i64) -> usize {
        self.system.first_weekday(year)
    }

    // -------------------------------------------------------------------------
    // Dates
    // -------------------------------------------------------------------------

    /// The primary date.
    pub fn current_date(&self) -> &MudDate {
        &self.current
    }

    /// Parse a compact date string.
    pub fn get_date(&self, text: &str) -> Result<MudDate, CalendarError> {
        self.system.parse_date(text)
    }

    /// Like [`get_date`](Self::get_date), with the failure reduced to a
    /// message for callers that only report it.
    pub fn try_get_date(&self, text: &str) -> Result<MudDate, String> {
        self.system.parse_date(text).map_err(|e| {
            debug!(calendar = %self.name(), input = text, error = %e, "date lookup failed");
            e.to_string()
        })
    }

    pub fn get_date_in_year(&self, day: i64, alias: &str, year: i64) -> Result<MudDate, CalendarError> {
        MudDate::in_year(Arc::clone(&self.system), day, alias, year)
    }

    /// Birthday of someone exactly `age` years old today: the same day of
    /// the year, `age` years ago.
    pub fn birthday(&self, age: i64) -> Result<MudDate, CalendarError> {
        let mut date = self.current.copy();
        date.advance_years(-age, false)?;
        Ok(date)
    }

    /// A uniformly random birthday for someone who is `age` years old today.
    pub fn random_birthday<R: Rng + ?Sized>(&self, age: i64, rng: &mut R) -> Result<MudDate, CalendarError> {
        let latest = self.birthday(age)?;
        let mut earliest = self.current.copy();
        earliest.advance_years(-(age + 1), false)?;
        earliest.advance_days(1);
        let span = latest.days_since(&earliest).max(0);
        earliest.advance_days(rng.gen_range(0..=span));
        Ok(earliest)
    }

    pub fn display_date(&self, mode: &DisplayMode) -> String {
        display::render(&self.current, mode)
    }

    // -------------------------------------------------------------------------
    // Primary date mutation
    // -------------------------------------------------------------------------

    /// Register a listener for primary date changes.
    pub fn subscribe(&mut self, listener: DateListener) {
        self.listeners.push(listener);
    }

    /// Replace the primary date with the parsed compact string.
    pub fn set_date(&mut self, text: &str) -> Result<DateChange, CalendarError> {
        let date = self.system.parse_date(text)?;
        Ok(self.replace_current(date))
    }

    pub fn advance_days(&mut self, n: i64) -> DateChange {
        let change = self.current.advance_days(n);
        self.after_mutation(change);
        change
    }

    pub fn advance_months(&mut self, n: i64, ignore_intercalaries: bool, preserve_day: bool) -> DateChange {
        let change = self.current.advance_months(n, ignore_intercalaries, preserve_day);
        self.after_mutation(change);
        change
    }

    pub fn advance_years(&mut self, n: i64, normalise_days: bool) -> Result<DateChange, CalendarError> {
        let change = self.current.advance_years(n, normalise_days)?;
        self.after_mutation(change);
        Ok(change)
    }

    /// Apply `edit` to a copy of the definition and rebuild the calendar
    /// from it. Generated years are discarded; the primary date keeps its
    /// day, month alias and year where the new rules allow, and otherwise
    /// keeps its day of the year.
    pub fn edit_definition<F>(&mut self, edit: F) -> Result<(), CalendarError>
    where
        F: FnOnce(&mut CalendarDefinition),
    {
        let mut definition = self.to_definition();
        edit(&mut definition);
        let system = Arc::new(CalendarSystem::new(definition, &self.config)?);

        let old = &self.current;
        let rebound = match MudDate::in_year(Arc::clone(&system), old.day() as i64, old.month().alias(), old.year()) {
            Ok(date) => date,
            Err(_) => {
                let mut date = MudDate::start_of_year(Arc::clone(&system), old.year());
                let last = system.count_days_in_year(old.year());
                date.advance_days(old.day_of_year().min(last) as i64 - 1);
                date
            }
        };

        info!(calendar = %system.name(), "calendar definition edited");
        self.system = system;
        self.replace_current(rebound);
        self.changed = true;
        Ok(())
    }

    fn replace_current(&mut self, date: MudDate) -> DateChange {
        let before = std::mem::replace(&mut self.current, date.into_primary());
        let change = DateChange {
            days: before.date_string() != self.current.date_string(),
            months: (before.year(), before.month().alias()) != (self.current.year(), self.current.month().alias()),
            years: before.year() != self.current.year(),
        };
        self.after_mutation(change);
        change
    }

    fn after_mutation(&mut self, change: DateChange) {
        if change.is_empty() {
            return;
        }
        self.changed = true;
        debug!(calendar = %self.name(), date = %self.current, ?change, "primary date moved");
        for event in CalendarEvent::from_change(change) {
            for listener in &mut self.listeners {
                listener(event, &self.current);
            }
        }
    }
}

impl fmt::Debug for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Calendar")
            .field("system", &self.system)
            .field("current", &self.current)
            .field("changed", &self.changed)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::definition::tests::fixture;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Mutex;

    fn calendar() -> Calendar {
        Calendar::from_definition(fixture(), &EngineConfig::default()).unwrap()
    }

    fn recorder(calendar: &mut Calendar) -> Arc<Mutex<Vec<CalendarEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        calendar.subscribe(Box::new(move |event: CalendarEvent, _date: &MudDate| {
            sink.lock().unwrap().push(event);
        }));
        events
    }

    #[test]
    fn test_loads_current_date_as_primary() {
        let cal = calendar();
        assert!(cal.current_date().is_primary());
        assert_eq!(cal.current_date().date_string(), "1-jan-1");
        assert!(!cal.is_changed());
    }

    #[test]
    fn test_notifications_forward() {
        let mut cal = calendar();
        let events = recorder(&mut cal);

        cal.advance_days(3);
        assert_eq!(*events.lock().unwrap(), vec![CalendarEvent::DaysUpdated]);
        assert!(cal.is_changed());

        events.lock().unwrap().clear();
        cal.set_date("30-dec-1").unwrap();
        events.lock().unwrap().clear();
        cal.advance_days(1);
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                CalendarEvent::DaysUpdated,
                CalendarEvent::MonthsUpdated,
                CalendarEvent::YearsUpdated
            ]
        );
    }

    #[test]
    fn test_notifications_backward() {
        let mut cal = calendar();
        cal.set_date("1-feb-3").unwrap();
        let events = recorder(&mut cal);
        cal.advance_days(-1);
        assert_eq!(cal.current_date().date_string(), "30-jan-3");
        assert_eq!(
            *events.lock().unwrap(),
            vec![CalendarEvent::DaysUpdated, CalendarEvent::MonthsUpdated]
        );
    }

    #[test]
    fn test_no_notification_for_no_op() {
        let mut cal = calendar();
        let events = recorder(&mut cal);
        cal.advance_days(0);
        cal.advance_months(0, false, false);
        cal.advance_years(0, false).unwrap();
        assert!(events.lock().unwrap().is_empty());
        assert!(!cal.is_changed());
    }

    #[test]
    fn test_copies_do_not_notify() {
        let mut cal = calendar();
        let events = recorder(&mut cal);
        let mut copy = cal.current_date().copy();
        copy.advance_days(400);
        assert!(events.lock().unwrap().is_empty());
        assert_eq!(cal.current_date().date_string(), "1-jan-1");
    }

    #[test]
    fn test_get_and_try_get_date() {
        let cal = calendar();
        assert!(cal.get_date("1-mar-2012").is_ok());
        assert!(matches!(
            cal.get_date("1-xyz-2012"),
            Err(CalendarError::UnknownMonth { .. })
        ));
        let message = cal.try_get_date("not a date").unwrap_err();
        assert!(message.contains("not a date"), "{message}");
        assert!(cal.try_get_date("2-feb-3").is_ok());
        let d = cal.get_date_in_year(5, "Jun", 40).unwrap();
        assert_eq!(d.date_string(), "5-jun-40");
    }

    #[test]
    fn test_display_short_round_trips() {
        let mut cal = calendar();
        cal.set_date("12-oct--40").unwrap();
        let text = cal.display_date(&DisplayMode::Short);
        assert_eq!(cal.get_date(&text).unwrap(), *cal.current_date());
    }

    #[test]
    fn test_birthday() {
        let mut cal = calendar();
        cal.set_date("15-may-300").unwrap();
        let birthday = cal.birthday(20).unwrap();
        assert_eq!(birthday.date_string(), "15-may-280");
        assert_eq!(cal.current_date().years_since(&birthday), 20);
    }

    #[test]
    fn test_random_birthday_gives_requested_age() {
        let mut cal = calendar();
        cal.set_date("15-may-300").unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for age in [0, 1, 17, 90] {
            for _ in 0..50 {
                let birthday = cal.random_birthday(age, &mut rng).unwrap();
                assert!(birthday <= *cal.current_date());
                assert_eq!(cal.current_date().years_since(&birthday), age, "{birthday}");
            }
        }
    }

    #[test]
    fn test_edit_definition_invalidates_years() {
        let mut cal = calendar();
        cal.set_date("10-feb-8").unwrap();
        cal.mark_saved();
        assert_eq!(cal.count_days_in_year(8), 365);

        cal.edit_definition(|def| {
            def.months[11].intercalary_days.clear();
            def.months[1].normal_days = 28;
        })
        .unwrap();

        assert!(cal.is_changed());
        assert_eq!(cal.count_days_in_year(8), 358);
        assert_eq!(cal.current_date().date_string(), "10-feb-8");
        assert!(cal.current_date().is_primary());
    }

    #[test]
    fn test_edit_definition_rebinds_removed_month() {
        let mut cal = calendar();
        cal.set_date("10-feb-8").unwrap();
        cal.edit_definition(|def| {
            def.months.retain(|m| m.alias != "feb");
        })
        .unwrap();
        // Day 40 of the year now falls in March
        assert_eq!(cal.current_date().date_string(), "10-mar-8");
    }

    #[test]
    fn test_edit_definition_rejects_invalid() {
        let mut cal = calendar();
        let err = cal
            .edit_definition(|def| def.weekdays.clear())
            .unwrap_err();
        assert!(matches!(err, CalendarError::NoWeekdays { .. }));
        assert_eq!(cal.weekdays().len(), 7);
    }

    #[test]
    fn test_to_definition_carries_current_date() {
        let mut cal = calendar();
        cal.advance_days(45);
        assert_eq!(cal.to_definition().current_date, "16-feb-1");
    }
}
