//! Dates: cursors into the infinite sequence of generated years.
//!
//! A [`MudDate`] walks month by month (by true order) when it moves, asking
//! its [`CalendarSystem`] for the neighbouring year whenever it runs off
//! either end of the current one. Weekday fields are re-derived after every
//! mutation.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::error::CalendarError;
use super::month::{Month, INTERCALARY_NOMINAL_ORDER};
use super::system::CalendarSystem;
use super::year::Year;

/// Which boundaries a mutation crossed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DateChange {
    pub days: bool,
    pub months: bool,
    pub years: bool,
}

impl DateChange {
    pub fn is_empty(&self) -> bool {
        !(self.days || self.months || self.years)
    }

    fn between(before: Position, after: Position) -> Self {
        Self {
            days: before != after,
            months: (before.year, before.true_order) != (after.year, after.true_order),
            years: before.year != after.year,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Position {
    year: i64,
    true_order: u32,
    day: u32,
}

/// A day within a month within a year of one calendar.
///
/// Invariant: `1 <= day <= month.days()`.
///
/// Clones are never primary; only the date owned by a
/// [`Calendar`](super::Calendar) carries the primary flag.
pub struct MudDate {
    system: Arc<CalendarSystem>,
    this_year: Arc<Year>,
    month: Month,
    day: u32,
    weekday_index: Option<usize>,
    primary: bool,
}

impl MudDate {
    /// Date for `day` of the month `alias` in `year`.
    pub fn in_year(
        system: Arc<CalendarSystem>,
        day: i64,
        alias: &str,
        year: i64,
    ) -> Result<Self, CalendarError> {
        let this_year = system.create_year(year);
        let index = this_year
            .index_of_alias(alias)
            .ok_or_else(|| CalendarError::UnknownMonth {
                alias: alias.to_string(),
                year,
            })?;
        let month = &this_year.months()[index];
        if day < 1 || day > month.days() as i64 {
            return Err(CalendarError::DayOutOfRange {
                day,
                alias: month.alias().to_string(),
                year,
                max: month.days(),
            });
        }
        Ok(Self::at(system, this_year, index, day as u32))
    }

    /// First day of `year`.
    pub fn start_of_year(system: Arc<CalendarSystem>, year: i64) -> Self {
        let this_year = system.create_year(year);
        Self::at(system, this_year, 0, 1)
    }

    fn at(system: Arc<CalendarSystem>, this_year: Arc<Year>, index: usize, day: u32) -> Self {
        let month = this_year.months()[index].clone();
        let mut date = Self {
            system,
            this_year,
            month,
            day,
            weekday_index: None,
            primary: false,
        };
        date.refresh_weekday();
        date
    }

    /// Non-primary copy of this date.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub(crate) fn into_primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn system(&self) -> &Arc<CalendarSystem> {
        &self.system
    }

    pub fn calendar_id(&self) -> u64 {
        self.system.id()
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn year(&self) -> i64 {
        self.this_year.number()
    }

    pub fn month(&self) -> &Month {
        &self.month
    }

    pub fn this_year(&self) -> &Arc<Year> {
        &self.this_year
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Weekday name, empty for a non-weekday.
    pub fn weekday(&self) -> &str {
        self.weekday_index
            .map(|i| self.system.weekdays()[i].as_str())
            .unwrap_or("")
    }

    /// Position in the weekday cycle, `None` for a non-weekday.
    pub fn weekday_index(&self) -> Option<usize> {
        self.weekday_index
    }

    pub fn is_weekday(&self) -> bool {
        self.weekday_index.is_some()
    }

    /// Special name of this day, if it has one this year.
    pub fn special_day(&self) -> Option<&super::month::DayName> {
        self.month.day_name(self.day)
    }

    /// 1-based day of the year.
    pub fn day_of_year(&self) -> u32 {
        self.this_year.day_of_year(self.month_index(), self.day)
    }

    /// Days since the first day of the calendar's epoch year.
    pub fn day_number(&self) -> i64 {
        let epoch = self.system.epoch().year;
        self.system.count_days_between_years(epoch, self.year()) + self.day_of_year() as i64 - 1
    }

    /// Number of days from `other` to `self` (positive if self is later).
    ///
    /// Both dates must belong to the same calendar; see
    /// [`CalendarRegistry::days_between`](super::registry::CalendarRegistry::days_between)
    /// for dates of different calendars.
    pub fn days_since(&self, other: &MudDate) -> i64 {
        let between = self.system.count_days_between_years(other.year(), self.year());
        between + self.day_of_year() as i64 - other.day_of_year() as i64
    }

    /// Whole years from `other` to `self` (positive if self is later).
    ///
    /// A year only counts once `other`'s anniversary (the same month and
    /// day, as [`advance_years`](Self::advance_years) finds it) has been
    /// reached.
    pub fn years_since(&self, other: &MudDate) -> i64 {
        if self < other {
            return -other.years_since(self);
        }
        let mut years = self.year() - other.year();
        let mut anniversary = other.copy();
        let reached = match anniversary.advance_years(years, false) {
            Ok(_) => anniversary <= *self,
            Err(_) => self.day_of_year() >= other.day_of_year(),
        };
        if !reached {
            years -= 1;
        }
        years
    }

    /// Compact form: `<day>-<alias>-<year>`.
    pub fn date_string(&self) -> String {
        format!("{}-{}-{}", self.day, self.month.alias(), self.year())
    }

    /// Calendar-qualified form: `<calendarId>_<day>/<alias>/<year>`.
    pub fn roundtrip_string(&self) -> String {
        format!(
            "{}_{}/{}/{}",
            self.calendar_id(),
            self.day,
            self.month.alias(),
            self.year()
        )
    }

    /// Move by `n` days (backwards when negative).
    pub fn advance_days(&mut self, n: i64) -> DateChange {
        if n == 0 {
            return DateChange::default();
        }
        let before = self.position();
        let mut year = Arc::clone(&self.this_year);
        let mut index = self.month_index();
        let mut day = self.day as i64;
        let mut remaining = n;

        if remaining > 0 {
            loop {
                if index == 0 && day == 1 && remaining >= year.days() as i64 {
                    remaining -= year.days() as i64;
                    year = self.system.create_year(year.number() + 1);
                    continue;
                }
                let days = year.months()[index].days() as i64;
                if day + remaining <= days {
                    day += remaining;
                    break;
                }
                remaining -= days - day + 1;
                (year, index) = self.next_month(&year, index);
                day = 1;
            }
        } else {
            loop {
                let last = year.month_count() - 1;
                if index == last
                    && day == year.last_month().days() as i64
                    && -remaining >= year.days() as i64
                {
                    remaining += year.days() as i64;
                    year = self.system.create_year(year.number() - 1);
                    index = year.month_count() - 1;
                    day = year.last_month().days() as i64;
                    continue;
                }
                if day + remaining >= 1 {
                    day += remaining;
                    break;
                }
                remaining += day;
                (year, index) = self.previous_month(&year, index);
                day = year.months()[index].days() as i64;
            }
        }

        self.move_to(year, index, day as u32);
        DateChange {
            days: true,
            ..DateChange::between(before, self.position())
        }
    }

    /// Move by `n` months (backwards when negative).
    ///
    /// With `ignore_intercalaries`, months spliced in from intercalary month
    /// templates are stepped over without being counted and are never landed
    /// on. The day becomes 1 unless `preserve_day`, in which case it is kept
    /// and clamped to the new month's length.
    pub fn advance_months(&mut self, n: i64, ignore_intercalaries: bool, preserve_day: bool) -> DateChange {
        if n == 0 {
            return DateChange::default();
        }
        let before = self.position();
        let mut year = Arc::clone(&self.this_year);
        let mut index = self.month_index();
        let mut remaining = n.unsigned_abs();

        while remaining > 0 {
            (year, index) = if n > 0 {
                self.next_month(&year, index)
            } else {
                self.previous_month(&year, index)
            };
            if ignore_intercalaries && year.months()[index].is_intercalary() {
                continue;
            }
            remaining -= 1;
        }

        let day = if preserve_day {
            self.day.min(year.months()[index].days())
        } else {
            1
        };
        self.move_to(year, index, day);
        DateChange::between(before, self.position())
    }

    /// Move by `n` years.
    ///
    /// The month with the same alias is kept when the target year has one.
    /// With `normalise_days` the date is instead placed the same number of
    /// days after the start of the target year as it was after the start of
    /// its own. Otherwise a missing alias falls back to the month with the
    /// same true order, or to the last month for a trailing intercalary
    /// month.
    ///
    /// # Errors
    ///
    /// [`CalendarError::NoMatchingMonth`] when none of those apply; the
    /// calendar definition is inconsistent and the date is left unchanged.
    pub fn advance_years(&mut self, n: i64, normalise_days: bool) -> Result<DateChange, CalendarError> {
        if n == 0 {
            return Ok(DateChange::default());
        }
        let before = self.position();
        let target = self.system.create_year(self.year() + n);
        let elapsed = self.day_of_year() - 1;
        let true_order = self.month.true_order();

        let (index, day) = if normalise_days {
            target.locate(elapsed)
        } else if let Some(index) = target.index_of_alias(self.month.alias()) {
            (index, self.day.min(target.months()[index].days()))
        } else if let Some(month) = target.month_by_true_order(true_order) {
            let index = true_order as usize - 1;
            (index, self.day.min(month.days()))
        } else if self.month.nominal_order() == INTERCALARY_NOMINAL_ORDER
            && true_order as usize > target.month_count()
        {
            let index = target.month_count() - 1;
            (index, self.day.min(target.last_month().days()))
        } else {
            return Err(CalendarError::NoMatchingMonth {
                alias: self.month.alias().to_string(),
                true_order,
                year: target.number(),
            });
        };

        self.move_to(target, index, day);
        Ok(DateChange::between(before, self.position()))
    }

    fn next_month(&self, year: &Arc<Year>, index: usize) -> (Arc<Year>, usize) {
        if index + 1 < year.month_count() {
            (Arc::clone(year), index + 1)
        } else {
            (self.system.create_year(year.number() + 1), 0)
        }
    }

    fn previous_month(&self, year: &Arc<Year>, index: usize) -> (Arc<Year>, usize) {
        if index > 0 {
            (Arc::clone(year), index - 1)
        } else {
            let previous = self.system.create_year(year.number() - 1);
            let last = previous.month_count() - 1;
            (previous, last)
        }
    }

    fn move_to(&mut self, year: Arc<Year>, index: usize, day: u32) {
        self.month = year.months()[index].clone();
        self.this_year = year;
        self.day = day;
        self.refresh_weekday();
    }

    fn refresh_weekday(&mut self) {
        self.weekday_index =
            self.this_year
                .weekday_index(self.month_index(), self.day, self.system.weekdays().len());
    }

    fn month_index(&self) -> usize {
        self.month.true_order() as usize - 1
    }

    fn position(&self) -> Position {
        Position {
            year: self.year(),
            true_order: self.month.true_order(),
            day: self.day,
        }
    }
}

/// Order two possibly-missing dates; a missing date sorts after every real
/// date and equal to another missing date.
pub fn compare_optional(a: Option<&MudDate>, b: Option<&MudDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Clone for MudDate {
    fn clone(&self) -> Self {
        Self {
            system: Arc::clone(&self.system),
            this_year: Arc::clone(&self.this_year),
            month: self.month.clone(),
            day: self.day,
            weekday_index: self.weekday_index,
            primary: false,
        }
    }
}

impl PartialEq for MudDate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MudDate {}

impl Ord for MudDate {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year(), self.month.true_order(), self.day, self.calendar_id()).cmp(&(
            other.year(),
            other.month.true_order(),
            other.day,
            other.calendar_id(),
        ))
    }
}

impl PartialOrd for MudDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for MudDate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.calendar_id().hash(state);
        self.year().hash(state);
        self.month.true_order().hash(state);
        self.day.hash(state);
    }
}

impl fmt::Display for MudDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.day, self.month.alias(), self.year())
    }
}

impl fmt::Debug for MudDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MudDate")
            .field("calendar", &self.calendar_id())
            .field("date", &self.date_string())
            .field("weekday", &self.weekday_index)
            .field("primary", &self.primary)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::definition::tests::fixture;
    use crate::config::EngineConfig;

    fn system() -> Arc<CalendarSystem> {
        Arc::new(CalendarSystem::new(fixture(), &EngineConfig::default()).unwrap())
    }

    fn date(sys: &Arc<CalendarSystem>, text: &str) -> MudDate {
        sys.parse_date(text).unwrap()
    }

    #[test]
    fn test_year_end_rollover() {
        let sys = system();
        let mut d = date(&sys, "30-dec-1");
        let change = d.advance_days(1);
        assert_eq!(d.date_string(), "1-jan-2");
        assert!(change.days && change.months && change.years);
    }

    #[test]
    fn test_advance_within_month() {
        let sys = system();
        let mut d = date(&sys, "3-mar-5");
        let change = d.advance_days(10);
        assert_eq!(d.date_string(), "13-mar-5");
        assert_eq!(
            change,
            DateChange {
                days: true,
                months: false,
                years: false
            }
        );
        assert!(d.advance_days(0).is_empty());
    }

    #[test]
    fn test_advance_across_leap_days() {
        let sys = system();
        let mut d = date(&sys, "30-dec-4");
        d.advance_days(1);
        assert_eq!(d.date_string(), "31-dec-4");
        assert!(!d.is_weekday());
        assert_eq!(d.weekday(), "");
        d.advance_days(5);
        assert_eq!(d.date_string(), "1-jan-5");
        d.advance_days(-6);
        assert_eq!(d.date_string(), "30-dec-4");
    }

    #[test]
    fn test_advance_across_intercalary_month() {
        let sys = system();
        let mut d = date(&sys, "30-dec-99");
        d.advance_days(1);
        assert_eq!(d.date_string(), "1-cent-100");
        d.advance_days(10);
        assert_eq!(d.date_string(), "1-jan-100");
        d.advance_days(-11);
        assert_eq!(d.date_string(), "30-dec-99");
    }

    #[test]
    fn test_large_advances_round_trip() {
        let sys = system();
        let start = date(&sys, "17-jun-12");
        for n in [359, 360, 361, 365 * 3, 36_524, 100_000, -1, -360, -36_524, -100_000] {
            let mut d = start.copy();
            d.advance_days(n);
            assert_eq!(d.days_since(&start), n, "advance {n}");
            d.advance_days(-n);
            assert_eq!(d, start, "advance {n}");
        }
    }

    #[test]
    fn test_whole_year_jump_from_year_start() {
        let sys = system();
        let mut d = date(&sys, "1-jan-4");
        d.advance_days(365);
        assert_eq!(d.date_string(), "1-jan-5");
        d.advance_days(-365);
        assert_eq!(d.date_string(), "1-jan-4");

        let mut end = date(&sys, "35-dec-4");
        end.advance_days(-365);
        assert_eq!(end.date_string(), "30-dec-3");
    }

    #[test]
    fn test_monotonicity() {
        let sys = system();
        let d = date(&sys, "5-feb--3");
        for n in [1, 29, 30, 400, 5000] {
            let mut later = d.copy();
            later.advance_days(n);
            assert!(later > d);
            let mut earlier = d.copy();
            earlier.advance_days(-n);
            assert!(earlier < d);
        }
    }

    #[test]
    fn test_weekday_continuity() {
        let sys = system();
        let cycle = sys.weekdays().len();
        let mut d = date(&sys, "1-dec--9");
        let mut previous = d.weekday_index();
        for _ in 0..2000 {
            d.advance_days(1);
            if let Some(index) = d.weekday_index() {
                if let Some(prev) = previous {
                    assert_eq!(index, (prev + 1) % cycle, "at {d}");
                }
                previous = Some(index);
            }
        }
    }

    #[test]
    fn test_epoch_weekday() {
        let sys = system();
        let d = date(&sys, "1-jan-1");
        assert_eq!(d.weekday_index(), Some(0));
        assert_eq!(d.weekday(), "Sun");
        assert_eq!(d.day_number(), 0);

        // Year 0 is a leap year: its last five days are non-weekdays
        let mut before = d.copy();
        before.advance_days(-1);
        assert_eq!(before.date_string(), "35-dec-0");
        assert_eq!(before.weekday_index(), None);
        assert_eq!(before.day_number(), -1);
        before.advance_days(-5);
        assert_eq!(before.weekday_index(), Some(6));
    }

    #[test]
    fn test_advance_months() {
        let sys = system();
        let mut d = date(&sys, "17-nov-3");
        let change = d.advance_months(2, false, true);
        assert_eq!(d.date_string(), "17-jan-4");
        assert!(change.months && change.years);

        d.advance_months(-1, false, false);
        assert_eq!(d.date_string(), "1-dec-3");
        assert!(d.advance_months(0, false, false).is_empty());
    }

    #[test]
    fn test_advance_months_clamps_preserved_day() {
        let sys = system();
        let mut d = date(&sys, "33-dec-4");
        d.advance_months(1, false, true);
        assert_eq!(d.date_string(), "30-jan-5");
    }

    #[test]
    fn test_advance_months_ignore_intercalaries() {
        let sys = system();

        let mut counted = date(&sys, "5-dec-99");
        counted.advance_months(1, false, true);
        assert_eq!(counted.date_string(), "5-cent-100");

        let mut skipped = date(&sys, "5-dec-99");
        skipped.advance_months(1, true, true);
        assert_eq!(skipped.date_string(), "5-jan-100");

        skipped.advance_months(-1, true, true);
        assert_eq!(skipped.date_string(), "5-dec-99");

        let mut from_inside = date(&sys, "4-cent-100");
        from_inside.advance_months(-1, true, false);
        assert_eq!(from_inside.date_string(), "1-dec-99");
    }

    #[test]
    fn test_advance_years_keeps_alias() {
        let sys = system();
        let mut d = date(&sys, "35-dec-4");
        d.advance_years(1, false).unwrap();
        assert_eq!(d.date_string(), "30-dec-5");

        let mut j = date(&sys, "1-jan-99");
        j.advance_years(1, false).unwrap();
        assert_eq!(j.date_string(), "1-jan-100");
        assert_eq!(j.month().true_order(), 2);
    }

    #[test]
    fn test_advance_years_normalised() {
        let sys = system();
        let mut d = date(&sys, "1-jan-99");
        d.advance_years(1, true).unwrap();
        assert_eq!(d.date_string(), "1-cent-100");

        let mut end = date(&sys, "35-dec-4");
        end.advance_years(1, true).unwrap();
        assert_eq!(end.date_string(), "30-dec-5");
    }

    #[test]
    fn test_advance_years_missing_intercalary_month() {
        let sys = system();
        let mut d = date(&sys, "7-cent-100");
        let change = d.advance_years(1, false).unwrap();
        // Same true order (1) in year 101 is January
        assert_eq!(d.date_string(), "7-jan-101");
        assert!(change.years);
    }

    #[test]
    fn test_advance_years_trailing_intercalary_clamps_to_last_month() {
        let mut def = fixture();
        def.intercalary_months[0].insert_before = "nowhere".to_string();
        let sys = Arc::new(CalendarSystem::new(def, &EngineConfig::default()).unwrap());
        let mut d = date(&sys, "7-cent-100");
        d.advance_years(1, false).unwrap();
        assert_eq!(d.date_string(), "7-dec-101");
    }

    #[test]
    fn test_advance_years_inconsistent_definition() {
        let mut def = fixture();
        def.intercalary_months[0].insert_before = "nowhere".to_string();
        def.intercalary_months[0].month.nominal_order = 13;
        let sys = Arc::new(CalendarSystem::new(def, &EngineConfig::default()).unwrap());
        let mut d = date(&sys, "7-cent-100");
        let err = d.advance_years(1, false).unwrap_err();
        assert!(matches!(err, CalendarError::NoMatchingMonth { true_order: 13, .. }));
        assert_eq!(d.date_string(), "7-cent-100");
    }

    #[test]
    fn test_ordering_by_true_order() {
        let sys = system();
        let cent = date(&sys, "10-cent-100");
        let jan = date(&sys, "1-jan-100");
        assert!(cent < jan);
        assert!(date(&sys, "30-dec-99") < cent);
        assert!(jan <= jan.copy());
        assert!(jan >= jan.copy());
    }

    #[test]
    fn test_compare_optional_missing_sorts_last() {
        let sys = system();
        let d = date(&sys, "1-jan-1");
        assert_eq!(compare_optional(Some(&d), None), Ordering::Less);
        assert_eq!(compare_optional(None, Some(&d)), Ordering::Greater);
        assert_eq!(compare_optional(None, None), Ordering::Equal);

        let mut dates = vec![None, Some(d.copy()), None, Some(date(&sys, "1-jan--1"))];
        dates.sort_by(|a, b| compare_optional(a.as_ref(), b.as_ref()));
        assert_eq!(dates[0].as_ref().unwrap().year(), -1);
        assert_eq!(dates[1].as_ref().unwrap().year(), 1);
        assert!(dates[2].is_none() && dates[3].is_none());
    }

    #[test]
    fn test_days_since_and_years_since() {
        let sys = system();
        let a = date(&sys, "10-mar-1");
        let b = date(&sys, "9-mar-11");
        assert_eq!(b.days_since(&a), 360 * 10 + 2 * 5 - 1);
        assert_eq!(a.days_since(&b), -(360 * 10 + 2 * 5 - 1));
        assert_eq!(b.years_since(&a), 9);
        assert_eq!(a.years_since(&b), -9);

        let c = date(&sys, "10-mar-11");
        assert_eq!(c.years_since(&a), 10);
    }

    #[test]
    fn test_copy_is_never_primary() {
        let sys = system();
        let primary = date(&sys, "1-jan-1").into_primary();
        assert!(primary.is_primary());
        assert!(!primary.copy().is_primary());
        assert!(!primary.clone().is_primary());
    }

    #[test]
    fn test_strings() {
        let sys = system();
        let d = date(&sys, "1-Mar-2012");
        assert_eq!(d.date_string(), "1-mar-2012");
        assert_eq!(d.roundtrip_string(), "7_1/mar/2012");
        assert_eq!(d.to_string(), "1-mar-2012");
        assert_eq!(date(&sys, &d.date_string()), d);
    }

    #[test]
    fn test_dates_are_shareable_across_threads() {
        let sys = system();
        let d = date(&sys, "1-jan-50");
        let handle = std::thread::spawn(move || {
            let mut copy = d.copy();
            copy.advance_days(400);
            copy.date_string()
        });
        // 1-jan-50 + 360 days = 1-jan-51, + 40 days = 11-feb-51
        assert_eq!(handle.join().unwrap(), "11-feb-51");
    }
}
