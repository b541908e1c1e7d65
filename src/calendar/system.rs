//! The immutable rule set behind a calendar, and year generation.
//!
//! A [`CalendarSystem`] is shared through an `Arc` by its
//! [`Calendar`](super::Calendar) and by every [`MudDate`] built against it.
//! Definition edits never mutate a system in place: the calendar builds a new
//! one, so the old year cache goes away with the old rules.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::cache::YearCache;
use super::date::MudDate;
use super::definition::{CalendarDefinition, Epoch};
use super::error::CalendarError;
use super::month::{IntercalaryMonth, Month, MonthDefinition};
use super::rule::lcm;
use super::year::Year;
use crate::config::EngineConfig;

/// Day and weekday totals over a span of years.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Totals {
    days: i64,
    weekdays: i64,
}

impl std::ops::AddAssign for Totals {
    fn add_assign(&mut self, rhs: Self) {
        self.days += rhs.days;
        self.weekdays += rhs.weekdays;
    }
}

/// Whole-cycle shortcut: every `years`-long run of consecutive years has
/// the same totals.
#[derive(Clone, Copy, Debug)]
struct Cycle {
    years: i64,
    totals: Totals,
}

pub struct CalendarSystem {
    definition: CalendarDefinition,
    /// Base months sorted by nominal order.
    base_months: Vec<MonthDefinition>,
    cycle: Option<Cycle>,
    cache: Mutex<YearCache>,
}

impl CalendarSystem {
    /// Validate `definition` and build the system around it.
    pub fn new(definition: CalendarDefinition, config: &EngineConfig) -> Result<Self, CalendarError> {
        definition.validate()?;

        let mut base_months = definition.months.clone();
        base_months.sort_by_key(|m| m.nominal_order);

        let mut system = Self {
            definition,
            base_months,
            cycle: None,
            cache: Mutex::new(YearCache::with_capacity(config.year_cache_size)),
        };
        system.cycle = system.find_cycle(config.cycle_limit);
        debug!(
            calendar = %system.definition.name,
            cycle_years = system.cycle.map(|c| c.years),
            "built calendar system"
        );
        Ok(system)
    }

    pub fn id(&self) -> u64 {
        self.definition.id
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn description(&self) -> &str {
        &self.definition.description
    }

    pub fn weekdays(&self) -> &[String] {
        &self.definition.weekdays
    }

    /// Month templates in definition order.
    pub fn month_definitions(&self) -> &[MonthDefinition] {
        &self.definition.months
    }

    pub fn intercalary_months(&self) -> &[IntercalaryMonth] {
        &self.definition.intercalary_months
    }

    pub fn epoch(&self) -> Epoch {
        self.definition.epoch
    }

    pub fn definition(&self) -> &CalendarDefinition {
        &self.definition
    }

    /// Number of years after which every rule repeats, if within the
    /// configured limit.
    pub fn cycle_years(&self) -> Option<i64> {
        self.cycle.map(|c| c.years)
    }

    /// Generate (or fetch from cache) the given year.
    pub fn create_year(&self, number: i64) -> Arc<Year> {
        if let Some(year) = self.lock_cache().get(number) {
            return year;
        }
        let first_weekday = self.first_weekday(number);
        let year = Arc::new(Year::new(number, self.resolve_months(number), first_weekday));
        debug!(calendar = %self.definition.name, year = number, "generated year");
        self.lock_cache().insert(Arc::clone(&year));
        year
    }

    /// Months of `year` in true order: base months by nominal order, with
    /// every matching intercalary month spliced in before its anchor.
    fn resolve_months(&self, year: i64) -> Vec<Month> {
        let mut months: Vec<Month> = self
            .base_months
            .iter()
            .map(|def| Month::resolve(def, year))
            .collect();

        for intercalary in self
            .definition
            .intercalary_months
            .iter()
            .filter(|im| im.rule.matches(year))
        {
            let month = Month::resolve(&intercalary.month, year).spliced();
            match months.iter().position(|m| m.matches_alias(&intercalary.insert_before)) {
                Some(at) => months.insert(at, month),
                None => months.push(month),
            }
        }

        months
            .into_iter()
            .filter(|m| m.days() > 0)
            .enumerate()
            .map(|(i, m)| m.with_true_order(i as u32 + 1))
            .collect()
    }

    fn year_totals(&self, year: i64) -> Totals {
        self.resolve_months(year).iter().fold(Totals::default(), |mut acc, m| {
            acc.days += m.days() as i64;
            acc.weekdays += m.weekday_count() as i64;
            acc
        })
    }

    fn find_cycle(&self, limit: u64) -> Option<Cycle> {
        let rules = self
            .base_months
            .iter()
            .flat_map(|m| m.rules())
            .chain(self.definition.intercalary_months.iter().flat_map(|im| {
                std::iter::once(&im.rule).chain(im.month.rules())
            }));

        let mut years = 1u64;
        for rule in rules {
            years = lcm(years, rule.period(limit)?);
            if years > limit {
                return None;
            }
        }

        let years = years as i64;
        let start = self.definition.epoch.year;
        let mut totals = Totals::default();
        for year in start..start + years {
            totals += self.year_totals(year);
        }
        Some(Cycle { years, totals })
    }

    /// Totals over `[from, to)`; `from <= to`.
    fn sum_years(&self, from: i64, to: i64) -> Totals {
        let span = to - from;
        let mut totals = Totals::default();
        let rest = match self.cycle {
            Some(cycle) => {
                let whole = span / cycle.years;
                totals.days = whole * cycle.totals.days;
                totals.weekdays = whole * cycle.totals.weekdays;
                span % cycle.years
            }
            None => span,
        };
        for year in from..from + rest {
            totals += self.year_totals(year);
        }
        totals
    }

    /// Signed totals from the start of `from` to the start of `to`.
    fn totals_between(&self, from: i64, to: i64) -> Totals {
        if from <= to {
            self.sum_years(from, to)
        } else {
            let t = self.sum_years(to, from);
            Totals {
                days: -t.days,
                weekdays: -t.weekdays,
            }
        }
    }

    pub fn count_days_in_year(&self, year: i64) -> u32 {
        self.create_year(year).days()
    }

    pub fn count_weekdays_in_year(&self, year: i64) -> u32 {
        self.create_year(year).weekdays()
    }

    /// Days from the first day of `from` up to, not including, the first day
    /// of `to`. Negative when `to < from`.
    pub fn count_days_between_years(&self, from: i64, to: i64) -> i64 {
        self.totals_between(from, to).days
    }

    /// Weekday index of the first weekday-eligible day of `year`.
    ///
    /// Counts weekdays from the nearest year whose first weekday is already
    /// known, or from the epoch when that is closer, so stepping to an
    /// adjacent year costs one year of counting wherever it lies.
    pub fn first_weekday(&self, year: i64) -> usize {
        let epoch = self.definition.epoch;
        let nearest = {
            let cache = self.lock_cache();
            if let Some(index) = cache.first_weekday(year) {
                return index;
            }
            cache.nearest_first_weekday(year)
        };
        let (anchor_year, anchor_index) = match nearest {
            Some((known, index)) if known.abs_diff(year) < epoch.year.abs_diff(year) => (known, index),
            _ => (epoch.year, epoch.first_weekday),
        };

        let offset = self.totals_between(anchor_year, year).weekdays;
        let cycle = self.definition.weekdays.len() as i64;
        let index = (anchor_index as i64 + offset).rem_euclid(cycle) as usize;
        self.lock_cache().store_first_weekday(year, index);
        index
    }

    /// Parse a compact `<day>-<alias>-<year>` string against this system.
    pub fn parse_date(self: &Arc<Self>, text: &str) -> Result<MudDate, CalendarError> {
        let invalid = |reason: &str| CalendarError::InvalidDate {
            input: text.to_string(),
            reason: reason.to_string(),
        };
        let mut parts = text.trim().splitn(3, '-');
        let (day, alias, year) = match (parts.next(), parts.next(), parts.next()) {
            (Some(d), Some(a), Some(y)) if !a.is_empty() => (d, a, y),
            _ => return Err(invalid("expected <day>-<month>-<year>")),
        };
        let day: i64 = day.trim().parse().map_err(|_| invalid("day is not a number"))?;
        let year: i64 = year.trim().parse().map_err(|_| invalid("year is not a number"))?;
        MudDate::in_year(Arc::clone(self), day, alias.trim(), year)
    }

    fn lock_cache(&self) -> MutexGuard<'_, YearCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for CalendarSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarSystem")
            .field("id", &self.definition.id)
            .field("name", &self.definition.name)
            .field("cycle_years", &self.cycle_years())
            .finish()
    }
}
