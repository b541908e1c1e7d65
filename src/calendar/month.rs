//! Month templates and year-bound month instances.
//!
//! A [`MonthDefinition`] describes a month's normal shape. Its
//! [`IntercalaryDay`] templates modify that shape in years matched by their
//! rule. [`Month::resolve`] folds all of that into the concrete [`Month`] a
//! given year uses. Whole extra months are described by [`IntercalaryMonth`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::error::CalendarError;
use super::rule::IntercalaryRule;

/// Nominal order of a month that is normally absent from the year.
pub const INTERCALARY_NOMINAL_ORDER: i32 = -1;

/// Characters that would break the compact and round-trip date formats.
const RESERVED_ALIAS_CHARS: &[char] = &['-', '/', '_'];

/// Name of a special day (e.g. a festival).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayName {
    #[serde(rename = "shortname")]
    pub short_name: String,
    #[serde(rename = "fullname")]
    pub full_name: String,
}

impl DayName {
    pub fn new(short_name: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            full_name: full_name.into(),
        }
    }
}

/// Conditional modification of a month, applied in years matched by `rule`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntercalaryDay {
    #[serde(rename = "intercalaryrule")]
    pub rule: IntercalaryRule,
    /// Days added to the month; negative values shorten it.
    #[serde(rename = "insertdays", default)]
    pub insert_days: i32,
    #[serde(rename = "specialdays", default)]
    pub add_special_days: BTreeMap<u32, DayName>,
    #[serde(rename = "removespecialdays", default)]
    pub remove_special_days: BTreeSet<u32>,
    #[serde(rename = "nonweekdays", default)]
    pub add_non_weekdays: BTreeSet<u32>,
    #[serde(rename = "removenonweekdays", default)]
    pub remove_non_weekdays: BTreeSet<u32>,
}

impl IntercalaryDay {
    /// Template that only inserts (or, when negative, removes) days.
    pub fn inserting(rule: IntercalaryRule, insert_days: i32) -> Self {
        Self {
            rule,
            insert_days,
            add_special_days: BTreeMap::new(),
            remove_special_days: BTreeSet::new(),
            add_non_weekdays: BTreeSet::new(),
            remove_non_weekdays: BTreeSet::new(),
        }
    }
}

/// The normal shape of a month plus its conditional modifications.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDefinition {
    pub alias: String,
    #[serde(rename = "shortname")]
    pub short_name: String,
    #[serde(rename = "fullname")]
    pub full_name: String,
    #[serde(rename = "nominalorder")]
    pub nominal_order: i32,
    #[serde(rename = "normaldays")]
    pub normal_days: u32,
    #[serde(rename = "specialdays", default)]
    pub special_days: BTreeMap<u32, DayName>,
    #[serde(rename = "nonweekdays", default)]
    pub non_weekdays: BTreeSet<u32>,
    #[serde(rename = "intercalarydays", default)]
    pub intercalary_days: Vec<IntercalaryDay>,
}

impl MonthDefinition {
    pub fn new(
        alias: impl Into<String>,
        short_name: impl Into<String>,
        full_name: impl Into<String>,
        nominal_order: i32,
        normal_days: u32,
    ) -> Self {
        Self {
            alias: alias.into(),
            short_name: short_name.into(),
            full_name: full_name.into(),
            nominal_order,
            normal_days,
            special_days: BTreeMap::new(),
            non_weekdays: BTreeSet::new(),
            intercalary_days: Vec::new(),
        }
    }

    pub fn with_special_day(mut self, day: u32, name: DayName) -> Self {
        self.special_days.insert(day, name);
        self
    }

    pub fn with_non_weekday(mut self, day: u32) -> Self {
        self.non_weekdays.insert(day);
        self
    }

    pub fn with_intercalary_day(mut self, template: IntercalaryDay) -> Self {
        self.intercalary_days.push(template);
        self
    }

    /// Reject aliases the date formats cannot carry, day-0 references and
    /// zero-divisor rules.
    pub fn validate(&self) -> Result<(), CalendarError> {
        validate_alias(&self.alias)?;
        let day_zero = CalendarError::InvalidSpecialDay {
            alias: self.alias.clone(),
        };
        if self.special_days.contains_key(&0) || self.non_weekdays.contains(&0) {
            return Err(day_zero);
        }
        for template in &self.intercalary_days {
            template.rule.validate()?;
            if template.add_special_days.contains_key(&0) || template.add_non_weekdays.contains(&0) {
                return Err(day_zero);
            }
        }
        Ok(())
    }

    /// Every rule attached to this month.
    pub(crate) fn rules(&self) -> impl Iterator<Item = &IntercalaryRule> {
        self.intercalary_days.iter().map(|t| &t.rule)
    }
}

fn validate_alias(alias: &str) -> Result<(), CalendarError> {
    let reason = if alias.is_empty() {
        Some("alias is empty")
    } else if alias.contains(RESERVED_ALIAS_CHARS) {
        Some("alias may not contain '-', '/' or '_'")
    } else if alias.chars().any(char::is_whitespace) {
        Some("alias may not contain whitespace")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(CalendarError::InvalidAlias {
            alias: alias.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// A whole month spliced into years matched by `rule`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntercalaryMonth {
    #[serde(rename = "intercalaryrule")]
    pub rule: IntercalaryRule,
    pub month: MonthDefinition,
    /// Alias of the month this one is inserted before.
    #[serde(rename = "position")]
    pub insert_before: String,
}

impl IntercalaryMonth {
    pub fn new(rule: IntercalaryRule, month: MonthDefinition, insert_before: impl Into<String>) -> Self {
        Self {
            rule,
            month,
            insert_before: insert_before.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CalendarError> {
        self.rule.validate()?;
        self.month.validate()
    }
}

/// The resolved shape of one month in one specific year.
///
/// Built by [`Month::resolve`]; the true order is fixed when the owning
/// [`Year`](super::year::Year) is assembled and never changes afterwards.
#[derive(Clone, Debug)]
pub struct Month {
    days: u32,
    alias: String,
    short_name: String,
    full_name: String,
    nominal_order: i32,
    true_order: u32,
    day_names: BTreeMap<u32, DayName>,
    non_weekdays: BTreeSet<u32>,
    intercalary: bool,
}

impl Month {
    /// Apply every matching intercalary day template, in declared order.
    pub fn resolve(definition: &MonthDefinition, year: i64) -> Self {
        let mut month = Self {
            days: definition.normal_days,
            alias: definition.alias.clone(),
            short_name: definition.short_name.clone(),
            full_name: definition.full_name.clone(),
            nominal_order: definition.nominal_order,
            true_order: 0,
            day_names: definition.special_days.clone(),
            non_weekdays: definition.non_weekdays.clone(),
            intercalary: false,
        };

        for template in definition.intercalary_days.iter().filter(|t| t.rule.matches(year)) {
            month.days = month.days.saturating_add_signed(template.insert_days);
            // Removal precedes addition so a later template may rename a day.
            for day in &template.remove_special_days {
                month.day_names.remove(day);
            }
            for (day, name) in &template.add_special_days {
                month.day_names.insert(*day, name.clone());
            }
            for day in &template.remove_non_weekdays {
                month.non_weekdays.remove(day);
            }
            month.non_weekdays.extend(template.add_non_weekdays.iter().copied());
        }

        month
    }

    pub(crate) fn with_true_order(mut self, true_order: u32) -> Self {
        self.true_order = true_order;
        self
    }

    pub(crate) fn spliced(mut self) -> Self {
        self.intercalary = true;
        self
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn nominal_order(&self) -> i32 {
        self.nominal_order
    }

    /// 1-based position within the owning year.
    pub fn true_order(&self) -> u32 {
        self.true_order
    }

    /// Whether this month was spliced in from an [`IntercalaryMonth`].
    pub fn is_intercalary(&self) -> bool {
        self.intercalary
    }

    pub fn day_name(&self, day: u32) -> Option<&DayName> {
        self.day_names.get(&day)
    }

    pub fn day_names(&self) -> &BTreeMap<u32, DayName> {
        &self.day_names
    }

    pub fn non_weekdays(&self) -> &BTreeSet<u32> {
        &self.non_weekdays
    }

    pub fn is_non_weekday(&self, day: u32) -> bool {
        self.non_weekdays.contains(&day)
    }

    /// Days of this month that take part in the weekday cycle.
    ///
    /// Non-weekdays past the end of the month are ignored.
    pub fn weekday_count(&self) -> u32 {
        self.weekdays_before(self.days + 1)
    }

    /// Weekday-eligible days strictly before `day`.
    pub fn weekdays_before(&self, day: u32) -> u32 {
        let span = day.saturating_sub(1).min(self.days);
        let excluded = self.non_weekdays.range(1..=span).count() as u32;
        span - excluded
    }

    pub(crate) fn matches_alias(&self, alias: &str) -> bool {
        self.alias.eq_ignore_ascii_case(alias)
    }
}

impl PartialEq for Month {
    fn eq(&self, other: &Self) -> bool {
        self.alias == other.alias && self.days == other.days
    }
}

impl Eq for Month {}
