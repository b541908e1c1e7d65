//! Persisted tree form of a calendar.
//!
//! Field names follow the definition file layout: rules carry `offset`,
//! `divisor`, `exceptions`, `ands` and `ors`; months carry `alias`,
//! `shortname`, `fullname`, `nominalorder`, `normaldays`, `specialdays`,
//! `nonweekdays` and `intercalarydays`; intercalary months carry `position`,
//! `intercalaryrule` and `month`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::CalendarError;
use super::month::{IntercalaryMonth, MonthDefinition};

/// Weekday anchoring: the first weekday-eligible day of `year` has weekday
/// index `first_weekday`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
    pub year: i64,
    #[serde(rename = "firstweekday")]
    pub first_weekday: usize,
}

impl Default for Epoch {
    fn default() -> Self {
        Self {
            year: 1,
            first_weekday: 0,
        }
    }
}

/// Everything needed to rebuild a [`Calendar`](super::Calendar).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDefinition {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub weekdays: Vec<String>,
    pub months: Vec<MonthDefinition>,
    #[serde(rename = "intercalarymonths", default)]
    pub intercalary_months: Vec<IntercalaryMonth>,
    #[serde(default)]
    pub epoch: Epoch,
    /// Primary date in compact form (`<day>-<alias>-<year>`).
    #[serde(rename = "currentdate")]
    pub current_date: String,
}

impl CalendarDefinition {
    pub fn from_json(json: &str) -> Result<Self, CalendarError> {
        let definition: Self = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn to_json(&self) -> Result<String, CalendarError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the definition for configuration errors.
    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.weekdays.is_empty() {
            return Err(CalendarError::NoWeekdays {
                calendar: self.name.clone(),
            });
        }
        if self.epoch.first_weekday >= self.weekdays.len() {
            return Err(CalendarError::InvalidEpochWeekday {
                index: self.epoch.first_weekday,
                count: self.weekdays.len(),
            });
        }
        if !self.months.iter().any(|m| m.normal_days > 0) {
            return Err(CalendarError::NoMonths {
                calendar: self.name.clone(),
            });
        }

        let mut seen = HashSet::new();
        let all_months = self
            .months
            .iter()
            .chain(self.intercalary_months.iter().map(|im| &im.month));
        for month in all_months {
            if !seen.insert(month.alias.to_ascii_lowercase()) {
                return Err(CalendarError::DuplicateAlias {
                    alias: month.alias.clone(),
                });
            }
        }

        for month in &self.months {
            month.validate()?;
        }
        for intercalary in &self.intercalary_months {
            intercalary.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::calendar::month::{IntercalaryDay, IntercalaryMonth};
    use crate::calendar::rule::IntercalaryRule;

    /// Twelve 30-day months; December gains five non-weekdays every fourth
    /// year; a 10-day "leap" month is inserted before January every 100 years.
    pub(crate) fn fixture() -> CalendarDefinition {
        let aliases = [
            ("jan", "January"),
            ("feb", "February"),
            ("mar", "March"),
            ("apr", "April"),
            ("may", "May"),
            ("jun", "June"),
            ("jul", "July"),
            ("aug", "August"),
            ("sep", "September"),
            ("oct", "October"),
            ("nov", "November"),
            ("dec", "December"),
        ];
        let mut months: Vec<MonthDefinition> = aliases
            .iter()
            .enumerate()
            .map(|(i, (alias, full))| {
                let short = &full[..3];
                MonthDefinition::new(*alias, short, *full, i as i32 + 1, 30)
            })
            .collect();
        let leap = IntercalaryDay {
            add_non_weekdays: (31..=35).collect(),
            ..IntercalaryDay::inserting(IntercalaryRule::new(4, 0).unwrap(), 5)
        };
        months[11] = months[11].clone().with_intercalary_day(leap);

        CalendarDefinition {
            id: 7,
            name: "Test Reckoning".to_string(),
            description: String::new(),
            weekdays: ["Sun", "Moon", "Tiw", "Woden", "Thor", "Frigg", "Saturn"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            months,
            intercalary_months: vec![IntercalaryMonth::new(
                IntercalaryRule::new(100, 0).unwrap(),
                MonthDefinition::new("cent", "Cen", "Centennial", -1, 10),
                "jan",
            )],
            epoch: Epoch::default(),
            current_date: "1-jan-1".to_string(),
        }
    }

    #[test]
    fn test_fixture_is_valid() {
        assert!(fixture().validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let def = fixture();
        let json = def.to_json().unwrap();
        assert!(json.contains("\"intercalarymonths\""));
        assert!(json.contains("\"position\": \"jan\""));
        let back = CalendarDefinition::from_json(&json).unwrap();
        assert_eq!(back, def);
    }

    #[test]
    fn test_rejects_no_weekdays() {
        let mut def = fixture();
        def.weekdays.clear();
        assert!(matches!(def.validate(), Err(CalendarError::NoWeekdays { .. })));
    }

    #[test]
    fn test_rejects_duplicate_alias_case_insensitive() {
        let mut def = fixture();
        def.intercalary_months[0].month.alias = "JAN".to_string();
        assert!(matches!(
            def.validate(),
            Err(CalendarError::DuplicateAlias { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_divisor_in_nested_rule() {
        let mut def = fixture();
        def.months[11].intercalary_days[0]
            .rule
            .exceptions
            .push(IntercalaryRule {
                divisor: 0,
                ..IntercalaryRule::always()
            });
        assert!(matches!(def.validate(), Err(CalendarError::ZeroDivisor { .. })));
    }

    #[test]
    fn test_rejects_bad_epoch() {
        let mut def = fixture();
        def.epoch.first_weekday = 7;
        assert!(matches!(
            def.validate(),
            Err(CalendarError::InvalidEpochWeekday { index: 7, count: 7 })
        ));
    }

    #[test]
    fn test_rejects_months_without_days() {
        let mut def = fixture();
        for month in &mut def.months {
            month.normal_days = 0;
        }
        assert!(matches!(def.validate(), Err(CalendarError::NoMonths { .. })));
    }

    #[test]
    fn test_missing_field_is_descriptive() {
        let err = CalendarDefinition::from_json(r#"{"id": 1, "name": "x"}"#).unwrap_err();
        match err {
            CalendarError::Definition(msg) => assert!(msg.contains("missing field")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
