//! Error types for the calendar engine.

/// Error type for all fallible calendar operations.
///
/// Configuration variants are only produced while a definition is loaded or
/// edited. Lookup variants come from parsing and date construction.
/// [`CalendarError::NoMatchingMonth`] signals an inconsistent definition
/// discovered during year arithmetic and should be treated as fatal.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// A rule (or one of its sub-rules) has a divisor of zero.
    #[error("intercalary rule with offset {offset} has a divisor of 0")]
    ZeroDivisor {
        /// Offset of the offending rule.
        offset: i64,
    },

    /// Two months share the same alias (aliases are case-insensitive).
    #[error("duplicate month alias '{alias}'")]
    DuplicateAlias { alias: String },

    /// An alias is empty or contains a character reserved by the date formats.
    #[error("invalid month alias '{alias}': {reason}")]
    InvalidAlias { alias: String, reason: &'static str },

    /// The weekday cycle is empty.
    #[error("calendar '{calendar}' defines no weekdays")]
    NoWeekdays { calendar: String },

    /// No base month with a positive day count exists.
    #[error("calendar '{calendar}' defines no month with a positive day count")]
    NoMonths { calendar: String },

    /// The epoch weekday index is outside the weekday cycle.
    #[error("epoch weekday {index} is out of range (calendar has {count} weekdays)")]
    InvalidEpochWeekday { index: usize, count: usize },

    /// A special day name or non-weekday refers to day 0.
    #[error("month '{alias}' refers to day 0")]
    InvalidSpecialDay { alias: String },

    /// Malformed definition data (missing field, wrong type, bad JSON).
    #[error("malformed calendar definition: {0}")]
    Definition(String),

    /// A date string could not be parsed.
    #[error("invalid date '{input}': {reason}")]
    InvalidDate { input: String, reason: String },

    /// No month with the given alias exists in the requested year.
    #[error("no month '{alias}' in year {year}")]
    UnknownMonth { alias: String, year: i64 },

    /// Day number outside the month.
    #[error("day {day} is out of range for {alias} {year} (1..={max})")]
    DayOutOfRange {
        day: i64,
        alias: String,
        year: i64,
        max: u32,
    },

    /// A round-trip string names a calendar id that is not registered.
    #[error("unknown calendar id {id}")]
    UnknownCalendar { id: u64 },

    /// Year arithmetic found neither an alias nor a true-order match.
    #[error(
        "month '{alias}' (true order {true_order}) has no counterpart in year {year}; \
         calendar definition is inconsistent"
    )]
    NoMatchingMonth {
        alias: String,
        true_order: u32,
        year: i64,
    },

    /// Save file written by a newer version of the engine.
    #[error("save file version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CalendarError {
    fn from(e: serde_json::Error) -> Self {
        CalendarError::Definition(e.to_string())
    }
}
