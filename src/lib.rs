//! Perpetual calendar engine library
//!
//! Rule-driven calendars for simulated worlds: variable month lengths,
//! festival days outside the weekday cycle, intercalary days and months,
//! and exact date arithmetic across them.

pub mod calendar;
pub mod config;
pub mod persistence;

pub use calendar::{Calendar, CalendarError, CalendarRegistry, DisplayMode, MudDate};
pub use config::EngineConfig;
