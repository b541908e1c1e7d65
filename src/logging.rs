//! Log output for the command-line tool.
//!
//! Library code emits `tracing` events; this installs the subscriber that
//! prints them to stderr, keeping stdout for the dates being printed.

use tracing_subscriber::EnvFilter;

/// Targets whose events are shown by default.
const CALENDAR_TARGETS: &[&str] = &["perpetual_calendar"];

/// Level shown for a given count of `-v` flags.
fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Directive string enabling `level` for every calendar target.
fn default_directives(level: &str) -> String {
    CALENDAR_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the stderr subscriber. A set `RUST_LOG` wins over `-v`.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level_for(verbosity))));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
