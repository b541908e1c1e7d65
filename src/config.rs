//! Configuration for the calendar engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::calendar::cache::DEFAULT_MAX_CACHED;
use crate::calendar::CalendarError;

/// Engine tuning and data location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Generated years kept per calendar (default: 64).
    pub year_cache_size: usize,

    /// Longest rule cycle, in years, used to sum whole cycles at once when
    /// counting days across many years (default: 10 000). Calendars whose
    /// rules repeat less often are summed year by year.
    pub cycle_limit: u64,

    /// Directory of calendar JSON files overriding the embedded defaults.
    pub data_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            year_cache_size: DEFAULT_MAX_CACHED,
            cycle_limit: 10_000,
            data_dir: None,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file; missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, CalendarError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.year_cache_size, 64);
        assert_eq!(config.cycle_limit, 10_000);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"cycle_limit": 400}"#).unwrap();
        assert_eq!(config.cycle_limit, 400);
        assert_eq!(config.year_cache_size, 64);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"year_cache_size": 8, "data_dir": "cals"}"#).unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.year_cache_size, 8);
        assert_eq!(config.data_dir, Some(PathBuf::from("cals")));
    }
}
