//! Year caching
//!
//! Provides an LRU cache for generated years so that walking back and forth
//! across a year boundary does not rebuild the same year repeatedly.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::year::Year;

/// Maximum number of years to keep in cache
pub const DEFAULT_MAX_CACHED: usize = 64;

/// A cached year with its last access tick
struct CachedYear {
    year: Arc<Year>,
    last_accessed: u64,
}

/// Cache for generated years with LRU eviction
pub struct YearCache {
    years: HashMap<i64, CachedYear>,
    /// Cumulative first-weekday offsets already computed, by year number
    offsets: HashMap<i64, usize>,
    max_cached: usize,
    tick: u64,
}

impl YearCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CACHED)
    }

    pub fn with_capacity(max_cached: usize) -> Self {
        YearCache {
            years: HashMap::new(),
            offsets: HashMap::new(),
            max_cached: max_cached.max(1),
            tick: 0,
        }
    }

    /// Get a year, touching it
    pub fn get(&mut self, year: i64) -> Option<Arc<Year>> {
        self.tick += 1;
        let tick = self.tick;
        self.years.get_mut(&year).map(|cached| {
            cached.last_accessed = tick;
            Arc::clone(&cached.year)
        })
    }

    pub fn insert(&mut self, year: Arc<Year>) {
        self.tick += 1;
        if !self.years.contains_key(&year.number()) && self.years.len() >= self.max_cached {
            self.evict_oldest();
        }
        self.years.insert(
            year.number(),
            CachedYear {
                year,
                last_accessed: self.tick,
            },
        );
    }

    /// First weekday of `year`, from the memo or a cached year.
    pub fn first_weekday(&self, year: i64) -> Option<usize> {
        self.offsets
            .get(&year)
            .copied()
            .or_else(|| self.years.get(&year).map(|cached| cached.year.first_weekday_index()))
    }

    /// The known first weekday closest to `year`, as `(year, index)`.
    pub fn nearest_first_weekday(&self, year: i64) -> Option<(i64, usize)> {
        let memoised = self.offsets.iter().map(|(y, index)| (*y, *index));
        let generated = self
            .years
            .iter()
            .map(|(y, cached)| (*y, cached.year.first_weekday_index()));
        memoised
            .chain(generated)
            .min_by_key(|(known, _)| known.abs_diff(year))
    }

    pub fn store_first_weekday(&mut self, year: i64, index: usize) {
        if self.offsets.len() >= self.max_cached * 4 {
            self.offsets.clear();
        }
        self.offsets.insert(year, index);
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn clear(&mut self) {
        self.years.clear();
        self.offsets.clear();
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .years
            .iter()
            .min_by_key(|(_, cached)| cached.last_accessed)
            .map(|(year, _)| *year);
        if let Some(year) = oldest {
            debug!(year, "evicting cached year");
            self.years.remove(&year);
        }
    }
}

impl Default for YearCache {
    fn default() -> Self {
        Self::new()
    }
}
