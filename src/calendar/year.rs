//! A fully resolved year: its months in true order plus weekday anchoring.

use super::month::Month;

/// One generated year.
///
/// Months are stored in true order: `months()[i].true_order() == i + 1`.
/// Every year built by a [`CalendarSystem`](super::system::CalendarSystem)
/// has at least one month.
#[derive(Clone, Debug)]
pub struct Year {
    number: i64,
    months: Vec<Month>,
    first_weekday_index: usize,
}

impl Year {
    pub(crate) fn new(number: i64, months: Vec<Month>, first_weekday_index: usize) -> Self {
        Self {
            number,
            months,
            first_weekday_index,
        }
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn months(&self) -> &[Month] {
        &self.months
    }

    pub fn month_count(&self) -> usize {
        self.months.len()
    }

    /// Position in the weekday cycle of the first weekday-eligible day.
    pub fn first_weekday_index(&self) -> usize {
        self.first_weekday_index
    }

    pub fn first_month(&self) -> &Month {
        &self.months[0]
    }

    pub fn last_month(&self) -> &Month {
        &self.months[self.months.len() - 1]
    }

    /// Index (0-based) of the month with the given alias, case-insensitive.
    pub fn index_of_alias(&self, alias: &str) -> Option<usize> {
        self.months.iter().position(|m| m.matches_alias(alias))
    }

    pub fn month_by_alias(&self, alias: &str) -> Option<&Month> {
        self.index_of_alias(alias).map(|i| &self.months[i])
    }

    pub fn month_by_true_order(&self, true_order: u32) -> Option<&Month> {
        (true_order as usize)
            .checked_sub(1)
            .and_then(|i| self.months.get(i))
    }

    pub fn days(&self) -> u32 {
        self.months.iter().map(Month::days).sum()
    }

    pub fn weekdays(&self) -> u32 {
        self.months.iter().map(Month::weekday_count).sum()
    }

    /// 1-based day of the year for `day` in the month at `index`.
    pub fn day_of_year(&self, index: usize, day: u32) -> u32 {
        let before: u32 = self.months[..index].iter().map(Month::days).sum();
        before + day
    }

    /// Month index and day reached after `elapsed` whole days from the
    /// first day of the year. Clamps to the last day of the year.
    pub fn locate(&self, elapsed: u32) -> (usize, u32) {
        let mut remaining = elapsed;
        for (index, month) in self.months.iter().enumerate() {
            if remaining < month.days() {
                return (index, remaining + 1);
            }
            remaining -= month.days();
        }
        let last = self.months.len() - 1;
        (last, self.months[last].days())
    }

    /// Weekday index of `day` in the month at `index`, `None` for a
    /// non-weekday.
    pub fn weekday_index(&self, index: usize, day: u32, cycle: usize) -> Option<usize> {
        let month = &self.months[index];
        if month.is_non_weekday(day) || cycle == 0 {
            return None;
        }
        let before: u64 = self.months[..index]
            .iter()
            .map(|m| m.weekday_count() as u64)
            .sum::<u64>()
            + month.weekdays_before(day) as u64;
        Some(((self.first_weekday_index as u64 + before) % cycle as u64) as usize)
    }
}
