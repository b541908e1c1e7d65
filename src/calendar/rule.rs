//! Intercalary rules: predicates over year numbers.
//!
//! A rule matches every `divisor`-th year counted from `offset`, minus any
//! year matched by one of its exceptions, restricted to years matched by all
//! of its AND conditions, plus any year matched by one of its OR conditions.

use serde::{Deserialize, Serialize};

use super::error::CalendarError;

/// A recursive year predicate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntercalaryRule {
    pub offset: i64,
    pub divisor: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<IntercalaryRule>,
    #[serde(default, rename = "ands", skip_serializing_if = "Vec::is_empty")]
    pub and_conditions: Vec<IntercalaryRule>,
    #[serde(default, rename = "ors", skip_serializing_if = "Vec::is_empty")]
    pub or_conditions: Vec<IntercalaryRule>,
}

impl IntercalaryRule {
    pub fn new(divisor: i64, offset: i64) -> Result<Self, CalendarError> {
        if divisor == 0 {
            return Err(CalendarError::ZeroDivisor { offset });
        }
        Ok(Self {
            offset,
            divisor,
            exceptions: Vec::new(),
            and_conditions: Vec::new(),
            or_conditions: Vec::new(),
        })
    }

    /// A rule that matches every year.
    pub fn always() -> Self {
        Self {
            offset: 0,
            divisor: 1,
            exceptions: Vec::new(),
            and_conditions: Vec::new(),
            or_conditions: Vec::new(),
        }
    }

    pub fn with_exception(mut self, rule: IntercalaryRule) -> Self {
        self.exceptions.push(rule);
        self
    }

    pub fn with_and(mut self, rule: IntercalaryRule) -> Self {
        self.and_conditions.push(rule);
        self
    }

    pub fn with_or(mut self, rule: IntercalaryRule) -> Self {
        self.or_conditions.push(rule);
        self
    }

    /// Check this rule and every sub-rule for a zero divisor.
    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.divisor == 0 {
            return Err(CalendarError::ZeroDivisor {
                offset: self.offset,
            });
        }
        self.sub_rules().try_for_each(|rule| rule.validate())
    }

    /// Whether the rule selects the given year.
    ///
    /// The modulus is euclidean, so negative years behave the same as
    /// positive ones.
    pub fn matches(&self, year: i64) -> bool {
        let base = (year - self.offset).rem_euclid(self.divisor) == 0;
        let excepted = self.exceptions.iter().any(|r| r.matches(year));
        let anded = self.and_conditions.iter().all(|r| r.matches(year));
        (base && !excepted && anded) || self.or_conditions.iter().any(|r| r.matches(year))
    }

    /// Least common multiple of every divisor in the tree.
    ///
    /// `matches(y) == matches(y + period)` for every year. Returns `None` when
    /// the period would exceed `limit`.
    pub fn period(&self, limit: u64) -> Option<u64> {
        let mut acc = self.divisor.unsigned_abs();
        if acc > limit {
            return None;
        }
        for rule in self.sub_rules() {
            acc = lcm(acc, rule.period(limit)?);
            if acc > limit {
                return None;
            }
        }
        Some(acc)
    }

    fn sub_rules(&self) -> impl Iterator<Item = &IntercalaryRule> {
        self.exceptions
            .iter()
            .chain(self.and_conditions.iter())
            .chain(self.or_conditions.iter())
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Least common multiple, saturating on overflow.
pub(crate) fn lcm(a: u64, b: u64) -> u64 {
    if a == 0 || b == 0 {
        return 0;
    }
    (a / gcd(a, b)).saturating_mul(b)
}
