//! Secondary trigger: the integers in a message add up to a target.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

static NUMBER_RE: OnceLock<Regex> = OnceLock::new();

fn number_regex() -> &'static Regex {
    NUMBER_RE.get_or_init(|| {
        Regex::new(r"-?\d+")
            .unwrap_or_else(|error| panic!("number regex failed to compile: {error}"))
    })
}

/// Integers appearing in `text`, in order, with an optional leading minus.
/// Runs of digits too long for `i64` are skipped.
pub fn find_numbers(text: &str) -> Vec<i64> {
    number_regex()
        .find_iter(text)
        .filter_map(|found| found.as_str().parse::<i64>().ok())
        .collect()
}

/// A set of terms that summed to the configured target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericSum {
    terms: Vec<i64>,
    total: i64,
}

impl NumericSum {
    /// Terms in message order.
    pub fn terms(&self) -> &[i64] {
        &self.terms
    }

    /// Their sum.
    pub fn total(&self) -> i64 {
        self.total
    }
}

impl fmt::Display for NumericSum {
    /// Renders `3 + 7 = 10`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms = self
            .terms
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(" + ");
        write!(f, "{terms} = {}", self.total)
    }
}

/// Configured numeric target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericTarget(i64);

impl NumericTarget {
    /// Wrap the configured target value.
    pub const fn new(target: i64) -> Self {
        Self(target)
    }

    /// The target value.
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Check whether the integers in `text` sum to the target. A message
    /// without integers never matches, nor does a sum that overflows.
    ///
    /// # Examples
    /// ```
    /// use acrostic::domain::NumericTarget;
    ///
    /// let sum = NumericTarget::new(10).check("3 and 7 make it").expect("sums to 10");
    /// assert_eq!(sum.to_string(), "3 + 7 = 10");
    /// assert!(NumericTarget::new(10).check("3 and 8").is_none());
    /// ```
    pub fn check(self, text: &str) -> Option<NumericSum> {
        let terms = find_numbers(text);
        if terms.is_empty() {
            return None;
        }
        let total = terms
            .iter()
            .try_fold(0_i64, |acc, &term| acc.checked_add(term))?;
        (total == self.0).then_some(NumericSum { terms, total })
    }
}
