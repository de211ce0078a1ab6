//! Quota bounds on application slots
//!
//! A quota says how many documents of one type a slot requires before it
//! can be completed: at least `min`, at most `max`. The upper bound is a
//! sum type — either a fixed count or unbounded. The legacy configuration
//! format spelled "unbounded" as the literal string `"n"`; parsing and
//! display keep that spelling for interop.

use serde::{Deserialize, Serialize};

/// The upper bound of a quota
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaBound {
    /// At most this many documents
    Bounded(u32),
    /// No upper limit — the slot never auto-completes by quota alone
    Unbounded,
}

impl QuotaBound {
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl std::fmt::Display for QuotaBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bounded(max) => write!(f, "{}", max),
            Self::Unbounded => write!(f, "n"),
        }
    }
}

impl std::str::FromStr for QuotaBound {
    type Err = ParseQuotaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "n" {
            return Ok(Self::Unbounded);
        }
        s.trim()
            .parse::<u32>()
            .map(Self::Bounded)
            .map_err(|_| ParseQuotaError(s.to_string()))
    }
}

/// Error returned when a quota bound string is neither numeric nor `"n"`
#[derive(Debug, thiserror::Error)]
#[error("Invalid quota bound: {0:?} (expected a number or \"n\")")]
pub struct ParseQuotaError(pub String);

/// The min/max document-count requirement on a slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    /// Minimum number of approved documents before the slot may be
    /// completed manually
    pub min: u32,
    /// Upper bound; reaching it auto-completes the slot
    pub max: QuotaBound,
}

impl Quota {
    /// A quota with a fixed upper bound
    pub fn bounded(min: u32, max: u32) -> Self {
        Self {
            min,
            max: QuotaBound::Bounded(max),
        }
    }

    /// A quota with no upper bound
    pub fn unbounded(min: u32) -> Self {
        Self {
            min,
            max: QuotaBound::Unbounded,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max.is_unbounded()
    }

    /// Check the quota is internally consistent
    pub fn validate(&self) -> Result<(), String> {
        if let QuotaBound::Bounded(max) = self.max {
            if max < self.min {
                return Err(format!("quota max {} is below min {}", max, self.min));
            }
        }
        Ok(())
    }

    /// Whether one more document may be registered given the current count
    pub fn has_headroom(&self, amount: u32) -> bool {
        match self.max {
            QuotaBound::Bounded(max) => amount < max,
            QuotaBound::Unbounded => true,
        }
    }

    /// Whether the approved count satisfies the upper bound.
    /// Unbounded quotas are never satisfied by count alone.
    pub fn satisfied_by(&self, approved: u32) -> bool {
        match self.max {
            QuotaBound::Bounded(max) => approved >= max,
            QuotaBound::Unbounded => false,
        }
    }

    /// Whether the approved count meets the minimum
    pub fn meets_minimum(&self, approved: u32) -> bool {
        approved >= self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_quota() {
        let quota = Quota::bounded(1, 2);
        assert!(quota.validate().is_ok());
        assert!(quota.has_headroom(0));
        assert!(quota.has_headroom(1));
        assert!(!quota.has_headroom(2));
        assert!(!quota.satisfied_by(1));
        assert!(quota.satisfied_by(2));
        assert!(quota.meets_minimum(1));
        assert!(!quota.meets_minimum(0));
    }

    #[test]
    fn test_unbounded_quota() {
        let quota = Quota::unbounded(1);
        assert!(quota.validate().is_ok());
        assert!(quota.has_headroom(u32::MAX - 1));
        // No count ever satisfies an unbounded upper bound
        assert!(!quota.satisfied_by(1000));
        assert!(quota.meets_minimum(1));
    }

    #[test]
    fn test_invalid_quota() {
        let quota = Quota::bounded(3, 1);
        assert!(quota.validate().is_err());
    }

    #[test]
    fn test_parse_bound() {
        assert_eq!("2".parse::<QuotaBound>().unwrap(), QuotaBound::Bounded(2));
        assert_eq!("n".parse::<QuotaBound>().unwrap(), QuotaBound::Unbounded);
        assert!("maybe".parse::<QuotaBound>().is_err());
        assert!("-1".parse::<QuotaBound>().is_err());
    }

    #[test]
    fn test_bound_display_roundtrip() {
        for bound in [QuotaBound::Bounded(5), QuotaBound::Unbounded] {
            let text = bound.to_string();
            assert_eq!(text.parse::<QuotaBound>().unwrap(), bound);
        }
    }
}
