//! Dimensionless scores with a fixed "ok" threshold.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Scalar score; a value of at least [`Score::OK_THRESHOLD`] is ok.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd, Default)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    /// Threshold at or above which a score is ok.
    pub const OK_THRESHOLD: f64 = 1.0;

    /// Score that is always ok.
    pub const PERFECT: Self = Self(1.0);

    /// Wrap a raw value; NaN collapses to zero.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_nan() { Self(0.0) } else { Self(value) }
    }

    /// Raw value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Whether the score meets the threshold.
    #[must_use]
    pub fn is_ok(self) -> bool {
        self.0 >= Self::OK_THRESHOLD
    }

    /// The larger of two scores.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if other.0 > self.0 { other } else { self }
    }
}

impl Display for Score {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let percent = format!("{:.1}", self.0 * 100.0);
        let percent = percent.strip_suffix(".0").unwrap_or(&percent);
        write!(formatter, "{percent}%")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_threshold_is_inclusive() {
        assert!(Score::new(1.0).is_ok());
        assert!(!Score::new(0.999).is_ok());
        assert!(Score::PERFECT.is_ok());
    }

    #[test]
    fn nan_is_not_ok() {
        assert!(!Score::new(f64::NAN).is_ok());
    }

    #[test]
    fn display_trims_whole_percentages() {
        assert_eq!(Score::new(1.0).to_string(), "100%");
        assert_eq!(Score::new(0.125).to_string(), "12.5%");
    }
}
