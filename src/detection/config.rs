//! Detection parameters.

use std::fmt;
use std::str::FromStr;

use crate::error::{AnomalyError, Result};

/// Which deviations from the center count as anomalies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Only values above the center (one-tailed, upper).
    Positive,
    /// Only values below the center (one-tailed, lower).
    Negative,
    /// Both sides (two-tailed).
    #[default]
    Both,
}

impl Direction {
    /// Whether the test uses a single tail of the t-distribution.
    pub fn is_one_tailed(self) -> bool {
        !matches!(self, Direction::Both)
    }

    /// Test value of a residual relative to the center `ma`.
    pub(crate) fn deviation(self, value: f64, ma: f64) -> f64 {
        match self {
            Direction::Positive => value - ma,
            Direction::Negative => ma - value,
            Direction::Both => (value - ma).abs(),
        }
    }
}

impl FromStr for Direction {
    type Err = AnomalyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pos" => Ok(Direction::Positive),
            "neg" => Ok(Direction::Negative),
            "both" => Ok(Direction::Both),
            _ => Err(AnomalyError::InvalidConfiguration(
                "direction must be pos, neg, or both".to_string(),
            )),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Positive => "pos",
            Direction::Negative => "neg",
            Direction::Both => "both",
        };
        f.write_str(s)
    }
}

/// Configuration for seasonal hybrid ESD detection.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Significance level of each test, in (0, 1].
    pub alpha: f64,
    /// Upper bound on the fraction of the series reported as anomalous, in (0, 1].
    pub max_anoms: f64,
    /// Which side(s) of the center to test.
    pub direction: Direction,
    /// Log per-iteration progress at `info` level.
    pub verbose: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            max_anoms: 0.1,
            direction: Direction::Both,
            verbose: false,
        }
    }
}

impl DetectionConfig {
    /// Set the significance level.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the maximum fraction of anomalies.
    pub fn with_max_anoms(mut self, max_anoms: f64) -> Self {
        self.max_anoms = max_anoms;
        self
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Enable or disable progress logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check that `alpha` and `max_anoms` lie in (0, 1].
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(AnomalyError::InvalidConfiguration(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if !(self.max_anoms > 0.0 && self.max_anoms <= 1.0) {
            return Err(AnomalyError::InvalidConfiguration(format!(
                "max_anoms must be in (0, 1], got {}",
                self.max_anoms
            )));
        }
        Ok(())
    }

    /// Largest number of anomalies the test may report for a series of
    /// length `n`.
    pub fn max_outliers(&self, n: usize) -> usize {
        (n as f64 * self.max_anoms).floor() as usize
    }
}
