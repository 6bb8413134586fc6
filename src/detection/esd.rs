//! Generalized ESD test on a residual series.
//!
//! Rosner, B. (1983). Percentage points for a generalized ESD many-outlier
//! procedure. Technometrics, 25(2), 165-172. The center and scale are the
//! median and MAD of the remaining sample rather than mean and standard
//! deviation, as in Twitter's Seasonal Hybrid ESD.

use std::cmp::Ordering;

use tracing::{debug, info, trace};

use super::cancel::Cancellation;
use super::config::Direction;
use crate::distribution::students_t_ppf;
use crate::utils::stats::{mad, median_sorted};

/// Outcome of the ESD loop, positions refer to the residual slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EsdOutcome {
    Complete(Vec<usize>),
    Canceled(Vec<usize>),
}

/// Residuals sorted ascending together with their original positions.
///
/// `values[i]` is the residual at position `indices[i]` of the input; both
/// vectors always have the same length.
struct WorkingSet {
    values: Vec<f64>,
    indices: Vec<usize>,
}

impl WorkingSet {
    fn new(residuals: &[f64]) -> Self {
        let mut indices: Vec<usize> = (0..residuals.len()).collect();
        // stable, so ties keep their original order
        indices.sort_by(|&a, &b| {
            residuals[a]
                .partial_cmp(&residuals[b])
                .unwrap_or(Ordering::Equal)
        });
        let values = indices.iter().map(|&i| residuals[i]).collect();
        Self { values, indices }
    }

    /// Remove the element at `pos`, keeping the rest sorted, and return its
    /// original position.
    fn remove(&mut self, pos: usize) -> usize {
        self.values.remove(pos);
        self.indices.remove(pos)
    }
}

/// Critical value for the `i`-th test on a sample of original size `n`.
///
/// NaN when the t quantile is undefined, e.g. fewer than one degree of
/// freedom remains.
pub(crate) fn critical_value(n: usize, i: usize, alpha: f64, direction: Direction) -> f64 {
    let remaining = (n - i) as f64;
    let p = if direction.is_one_tailed() {
        1.0 - alpha / (remaining + 1.0)
    } else {
        1.0 - alpha / (2.0 * (remaining + 1.0))
    };

    let df = remaining - 1.0;
    let t = students_t_ppf(p, df);
    t * remaining / ((df + t * t) * (remaining + 1.0)).sqrt()
}

/// Run up to `max_outliers` rounds of the test.
///
/// Every round removes the most extreme remaining residual; the result is
/// the removals up to the last round whose statistic exceeded its critical
/// value. Stops early when the remaining sample has zero MAD or the critical
/// value is undefined.
pub(crate) fn generalized_esd(
    residuals: &[f64],
    max_outliers: usize,
    alpha: f64,
    direction: Direction,
    verbose: bool,
    cancel: &dyn Cancellation,
) -> EsdOutcome {
    let n = residuals.len();
    let max_outliers = max_outliers.min(n);

    let mut working = WorkingSet::new(residuals);
    let mut removed = Vec::with_capacity(max_outliers);
    let mut num_anoms = 0;

    for i in 1..=max_outliers {
        if cancel.is_canceled() {
            debug!(iteration = i, confirmed = num_anoms, "ESD canceled");
            return EsdOutcome::Canceled(removed[..num_anoms].to_vec());
        }

        if verbose {
            info!("{} / {}", i, max_outliers);
        } else {
            trace!("{} / {}", i, max_outliers);
        }

        let ma = median_sorted(&working.values);
        let sigma = mad(&working.values, ma);
        if sigma == 0.0 {
            debug!(iteration = i, "remaining residuals have zero MAD, stopping");
            break;
        }

        let (pos, deviation) = most_extreme(&working.values, ma, direction);
        let r = deviation / sigma;
        removed.push(working.remove(pos));

        let lambda = critical_value(n, i, alpha, direction);
        if lambda.is_nan() {
            debug!(iteration = i, "critical value undefined, stopping");
            break;
        }

        if r > lambda {
            num_anoms = i;
        }
        trace!(iteration = i, r, lambda, num_anoms, "ESD step");
    }

    removed.truncate(num_anoms);
    EsdOutcome::Complete(removed)
}

/// Position and test value of the first maximal deviation from `ma`.
fn most_extreme(values: &[f64], ma: f64, direction: Direction) -> (usize, f64) {
    let mut best = (0, direction.deviation(values[0], ma));
    for (pos, &value) in values.iter().enumerate().skip(1) {
        let deviation = direction.deviation(value, ma);
        if deviation > best.1 {
            best = (pos, deviation);
        }
    }
    best
}
