//! STL (Seasonal-Trend decomposition using LOESS) implementation.
//!
//! STL decomposes a time series into three components:
//! - Trend: The underlying long-term pattern
//! - Seasonal: The repeating seasonal pattern
//! - Remainder: The residual after removing trend and seasonal
//!
//! Cleveland, R. B., Cleveland, W. S., McRae, J. E., & Terpenning, I.
//! (1990). STL: A seasonal-trend decomposition procedure based on loess.
//! Journal of Official Statistics, 6(1), 3-73.

use crate::error::{AnomalyError, Result};
use crate::utils::stats::median;

/// Result of STL decomposition.
#[derive(Debug, Clone)]
pub struct STLResult {
    /// Trend component.
    pub trend: Vec<f64>,
    /// Seasonal component.
    pub seasonal: Vec<f64>,
    /// Remainder component.
    pub remainder: Vec<f64>,
    /// Robustness weights of the final pass (all ones without robust fitting).
    pub weights: Vec<f64>,
}

/// STL decomposition configuration and algorithm.
///
/// The seasonal component is fitted with local constants, trend and
/// low-pass with local lines.
#[derive(Debug, Clone)]
pub struct STL {
    /// Seasonal period (np).
    period: usize,
    /// Seasonal LOESS window (ns).
    seasonal_window: usize,
    /// Trend LOESS window (nt), derived from ns and np when unset.
    trend_window: Option<usize>,
    /// Low-pass LOESS window (nl), derived from np when unset.
    low_pass_window: Option<usize>,
    /// Inner iterations (ni), 2 or 1 with robust fitting when unset.
    inner_iterations: Option<usize>,
    /// Outer robustness iterations (no), 0 or 15 with robust fitting when unset.
    outer_iterations: Option<usize>,
    robust: bool,
}

impl STL {
    /// Create a new STL decomposer with the given seasonal period (at
    /// least 2).
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(2),
            seasonal_window: 7,
            trend_window: None,
            low_pass_window: None,
            inner_iterations: None,
            outer_iterations: None,
            robust: false,
        }
    }

    /// Set the seasonal LOESS window (ns). Even values are bumped to the
    /// next odd number; the minimum is 3.
    pub fn with_seasonal_window(mut self, ns: usize) -> Self {
        self.seasonal_window = odd(ns.max(3));
        self
    }

    /// Set the trend LOESS window (nt).
    pub fn with_trend_window(mut self, nt: usize) -> Self {
        self.trend_window = Some(odd(nt.max(3)));
        self
    }

    /// Set the low-pass LOESS window (nl).
    pub fn with_low_pass_window(mut self, nl: usize) -> Self {
        self.low_pass_window = Some(odd(nl.max(3)));
        self
    }

    /// Enable robust fitting.
    pub fn robust(mut self) -> Self {
        self.robust = true;
        self
    }

    /// Set number of outer (robustness) iterations.
    pub fn with_outer_iterations(mut self, n: usize) -> Self {
        self.outer_iterations = Some(n);
        self
    }

    /// Set number of inner iterations.
    pub fn with_inner_iterations(mut self, n: usize) -> Self {
        self.inner_iterations = Some(n.max(1));
        self
    }

    /// Seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Whether robustness weights are fitted.
    pub fn is_robust(&self) -> bool {
        self.robust
    }

    pub fn seasonal_window(&self) -> usize {
        self.seasonal_window
    }

    /// Trend window in effect: `ceil(1.5 np / (1 - 1.5 / ns))`, made odd.
    pub fn trend_window(&self) -> usize {
        self.trend_window.unwrap_or_else(|| {
            let np = self.period as f64;
            let ns = self.seasonal_window as f64;
            odd((1.5 * np / (1.0 - 1.5 / ns)).ceil() as usize)
        })
    }

    /// Low-pass window in effect: the smallest odd number >= np.
    pub fn low_pass_window(&self) -> usize {
        self.low_pass_window.unwrap_or(odd(self.period))
    }

    fn inner(&self) -> usize {
        self.inner_iterations
            .unwrap_or(if self.robust { 1 } else { 2 })
    }

    fn outer(&self) -> usize {
        if !self.robust {
            return 0;
        }
        self.outer_iterations.unwrap_or(15)
    }

    /// Decompose the time series.
    pub fn decompose(&self, series: &[f64]) -> Result<STLResult> {
        let n = series.len();
        let needed = self.period.saturating_mul(2);
        if n < needed {
            return Err(AnomalyError::InsufficientData { needed, got: n });
        }

        let mut seasonal = vec![0.0; n];
        let mut trend = vec![0.0; n];
        let mut weights = vec![1.0; n];
        let mut use_weights = false;

        let outer = self.outer();
        for pass in 0..=outer {
            for _ in 0..self.inner() {
                self.inner_step(series, &mut seasonal, &mut trend, use_weights.then_some(&weights[..]));
            }

            if pass < outer {
                let fit: Vec<f64> = trend.iter().zip(&seasonal).map(|(t, s)| t + s).collect();
                weights = robustness_weights(series, &fit);
                use_weights = true;
            }
        }

        let remainder = series
            .iter()
            .zip(seasonal.iter())
            .zip(trend.iter())
            .map(|((y, s), t)| y - s - t)
            .collect();
        if outer == 0 {
            weights = vec![1.0; n];
        }

        Ok(STLResult {
            trend,
            seasonal,
            remainder,
            weights,
        })
    }

    /// One inner loop pass: update the seasonal component from the current
    /// trend, then the trend from the deseasonalized series.
    fn inner_step(
        &self,
        series: &[f64],
        seasonal: &mut [f64],
        trend: &mut Vec<f64>,
        weights: Option<&[f64]>,
    ) {
        let np = self.period;

        // Step 1: Detrending
        let detrended: Vec<f64> = series.iter().zip(trend.iter()).map(|(y, t)| y - t).collect();

        // Step 2: Cycle-subseries smoothing, one period longer at each end
        let cycle = self.smooth_cycle_subseries(&detrended, weights);

        // Step 3: Low-pass filtering of the smoothed cycle-subseries
        let low_pass = moving_average(&cycle, np);
        let low_pass = moving_average(&low_pass, np);
        let low_pass = moving_average(&low_pass, 3);
        let low_pass = loess_smooth(&low_pass, self.low_pass_window(), 1, None);

        // Step 4: Detrending of smoothed cycle-subseries
        for (i, s) in seasonal.iter_mut().enumerate() {
            *s = cycle[np + i] - low_pass[i];
        }

        // Step 5-6: Deseasonalizing and trend smoothing
        let deseasonalized: Vec<f64> = series
            .iter()
            .zip(seasonal.iter())
            .map(|(y, s)| y - s)
            .collect();
        *trend = loess_smooth(&deseasonalized, self.trend_window(), 1, weights);
    }

    /// Smooth each cycle-subseries and extend it by one value before the
    /// first and after the last observation. Returns `n + 2 * period` values.
    fn smooth_cycle_subseries(&self, detrended: &[f64], weights: Option<&[f64]>) -> Vec<f64> {
        let n = detrended.len();
        let np = self.period;
        let ns = self.seasonal_window;
        let mut cycle = vec![0.0; n + 2 * np];

        for j in 0..np {
            let positions: Vec<usize> = (j..n).step_by(np).collect();
            let values: Vec<f64> = positions.iter().map(|&i| detrended[i]).collect();
            let sub_weights: Option<Vec<f64>> =
                weights.map(|w| positions.iter().map(|&i| w[i]).collect());
            let sub_weights = sub_weights.as_deref();
            let k = values.len();

            let smoothed = loess_smooth(&values, ns, 0, sub_weights);

            let before = loess_fit(&values, ns, 0, -1.0, 0, ns.min(k) - 1, sub_weights)
                .unwrap_or(smoothed[0]);
            let after = loess_fit(&values, ns, 0, k as f64, k.saturating_sub(ns), k - 1, sub_weights)
                .unwrap_or(smoothed[k - 1]);

            cycle[j] = before;
            for (m, &s) in smoothed.iter().enumerate() {
                cycle[(m + 1) * np + j] = s;
            }
            cycle[(k + 1) * np + j] = after;
        }

        cycle
    }
}

impl Default for STL {
    fn default() -> Self {
        Self::new(7)
    }
}

fn odd(n: usize) -> usize {
    n | 1
}

/// Moving average over every full window; the output is `window - 1`
/// values shorter than the input.
fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    series
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// LOESS smoothing of a whole series with a sliding window of `span`
/// neighbours.
fn loess_smooth(values: &[f64], span: usize, degree: usize, weights: Option<&[f64]>) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return values.to_vec();
    }

    if span >= n {
        return (0..n)
            .map(|i| loess_fit(values, span, degree, i as f64, 0, n - 1, weights).unwrap_or(values[i]))
            .collect();
    }

    let half = span.div_ceil(2);
    let mut left = 0;
    let mut right = span - 1;
    (0..n)
        .map(|i| {
            if i + 1 > half && right != n - 1 {
                left += 1;
                right += 1;
            }
            loess_fit(values, span, degree, i as f64, left, right, weights).unwrap_or(values[i])
        })
        .collect()
}

/// Local fit of degree 0 or 1 at position `x` using the observations in
/// `left..=right` with tricube distance weights.
///
/// Returns `None` when every weight in the window is zero.
fn loess_fit(
    values: &[f64],
    span: usize,
    degree: usize,
    x: f64,
    left: usize,
    right: usize,
    weights: Option<&[f64]>,
) -> Option<f64> {
    let n = values.len();
    let mut h = (x - left as f64).max(right as f64 - x);
    if span > n {
        h += ((span - n) / 2) as f64;
    }
    let h9 = 0.999 * h;
    let h1 = 0.001 * h;

    let mut w = vec![0.0; right - left + 1];
    let mut total = 0.0;
    for (k, j) in (left..=right).enumerate() {
        let r = (j as f64 - x).abs();
        if r <= h9 {
            w[k] = if r <= h1 {
                1.0
            } else {
                (1.0 - (r / h).powi(3)).powi(3)
            };
            if let Some(rw) = weights {
                w[k] *= rw[j];
            }
            total += w[k];
        }
    }
    if total <= 0.0 {
        return None;
    }

    for wk in w.iter_mut() {
        *wk /= total;
    }

    if h > 0.0 && degree > 0 {
        let center: f64 = (left..=right).zip(&w).map(|(j, wk)| wk * j as f64).sum();
        let spread: f64 = (left..=right)
            .zip(&w)
            .map(|(j, wk)| wk * (j as f64 - center).powi(2))
            .sum();
        let range = n as f64 - 1.0;
        if spread.sqrt() > 0.001 * range {
            let slope = (x - center) / spread;
            for (j, wk) in (left..=right).zip(w.iter_mut()) {
                *wk *= slope * (j as f64 - center) + 1.0;
            }
        }
    }

    Some((left..=right).zip(&w).map(|(j, wk)| wk * values[j]).sum())
}

/// Bisquare weights of the residuals `series - fit`, scaled by six times
/// their median absolute value.
fn robustness_weights(series: &[f64], fit: &[f64]) -> Vec<f64> {
    let residuals: Vec<f64> = series.iter().zip(fit).map(|(y, f)| (y - f).abs()).collect();
    let cmad = 6.0 * median(&residuals);
    let c9 = 0.999 * cmad;
    let c1 = 0.001 * cmad;

    residuals
        .iter()
        .map(|&r| {
            if r <= c1 {
                1.0
            } else if r <= c9 {
                (1.0 - (r / cmad).powi(2)).powi(2)
            } else {
                0.0
            }
        })
        .collect()
}
