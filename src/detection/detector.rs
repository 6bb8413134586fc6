//! Seasonal hybrid ESD detector.

use std::collections::BTreeMap;

use tracing::debug;

use super::cancel::{Cancellation, NeverCancel};
use super::config::{DetectionConfig, Direction};
use super::esd::{generalized_esd, EsdOutcome};
use super::result::{Anomalies, Detection};
use crate::error::{AnomalyError, Result};
use crate::seasonality::{SeasonalDecomposer, StlDecomposer};
use crate::utils::stats::median;

/// Detect anomalies in `series` with seasonal period `period`.
///
/// The median and the seasonal component (when `period > 1`) are removed
/// before the ESD test runs on what is left. `cancel` is polled once per
/// test round.
pub fn detect(
    series: &[f64],
    period: usize,
    config: &DetectionConfig,
    cancel: &dyn Cancellation,
) -> Result<Detection> {
    detect_with(series, period, config, &StlDecomposer, cancel)
}

/// Like [`detect`] with a caller-supplied seasonal decomposition.
pub fn detect_with(
    series: &[f64],
    period: usize,
    config: &DetectionConfig,
    decomposer: &dyn SeasonalDecomposer,
    cancel: &dyn Cancellation,
) -> Result<Detection> {
    config.validate()?;

    let n = series.len();
    let needed = period.saturating_mul(2);
    if n < needed {
        return Err(AnomalyError::InsufficientData { needed, got: n });
    }
    if let Some(i) = series.iter().position(|v| !v.is_finite()) {
        let what = if series[i].is_nan() { "NANs" } else { "infinite values" };
        return Err(AnomalyError::InvalidInput(format!(
            "series contains {} (first at index {})",
            what, i
        )));
    }

    let max_outliers = config.max_outliers(n);
    if max_outliers == 0 {
        return Err(AnomalyError::InvalidConfiguration(format!(
            "max_anoms {} allows no anomalies in a series of length {}",
            config.max_anoms, n
        )));
    }

    let residuals = residuals(series, period, decomposer)?;
    debug!(
        n,
        period,
        max_outliers,
        alpha = config.alpha,
        direction = %config.direction,
        "running ESD"
    );

    let outcome = generalized_esd(
        &residuals,
        max_outliers,
        config.alpha,
        config.direction,
        config.verbose,
        cancel,
    );
    Ok(match outcome {
        EsdOutcome::Complete(found) => Detection::Complete(Anomalies::new(found, n)),
        EsdOutcome::Canceled(found) => Detection::Canceled(Anomalies::new(found, n)),
    })
}

/// `series - seasonal - median(series)`.
fn residuals(
    series: &[f64],
    period: usize,
    decomposer: &dyn SeasonalDecomposer,
) -> Result<Vec<f64>> {
    let n = series.len();
    let med = median(series);

    if period <= 1 {
        return Ok(series.iter().map(|v| v - med).collect());
    }

    let seasonal = decomposer.seasonal(series, period, true, 10 * n + 1)?;
    if seasonal.len() != n {
        return Err(AnomalyError::Decomposition(format!(
            "seasonal length {}, expected {}",
            seasonal.len(),
            n
        )));
    }
    if seasonal.iter().any(|s| !s.is_finite()) {
        return Err(AnomalyError::Decomposition(
            "seasonal component is not finite".to_string(),
        ));
    }

    Ok(series
        .iter()
        .zip(seasonal.iter())
        .map(|(v, s)| v - s - med)
        .collect())
}

/// Builder front end for [`detect_with`].
///
/// # Example
/// ```
/// use anofox_anomaly::detection::{AnomalyDetector, Direction};
///
/// let mut series: Vec<f64> = (0..60).map(|i| (i % 7) as f64 + 0.1 * (i % 3) as f64).collect();
/// series[20] = 40.0;
///
/// let anomalies = AnomalyDetector::new(7)
///     .max_anoms(0.1)
///     .direction(Direction::Positive)
///     .detect(&series)
///     .unwrap();
/// assert!(anomalies.is_anomaly(20));
/// ```
#[derive(Debug, Clone)]
pub struct AnomalyDetector<D = StlDecomposer> {
    period: usize,
    config: DetectionConfig,
    decomposer: D,
}

impl AnomalyDetector<StlDecomposer> {
    /// Detector for series with the given seasonal period; 1 disables
    /// seasonal adjustment.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            config: DetectionConfig::default(),
            decomposer: StlDecomposer,
        }
    }
}

impl<D: SeasonalDecomposer> AnomalyDetector<D> {
    /// Replace the seasonal decomposition.
    pub fn with_decomposer<E: SeasonalDecomposer>(self, decomposer: E) -> AnomalyDetector<E> {
        AnomalyDetector {
            period: self.period,
            config: self.config,
            decomposer,
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: DetectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_anoms(mut self, max_anoms: f64) -> Self {
        self.config.max_anoms = max_anoms;
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.config.direction = direction;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Run to completion.
    pub fn detect(&self, series: &[f64]) -> Result<Anomalies> {
        match self.detect_with_cancel(series, &NeverCancel)? {
            Detection::Complete(anomalies) | Detection::Canceled(anomalies) => Ok(anomalies),
        }
    }

    /// Run, polling `cancel` once per test round.
    pub fn detect_with_cancel(
        &self,
        series: &[f64],
        cancel: &dyn Cancellation,
    ) -> Result<Detection> {
        detect_with(series, self.period, &self.config, &self.decomposer, cancel)
    }

    /// Run on values keyed by time (or any ordered key) and return the
    /// anomalous keys in ascending order.
    pub fn detect_keyed<K: Ord + Clone>(&self, series: &BTreeMap<K, f64>) -> Result<Vec<K>> {
        let keys: Vec<&K> = series.keys().collect();
        let values: Vec<f64> = series.values().copied().collect();
        let anomalies = self.detect(&values)?;
        Ok(anomalies
            .indices()
            .iter()
            .map(|&i| keys[i].clone())
            .collect())
    }
}
