//! Order statistics used by the ESD test.

use std::cmp::Ordering;

/// Scale factor making the MAD a consistent estimator of the standard
/// deviation for normally distributed data.
pub const MAD_SCALE: f64 = 1.4826;

/// Calculate the median of a slice.
///
/// The two middle elements of the sorted sample are averaged, which for an
/// odd length is the middle element itself.
///
/// # Example
/// ```
/// use anofox_anomaly::utils::median;
///
/// assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
/// assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
/// ```
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sort_values(&mut sorted);
    median_sorted(&sorted)
}

/// Median of a slice that is already sorted in ascending order.
pub fn median_sorted(sorted: &[f64]) -> f64 {
    let m = sorted.len();
    if m == 0 {
        return f64::NAN;
    }
    (sorted[(m - 1) / 2] + sorted[m / 2]) / 2.0
}

/// Median absolute deviation from `center`, scaled by [`MAD_SCALE`].
///
/// Returns exactly zero when every value equals `center`.
pub fn mad(values: &[f64], center: f64) -> f64 {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    MAD_SCALE * median(&deviations)
}

/// Stable ascending sort of a sample. NaN compares equal to everything.
pub(crate) fn sort_values(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}
