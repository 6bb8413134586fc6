//! Seasonal decomposition.
//!
//! The detector only needs the seasonal component of a series. Anything that
//! can produce one plugs in through [`SeasonalDecomposer`]; [`StlDecomposer`]
//! is the default and runs the LOESS based [`STL`].

mod stl;

pub use stl::{STLResult, STL};

use crate::error::Result;

/// Produces the seasonal component of a series.
pub trait SeasonalDecomposer {
    /// Return a seasonal component aligned index-for-index with `series`.
    fn seasonal(
        &self,
        series: &[f64],
        period: usize,
        robust: bool,
        seasonal_window: usize,
    ) -> Result<Vec<f64>>;
}

/// [`SeasonalDecomposer`] backed by [`STL`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StlDecomposer;

impl SeasonalDecomposer for StlDecomposer {
    fn seasonal(
        &self,
        series: &[f64],
        period: usize,
        robust: bool,
        seasonal_window: usize,
    ) -> Result<Vec<f64>> {
        let stl = STL::new(period).with_seasonal_window(seasonal_window);
        let stl = if robust { stl.robust() } else { stl };
        Ok(stl.decompose(series)?.seasonal)
    }
}

impl<D: SeasonalDecomposer + ?Sized> SeasonalDecomposer for &D {
    fn seasonal(
        &self,
        series: &[f64],
        period: usize,
        robust: bool,
        seasonal_window: usize,
    ) -> Result<Vec<f64>> {
        (**self).seasonal(series, period, robust, seasonal_window)
    }
}
