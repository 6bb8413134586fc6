//! Detection results.

/// Anomalous positions found in a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomalies {
    /// Ascending, duplicate-free indices into the input series.
    indices: Vec<usize>,
    /// Length of the analysed series.
    series_len: usize,
}

impl Anomalies {
    /// Build a result from indices in any order; they are sorted and
    /// de-duplicated.
    pub(crate) fn new(mut indices: Vec<usize>, series_len: usize) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self {
            indices,
            series_len,
        }
    }

    /// Indices of detected anomalies, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Consume the result and return the indices.
    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    /// Number of anomalies detected.
    pub fn count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Check if a specific index is an anomaly.
    pub fn is_anomaly(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Share of the series flagged as anomalous, in percent.
    pub fn anomaly_percentage(&self) -> f64 {
        if self.series_len == 0 {
            0.0
        } else {
            100.0 * self.indices.len() as f64 / self.series_len as f64
        }
    }

    /// Vega-Lite chart of `series` with these anomalies drawn as points.
    pub fn vega_lite(&self, series: &[f64]) -> serde_json::Value {
        crate::plot::vega_lite(series, self)
    }
}

/// Outcome of a detection call that may be canceled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// The test ran to completion.
    Complete(Anomalies),
    /// Cancellation was observed; holds the anomalies confirmed before it.
    Canceled(Anomalies),
}

impl Detection {
    pub fn is_canceled(&self) -> bool {
        matches!(self, Detection::Canceled(_))
    }

    /// Anomalies found, whether or not the run completed.
    pub fn anomalies(&self) -> &Anomalies {
        match self {
            Detection::Complete(a) | Detection::Canceled(a) => a,
        }
    }

    /// The anomalies of a completed run, `None` if it was canceled.
    pub fn complete(self) -> Option<Anomalies> {
        match self {
            Detection::Complete(a) => Some(a),
            Detection::Canceled(_) => None,
        }
    }
}
