//! # anofox-anomaly
//!
//! Anomaly detection for univariate time series with the seasonal hybrid
//! ESD test.
//!
//! The series is deseasonalized with STL, centered on its median, and then a
//! generalized Extreme Studentized Deviate test repeatedly removes the most
//! extreme residual and compares it with a critical value from the Student's
//! t-distribution. The distribution functions the test needs are implemented
//! in [`distribution`].
//!
//! ```
//! use anofox_anomaly::prelude::*;
//!
//! let mut series: Vec<f64> = (0..100)
//!     .map(|i| [1.0, 3.0, 2.0, 5.0, 4.0][i % 5] + 0.1 * ((i * 7) % 3) as f64)
//!     .collect();
//! series[42] = 25.0;
//!
//! let anomalies = AnomalyDetector::new(5).detect(&series).unwrap();
//! assert_eq!(anomalies.indices(), &[42]);
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod detection;
pub mod distribution;
pub mod error;
pub mod plot;
pub mod seasonality;
pub mod utils;

pub use error::{AnomalyError, Result};

pub mod prelude {
    pub use crate::detection::{
        detect, AnomalyDetector, Anomalies, CancelToken, Cancellation, Detection,
        DetectionConfig, Direction,
    };
    pub use crate::error::{AnomalyError, Result};
    pub use crate::plot::{vega_lite, vega_lite_keyed};
    pub use crate::seasonality::{SeasonalDecomposer, StlDecomposer};
}
