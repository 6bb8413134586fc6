//! Anomaly detection.
//!
//! Seasonal hybrid ESD: the series is deseasonalized and centered, then a
//! generalized ESD test with median/MAD statistics picks out the anomalies.
//!
//! - [`AnomalyDetector`]: builder front end
//! - [`detect`] / [`detect_with`]: function entry points
//! - [`Cancellation`]: cooperative early stop

mod cancel;
mod config;
mod detector;
mod esd;
mod result;

pub use cancel::{CancelToken, Cancellation, NeverCancel};
pub use config::{DetectionConfig, Direction};
pub use detector::{detect, detect_with, AnomalyDetector};
pub use result::{Anomalies, Detection};
