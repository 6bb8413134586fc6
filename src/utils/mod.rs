//! Utility functions shared by the detector.

pub mod stats;

pub use stats::{mad, median, median_sorted, MAD_SCALE};
