//! Error types for the anofox-anomaly library.

use thiserror::Error;

/// Result type alias for anomaly detection operations.
pub type Result<T> = std::result::Result<T, AnomalyError>;

/// Errors that can occur during anomaly detection.
///
/// Cancellation is not an error; see [`crate::detection::Detection::Canceled`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnomalyError {
    /// The series contains a value the detector cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Fewer observations than two full periods.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A detection parameter is out of range or unrecognized.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The seasonal decomposition collaborator failed.
    #[error("decomposition failed: {0}")]
    Decomposition(String),
}
