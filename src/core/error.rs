//! Error types for the analysis core

use thiserror::Error;

/// Errors surfaced to callers of the analysis pipeline
///
/// Degenerate data (no matches, zero areas) is never an error; it is reported
/// through zero values and low confidence in the result instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for AnalysisError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AnalysisError::Validation(errors.to_string())
    }
}

/// A coordinate pair that cannot be used for distance computation
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinate is not a finite number: ({0}, {1})")]
    NotFinite(f64, f64),

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}
