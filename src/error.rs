//! Error types for the spectrum model and the analysis pipeline.

use thiserror::Error;

/// Failures of the core operations. None of them are transient: each one
/// reports a precondition the caller violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NirError {
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("PCA model has not been fitted, call run() first")]
    NotFitted,
}

impl NirError {
    /// Two sequences that must have the same length do not.
    pub(crate) fn length_mismatch(what: &str, expected: usize, found: usize) -> Self {
        NirError::DimensionMismatch(format!("{what}: expected {expected} values, got {found}"))
    }

    /// Two spectra that must share a wavelength axis do not.
    pub(crate) fn grid_mismatch(what: &str) -> Self {
        NirError::DimensionMismatch(format!("{what}: wavelength axes differ"))
    }

    pub(crate) fn invalid(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        NirError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, NirError>;
