//! Error types for SMA dispatch.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, SmaError>;

/// Errors surfaced by [`crate::SmaEngine`] and its backends.
#[derive(Debug, Error)]
pub enum SmaError {
    /// Window size was zero or negative.
    #[error("Invalid window size: {0} (must be > 0)")]
    InvalidWindow(i64),

    /// Output buffer does not have the same length as the input.
    #[error("Input and output arrays must have the same size: input={input}, output={output}")]
    LengthMismatch {
        /// Input length.
        input: usize,
        /// Output length.
        output: usize,
    },

    /// The compute device could not be acquired.
    #[error("Compute resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Kernel launch or device transfer failed after dispatch.
    #[error("Kernel launch failed: {0}")]
    Launch(String),

    /// Malformed engine configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SmaError {
    /// True for caller mistakes detected before any work is dispatched.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidWindow(_) | Self::LengthMismatch { .. })
    }

    /// True when a CPU path may recover the call.
    #[must_use]
    pub fn is_resource_unavailable(&self) -> bool {
        matches!(self, Self::ResourceUnavailable(_))
    }
}

impl From<serde_json::Error> for SmaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(feature = "cuda")]
impl From<cust::error::CudaError> for SmaError {
    fn from(err: cust::error::CudaError) -> Self {
        crate::backend::cuda::classify(err)
    }
}

#[cfg(feature = "python")]
impl From<SmaError> for pyo3::PyErr {
    fn from(err: SmaError) -> Self {
        use pyo3::exceptions::{PyRuntimeError, PyValueError};
        match err {
            SmaError::InvalidWindow(_) | SmaError::LengthMismatch { .. } | SmaError::Config(_) => {
                PyValueError::new_err(err.to_string())
            }
            SmaError::ResourceUnavailable(_) | SmaError::Launch(_) => {
                PyRuntimeError::new_err(err.to_string())
            }
        }
    }
}
