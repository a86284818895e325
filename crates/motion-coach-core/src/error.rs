//! Error types for the motion comparison engine.
//!
//! All fallible operations in the workspace bottom out in [`CoreError`],
//! with [`AlignmentError`] covering the dynamic-time-warping subsystem.
//!
//! # Example
//!
//! ```rust
//! use motion_coach_core::error::{AlignmentError, CoreError};
//!
//! fn run_alignment() -> Result<(), CoreError> {
//!     Err(AlignmentError::InfeasibleWindow { window: 3, required: 10 }.into())
//! }
//! ```

use thiserror::Error;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Top-level error type for the motion comparison engine.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// Temporal alignment error
    #[error("Alignment error: {0}")]
    Alignment(#[from] AlignmentError),

    /// Validation error for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what validation failed
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
    },
}

impl CoreError {
    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if retrying the operation may succeed without
    /// changing inputs or configuration.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Alignment(e) => e.is_recoverable(),
            Self::Validation { .. } | Self::Configuration { .. } => false,
        }
    }
}

/// Errors produced by the alignment engine.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AlignmentError {
    /// The two feature matrices do not share a feature dimension
    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Feature dimension of the reference matrix
        expected: usize,
        /// Feature dimension of the other matrix
        actual: usize,
    },

    /// The Sakoe-Chiba band is narrower than the length difference of the
    /// two sequences, so no monotone path fits inside it
    #[error("Window {window} narrower than sequence length difference {required}")]
    InfeasibleWindow {
        /// Configured band half-width
        window: usize,
        /// Minimum feasible half-width, `|n - m|`
        required: usize,
    },

    /// The caller's cancellation flag was raised during the grid fill
    #[error("Alignment cancelled by caller")]
    Cancelled,

    /// The multi-resolution search window failed to connect the endpoints
    #[error("Approximate alignment failed: {reason}")]
    ApproximationFailed {
        /// Why the coarse-to-fine refinement produced no path
        reason: String,
    },
}

impl AlignmentError {
    /// Returns `true` if retrying the operation may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Cancelled | Self::ApproximationFailed { .. } => true,
            Self::DimensionMismatch { .. } | Self::InfeasibleWindow { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::validation("frame has 16 keypoints");
        assert!(err.to_string().contains("Validation error"));
        assert!(err.to_string().contains("16 keypoints"));
    }

    #[test]
    fn test_alignment_error_conversion() {
        let err = AlignmentError::DimensionMismatch {
            expected: 42,
            actual: 34,
        };
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::Alignment(_)));
        assert!(!core.is_recoverable());
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(AlignmentError::Cancelled.is_recoverable());
        assert!(!AlignmentError::InfeasibleWindow {
            window: 2,
            required: 8
        }
        .is_recoverable());
    }
}
