//! Error types for the comparison pipeline.

use motion_coach_core::{AlignmentError, CoreError};
use thiserror::Error;

/// A specialized `Result` type for comparison operations.
pub type CompareResult<T> = Result<T, CompareError>;

/// Errors produced by the comparison pipeline.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CompareError {
    /// Error from the core data layer
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Error from the alignment engine
    #[error("Alignment error: {0}")]
    Alignment(#[from] AlignmentError),

    /// Feature extraction error
    #[error("Feature extraction error: {message}")]
    Feature {
        /// Description of the extraction failure
        message: String,
    },
}

impl CompareError {
    /// Creates a new feature extraction error.
    #[must_use]
    pub fn feature(message: impl Into<String>) -> Self {
        Self::Feature {
            message: message.into(),
        }
    }

    /// Returns `true` if retrying the operation may succeed without
    /// changing inputs or configuration.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Core(e) => e.is_recoverable(),
            Self::Alignment(e) => e.is_recoverable(),
            Self::Feature { .. } => false,
        }
    }
}
