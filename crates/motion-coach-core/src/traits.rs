//! Core trait definitions for the motion comparison engine.
//!
//! [`SequenceAligner`] is the single alignment contract: both the windowed
//! exact search and the multi-resolution approximate search implement it,
//! and configuration selects between them (with approximate falling back to
//! windowed exact on failure).

use crate::error::AlignmentError;
use crate::types::{DtwResult, FeatureMatrix};

/// Computes a monotone correspondence between two feature matrices.
///
/// # Contract
///
/// - Both matrices must share a feature dimension; implementations reject a
///   mismatch with [`AlignmentError::DimensionMismatch`].
/// - Either matrix having zero rows is not an error: implementations return
///   the degenerate result (infinite cost, similarity 0, empty path).
/// - Any non-degenerate returned path satisfies
///   [`is_valid_path`](crate::types::is_valid_path) for the input row counts.
pub trait SequenceAligner {
    /// Aligns `a` (reference) against `b` (user).
    ///
    /// # Errors
    ///
    /// Returns an [`AlignmentError`] on dimension mismatch, an infeasible
    /// band, cancellation, or a failed approximate refinement.
    fn align(&self, a: &FeatureMatrix, b: &FeatureMatrix) -> Result<DtwResult, AlignmentError>;
}
