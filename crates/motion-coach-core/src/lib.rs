//! # Motion Coach Core
//!
//! Core types, traits, and utilities for the motion comparison engine.
//!
//! This crate provides the foundational building blocks shared across the
//! motion-coach workspace:
//!
//! - **Pose Data Types**: [`Joint`], [`Keypoint`], [`KeypointFrame`], and
//!   [`Sequence`] for representing keypoint recordings.
//!
//! - **Alignment Types**: [`FeatureMatrix`], [`AlignmentPath`],
//!   [`DtwResult`], and the [`SequenceAligner`] contract implemented by the
//!   alignment strategies in `motion-coach-compare`.
//!
//! - **Result Types**: [`DeviationReport`] and [`ComparisonResult`], the
//!   externally visible artifacts of a comparison.
//!
//! - **Error Types**: a [`thiserror`]-based hierarchy in the [`error`]
//!   module.
//!
//! ## Feature Flags
//!
//! - `serde`: enable serialization/deserialization of data types
//!
//! ## Example
//!
//! ```rust
//! use motion_coach_core::{Joint, Keypoint, KeypointFrame, JOINT_COUNT};
//!
//! let frame = KeypointFrame::new([Keypoint::new(0.0, 0.0, 0.9); JOINT_COUNT]);
//! assert_eq!(frame.get(Joint::Nose).confidence, 0.9);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types at the crate root
pub use error::{AlignmentError, CoreError, CoreResult};
pub use traits::SequenceAligner;
pub use types::{
    // Alignment types
    is_valid_path, AlignmentMethod, AlignmentPath, DtwResult,
    // Result types
    ComparisonResult, DeviationReport,
    // Feature types
    Embedding, FeatureMatrix,
    // Pose types
    Joint, Keypoint, KeypointFrame, Sequence, SessionId,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of keypoints per frame (MoveNet/COCO format)
pub const JOINT_COUNT: usize = 17;

/// Number of anatomical angle triplets in the per-frame feature scheme
pub const ANGLE_COUNT: usize = 8;

/// Per-frame feature dimension: 8 joint angles + 17 planar (x, y) pairs
pub const FEATURE_DIM: usize = ANGLE_COUNT + 2 * JOINT_COUNT;

/// Fixed length of whole-sequence embeddings
pub const EMBEDDING_DIM: usize = 256;

/// Prelude module for convenient imports.
///
/// ```rust
/// use motion_coach_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{AlignmentError, CoreError, CoreResult};
    pub use crate::traits::SequenceAligner;
    pub use crate::types::{
        AlignmentMethod, AlignmentPath, ComparisonResult, DeviationReport, DtwResult, Embedding,
        FeatureMatrix, Joint, Keypoint, KeypointFrame, Sequence, SessionId,
    };
    pub use crate::{ANGLE_COUNT, EMBEDDING_DIM, FEATURE_DIM, JOINT_COUNT};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(JOINT_COUNT, 17);
        assert_eq!(FEATURE_DIM, 42);
        assert_eq!(EMBEDDING_DIM, 256);
        assert!(!VERSION.is_empty());
    }
}
