//! # Motion Coach Compare
//!
//! The comparison engine of the motion-coach workspace: turns two keypoint
//! recordings into a similarity score, per-joint deviation statistics,
//! stressed-joint flags, and coaching recommendations.
//!
//! ## Pipeline
//!
//! 1. **Features** ([`features`]): each frame becomes a 42-dimensional row
//!    of joint angles and planar coordinates, optionally smoothed with a
//!    centered moving average.
//! 2. **Alignment** ([`dtw`]): dynamic time warping matches the two frame
//!    sequences, exactly (with an optional Sakoe-Chiba band) or through a
//!    multi-resolution approximation for long recordings.
//! 3. **Analysis** ([`analysis`]): timing ratios and per-joint deviations
//!    along the alignment path, plus ergonomic posture checks.
//! 4. **Recommendations** ([`recommend`]): a fixed rule table renders the
//!    numbers as coaching messages.
//!
//! [`MotionComparer`] runs the whole pipeline; [`embedding`] provides the
//! cheap whole-sequence similarity used for candidate ranking.
//!
//! ## Example
//!
//! ```rust,no_run
//! use motion_coach_compare::{CompareConfig, MotionComparer};
//! use motion_coach_core::Sequence;
//!
//! # fn load(_: &str) -> Sequence { unimplemented!() }
//! let comparer = MotionComparer::new(CompareConfig::balanced());
//! let reference = load("reference-session");
//! let user = load("user-session");
//! let result = comparer.compare(&reference, &user)?;
//! println!("similarity: {:.2}", result.similarity_score);
//! # Ok::<(), motion_coach_compare::CompareError>(())
//! ```

#![forbid(unsafe_code)]

pub mod analysis;
pub mod comparer;
pub mod config;
pub mod dtw;
pub mod embedding;
pub mod error;
pub mod features;
pub mod recommend;

pub use comparer::MotionComparer;
pub use config::{CompareConfig, SimilarityScale, StressThresholds};
pub use dtw::{align_with_config, MultiResolutionDtw, WindowedDtw};
pub use error::{CompareError, CompareResult};
pub use features::FeatureExtractor;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::comparer::MotionComparer;
    pub use crate::config::{CompareConfig, SimilarityScale, StressThresholds};
    pub use crate::dtw::{align_with_config, MultiResolutionDtw, WindowedDtw};
    pub use crate::error::{CompareError, CompareResult};
    pub use crate::features::FeatureExtractor;
    pub use motion_coach_core::prelude::*;
}
