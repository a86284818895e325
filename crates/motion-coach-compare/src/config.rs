//! Comparison configuration and presets.
//!
//! [`CompareConfig`] is an immutable value passed into every comparison;
//! presets are factory functions returning fresh values, never mutating
//! shared state. Tuning guidance in the field docs reflects measured
//! behavior on sequences of a few hundred to a few thousand frames.

use std::collections::HashMap;

use motion_coach_core::Joint;
use serde::{Deserialize, Serialize};

/// Sequences at or below this length always get a full (unbanded) search
/// when no explicit window is configured.
pub const AUTO_WINDOW_MIN_FRAMES: usize = 500;

/// Scale applied to similarity scores on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimilarityScale {
    /// Unit interval (0, 1]
    #[default]
    #[serde(rename = "0-1")]
    Unit,
    /// Percentage (0, 100]
    #[serde(rename = "0-100")]
    Percentage,
}

/// Configuration for one motion comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Keep every Nth frame (1 = all). 1-2 for precise motion, 3-5 for
    /// long sequences.
    pub frame_sample_rate: usize,

    /// Moving-average window for feature smoothing. 2-3 responsive,
    /// 4-5 stable.
    pub smoothing_window: usize,

    /// Enable the Sakoe-Chiba band.
    pub use_window: bool,

    /// Explicit band half-width; `None` auto-calculates for long sequences.
    pub window_size: Option<usize>,

    /// Auto window as a fraction of the longer sequence.
    pub window_percentage: f64,

    /// Enable multi-resolution approximate alignment for long sequences.
    pub use_approximate: bool,

    /// Sequence length above which approximate alignment engages.
    pub approximate_threshold: usize,

    /// Default per-joint deviation threshold in normalized units.
    pub stress_threshold: f64,

    /// Per-joint threshold overrides, keyed by canonical joint name.
    pub joint_thresholds: HashMap<String, f64>,

    /// Scale of the reported similarity score.
    pub similarity_scale: SimilarityScale,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self::balanced()
    }
}

impl CompareConfig {
    /// High accuracy, slower: no band, fine smoothing, strict thresholds.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            frame_sample_rate: 1,
            smoothing_window: 2,
            use_window: false,
            window_size: None,
            window_percentage: 0.15,
            use_approximate: false,
            approximate_threshold: 1000,
            stress_threshold: 0.20,
            joint_thresholds: HashMap::new(),
            similarity_scale: SimilarityScale::Unit,
        }
    }

    /// Balance between speed and accuracy (the default).
    #[must_use]
    pub fn balanced() -> Self {
        Self {
            frame_sample_rate: 1,
            smoothing_window: 3,
            use_window: true,
            window_size: None,
            window_percentage: 0.15,
            use_approximate: false,
            approximate_threshold: 1000,
            stress_threshold: 0.25,
            joint_thresholds: HashMap::new(),
            similarity_scale: SimilarityScale::Unit,
        }
    }

    /// Optimized for speed: coarser sampling, narrower band, approximate
    /// mode enabled.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            frame_sample_rate: 2,
            smoothing_window: 4,
            use_window: true,
            window_size: None,
            window_percentage: 0.10,
            use_approximate: true,
            approximate_threshold: 1000,
            stress_threshold: 0.30,
            joint_thresholds: HashMap::new(),
            similarity_scale: SimilarityScale::Unit,
        }
    }

    /// For recordings over a minute: coarsest sampling, approximate mode
    /// with a lowered length threshold.
    #[must_use]
    pub fn long_sequences() -> Self {
        Self {
            frame_sample_rate: 3,
            smoothing_window: 5,
            use_window: true,
            window_size: None,
            window_percentage: 0.10,
            use_approximate: true,
            approximate_threshold: 500,
            stress_threshold: 0.25,
            joint_thresholds: HashMap::new(),
            similarity_scale: SimilarityScale::Unit,
        }
    }

    /// Adds a per-joint stress threshold override.
    #[must_use]
    pub fn with_joint_threshold(mut self, joint: Joint, threshold: f64) -> Self {
        self.joint_thresholds.insert(joint.name().to_string(), threshold);
        self
    }

    /// Resolves the band half-width for the given (longer) sequence length.
    ///
    /// An explicit `window_size` always wins; otherwise sequences longer
    /// than [`AUTO_WINDOW_MIN_FRAMES`] get `window_percentage` of their
    /// length, and shorter ones get a full search.
    #[must_use]
    pub fn window_for(&self, max_len: usize) -> Option<usize> {
        if !self.use_window {
            return None;
        }
        if let Some(size) = self.window_size {
            return Some(size);
        }
        if max_len > AUTO_WINDOW_MIN_FRAMES {
            return Some((self.window_percentage * max_len as f64).round() as usize);
        }
        None
    }

    /// Deviation threshold for a joint, honoring overrides.
    #[must_use]
    pub fn threshold_for(&self, joint_name: &str) -> f64 {
        self.joint_thresholds
            .get(joint_name)
            .copied()
            .unwrap_or(self.stress_threshold)
    }

    /// Applies the configured similarity scale.
    #[must_use]
    pub fn scale_similarity(&self, similarity: f64) -> f64 {
        match self.similarity_scale {
            SimilarityScale::Unit => similarity,
            SimilarityScale::Percentage => 100.0 * similarity,
        }
    }
}

/// Preset per-joint threshold maps at different sensitivity levels.
pub struct StressThresholds;

impl StressThresholds {
    fn map(entries: &[(Joint, f64)]) -> HashMap<String, f64> {
        entries
            .iter()
            .map(|(joint, value)| (joint.name().to_string(), *value))
            .collect()
    }

    /// Very sensitive: catches minor deviations.
    #[must_use]
    pub fn strict() -> HashMap<String, f64> {
        Self::map(&[
            (Joint::LeftShoulder, 0.15),
            (Joint::RightShoulder, 0.15),
            (Joint::LeftElbow, 0.20),
            (Joint::RightElbow, 0.20),
            (Joint::LeftHip, 0.20),
            (Joint::RightHip, 0.20),
            (Joint::LeftKnee, 0.20),
            (Joint::RightKnee, 0.20),
            (Joint::LeftAnkle, 0.25),
            (Joint::RightAnkle, 0.25),
        ])
    }

    /// Balanced sensitivity.
    #[must_use]
    pub fn moderate() -> HashMap<String, f64> {
        Self::map(&[
            (Joint::LeftShoulder, 0.25),
            (Joint::RightShoulder, 0.25),
            (Joint::LeftElbow, 0.25),
            (Joint::RightElbow, 0.25),
            (Joint::LeftHip, 0.25),
            (Joint::RightHip, 0.25),
            (Joint::LeftKnee, 0.30),
            (Joint::RightKnee, 0.30),
            (Joint::LeftAnkle, 0.35),
            (Joint::RightAnkle, 0.35),
        ])
    }

    /// Only major deviations.
    #[must_use]
    pub fn relaxed() -> HashMap<String, f64> {
        Self::map(&[
            (Joint::LeftShoulder, 0.35),
            (Joint::RightShoulder, 0.35),
            (Joint::LeftElbow, 0.35),
            (Joint::RightElbow, 0.35),
            (Joint::LeftHip, 0.35),
            (Joint::RightHip, 0.35),
            (Joint::LeftKnee, 0.40),
            (Joint::RightKnee, 0.40),
            (Joint::LeftAnkle, 0.45),
            (Joint::RightAnkle, 0.45),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_balanced() {
        let config = CompareConfig::default();
        assert_eq!(config.frame_sample_rate, 1);
        assert_eq!(config.smoothing_window, 3);
        assert!(config.use_window);
        assert!(!config.use_approximate);
        assert!((config.stress_threshold - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_presets_differ() {
        assert!(!CompareConfig::precise().use_window);
        assert_eq!(CompareConfig::fast().frame_sample_rate, 2);
        assert_eq!(CompareConfig::long_sequences().approximate_threshold, 500);
    }

    #[test]
    fn test_window_resolution() {
        let config = CompareConfig::balanced();
        // short sequences: full search
        assert_eq!(config.window_for(300), None);
        // long sequences: 15% auto window
        assert_eq!(config.window_for(1000), Some(150));

        let mut explicit = CompareConfig::balanced();
        explicit.window_size = Some(40);
        assert_eq!(explicit.window_for(100), Some(40));

        assert_eq!(CompareConfig::precise().window_for(10_000), None);
    }

    #[test]
    fn test_threshold_override() {
        let config = CompareConfig::balanced().with_joint_threshold(Joint::LeftKnee, 0.05);
        assert!((config.threshold_for("left_knee") - 0.05).abs() < f64::EPSILON);
        assert!((config.threshold_for("right_knee") - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similarity_scaling() {
        let mut config = CompareConfig::balanced();
        assert!((config.scale_similarity(0.75) - 0.75).abs() < f64::EPSILON);
        config.similarity_scale = SimilarityScale::Percentage;
        assert!((config.scale_similarity(0.75) - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_threshold_presets() {
        let strict = StressThresholds::strict();
        let relaxed = StressThresholds::relaxed();
        assert!(strict["left_shoulder"] < relaxed["left_shoulder"]);
        assert_eq!(strict.len(), 10);
    }
}
