//! End-to-end comparison pipeline.
//!
//! [`MotionComparer`] orchestrates the full run: frame sampling, feature
//! extraction, smoothing, temporal alignment, deviation analysis, stress
//! detection, and recommendation generation, producing one
//! [`ComparisonResult`] per reference/user pair.

use std::collections::BTreeSet;

use chrono::Utc;
use motion_coach_core::{ComparisonResult, Sequence, JOINT_COUNT};

use crate::analysis::{analyze, detect_stress, ergonomic_stress};
use crate::config::CompareConfig;
use crate::dtw::align_with_config;
use crate::embedding;
use crate::error::CompareError;
use crate::features::{smooth, FeatureExtractor};
use crate::recommend;

/// Compares a user's recorded movement against a reference recording.
#[derive(Debug, Clone, Default)]
pub struct MotionComparer {
    config: CompareConfig,
}

impl MotionComparer {
    /// Creates a comparer with the given configuration.
    #[must_use]
    pub fn new(config: CompareConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Runs the full comparison pipeline.
    ///
    /// An empty input on either side produces a degenerate result (zero
    /// similarity, zero deviations) rather than an error; the duration
    /// difference is still reported from the session metadata.
    ///
    /// # Errors
    ///
    /// Propagates alignment failures that have no exact fallback, such as
    /// an explicitly configured window narrower than the length difference.
    pub fn compare(
        &self,
        reference: &Sequence,
        user: &Sequence,
    ) -> Result<ComparisonResult, CompareError> {
        let time_difference_seconds = user.duration_seconds() - reference.duration_seconds();

        if reference.is_empty() || user.is_empty() {
            tracing::debug!(
                reference_frames = reference.len(),
                user_frames = user.len(),
                "empty input, returning degenerate comparison"
            );
            return Ok(self.degenerate_result(time_difference_seconds));
        }

        // sample once up front so alignment path indices address the same
        // frames the analyzer sees
        let reference = reference.sample(self.config.frame_sample_rate);
        let user = user.sample(self.config.frame_sample_rate);

        let extractor = FeatureExtractor::new(1);
        let reference_features = smooth(&extractor.extract(&reference), self.config.smoothing_window);
        let user_features = smooth(&extractor.extract(&user), self.config.smoothing_window);
        tracing::debug!(
            reference_frames = reference_features.num_frames(),
            user_frames = user_features.num_frames(),
            "features extracted"
        );

        let alignment = align_with_config(&reference_features, &user_features, &self.config)?;
        tracing::debug!(
            method = alignment.method.as_str(),
            similarity = alignment.similarity,
            path_len = alignment.path.len(),
            "sequences aligned"
        );

        let report = analyze(&reference, &user, &alignment.path);

        let mut stressed: BTreeSet<String> = detect_stress(&report, &self.config);
        stressed.extend(ergonomic_stress(&user));

        let recommendations =
            recommend::generate(alignment.similarity, time_difference_seconds, &stressed);

        Ok(ComparisonResult {
            similarity_score: self.config.scale_similarity(alignment.similarity),
            time_difference_seconds,
            movement_deviation_vector: report.deviation_vector(),
            stressed_joints: stressed.into_iter().collect(),
            recommendations,
            computed_at: Utc::now(),
        })
    }

    /// Cheap whole-sequence similarity from cached-style embeddings,
    /// suitable for candidate ranking before a full comparison.
    #[must_use]
    pub fn coarse_similarity(&self, a: &Sequence, b: &Sequence) -> f64 {
        let score = embedding::cosine_similarity(&embedding::reduce(a), &embedding::reduce(b));
        self.config.scale_similarity(score)
    }

    fn degenerate_result(&self, time_difference_seconds: f64) -> ComparisonResult {
        let stressed = BTreeSet::new();
        let recommendations = recommend::generate(0.0, time_difference_seconds, &stressed);
        ComparisonResult {
            similarity_score: self.config.scale_similarity(0.0),
            time_difference_seconds,
            movement_deviation_vector: vec![0.0; JOINT_COUNT],
            stressed_joints: Vec::new(),
            recommendations,
            computed_at: Utc::now(),
        }
    }
}
