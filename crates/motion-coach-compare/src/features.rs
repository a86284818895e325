//! Per-frame feature extraction.
//!
//! Converts a raw keypoint sequence into a fixed-width feature matrix:
//! 8 joint angles from fixed anatomical triplets, concatenated with the 17
//! joints' planar coordinates (confidence dropped), one 42-dimensional row
//! per kept frame. Temporal smoothing is a separate pass returning a new
//! matrix.

use motion_coach_core::utils::angle_between;
use motion_coach_core::{FeatureMatrix, Joint, KeypointFrame, Sequence, ANGLE_COUNT, FEATURE_DIM};
use ndarray::Array2;

/// Anatomical (parent, joint, child) triplets whose inner angle is measured
/// at the middle joint: arms, legs, torso, and neck/shoulder lines.
pub const ANGLE_TRIPLETS: [(Joint, Joint, Joint); ANGLE_COUNT] = [
    (Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist),
    (Joint::RightShoulder, Joint::RightElbow, Joint::RightWrist),
    (Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle),
    (Joint::RightHip, Joint::RightKnee, Joint::RightAnkle),
    (Joint::LeftShoulder, Joint::LeftHip, Joint::LeftKnee),
    (Joint::RightShoulder, Joint::RightHip, Joint::RightKnee),
    (Joint::Nose, Joint::LeftShoulder, Joint::LeftElbow),
    (Joint::Nose, Joint::RightShoulder, Joint::RightElbow),
];

/// Joint angles for one frame, in [`ANGLE_TRIPLETS`] order.
pub(crate) fn joint_angles(frame: &KeypointFrame) -> [f64; ANGLE_COUNT] {
    let mut angles = [0.0; ANGLE_COUNT];
    for (angle, (parent, joint, child)) in angles.iter_mut().zip(&ANGLE_TRIPLETS) {
        let (px, py) = frame.position(*parent);
        let (jx, jy) = frame.position(*joint);
        let (cx, cy) = frame.position(*child);
        *angle = angle_between((px - jx, py - jy), (cx - jx, cy - jy));
    }
    angles
}

/// Extracts per-frame feature rows from a keypoint sequence.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    sample_rate: usize,
}

impl FeatureExtractor {
    /// Creates an extractor keeping every `sample_rate`-th frame.
    #[must_use]
    pub fn new(sample_rate: usize) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
        }
    }

    /// Builds the `n_frames x 42` feature matrix for a sequence.
    #[must_use]
    pub fn extract(&self, sequence: &Sequence) -> FeatureMatrix {
        let frames: Vec<&KeypointFrame> =
            sequence.frames().iter().step_by(self.sample_rate).collect();
        let mut data = Array2::zeros((frames.len(), FEATURE_DIM));

        for (row, frame) in frames.iter().enumerate() {
            let angles = joint_angles(frame);
            for (col, angle) in angles.iter().enumerate() {
                data[[row, col]] = *angle;
            }
            for (k, keypoint) in frame.keypoints().iter().enumerate() {
                data[[row, ANGLE_COUNT + 2 * k]] = keypoint.x;
                data[[row, ANGLE_COUNT + 2 * k + 1]] = keypoint.y;
            }
        }

        FeatureMatrix::new(data)
    }
}

/// Per-column centered moving average.
///
/// Boundary rows average over the rows actually in range (a shorter
/// effective window at the edges, not extrapolation). A window of 1 or a
/// matrix with fewer than 2 rows is returned unchanged.
#[must_use]
pub fn smooth(matrix: &FeatureMatrix, window: usize) -> FeatureMatrix {
    let n = matrix.num_frames();
    if n < 2 || window <= 1 {
        return matrix.clone();
    }

    let half_before = (window - 1) / 2;
    let half_after = window / 2;
    let data = matrix.data();
    let mut smoothed = Array2::zeros(data.raw_dim());

    for row in 0..n {
        let start = row.saturating_sub(half_before);
        let end = (row + half_after + 1).min(n);
        let count = (end - start) as f64;
        for col in 0..matrix.feature_dim() {
            let sum: f64 = (start..end).map(|r| data[[r, col]]).sum();
            smoothed[[row, col]] = sum / count;
        }
    }

    FeatureMatrix::new(smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_coach_core::{Keypoint, JOINT_COUNT};
    use ndarray::arr2;

    fn frame_with(positions: &[(Joint, f64, f64)]) -> KeypointFrame {
        let mut keypoints = [Keypoint::default(); JOINT_COUNT];
        for (joint, x, y) in positions {
            keypoints[joint.index()] = Keypoint::new(*x, *y, 1.0);
        }
        KeypointFrame::new(keypoints)
    }

    #[test]
    fn test_feature_dimensions() {
        let frames = vec![frame_with(&[]); 5];
        let matrix = FeatureExtractor::new(1).extract(&Sequence::new(frames, 5.0));
        assert_eq!(matrix.num_frames(), 5);
        assert_eq!(matrix.feature_dim(), FEATURE_DIM);
    }

    #[test]
    fn test_sampling_keeps_every_nth_frame() {
        let frames = vec![frame_with(&[]); 7];
        let matrix = FeatureExtractor::new(3).extract(&Sequence::new(frames, 7.0));
        assert_eq!(matrix.num_frames(), 3);
    }

    #[test]
    fn test_straight_arm_angle() {
        let frame = frame_with(&[
            (Joint::LeftShoulder, 0.0, 0.0),
            (Joint::LeftElbow, 1.0, 0.0),
            (Joint::LeftWrist, 2.0, 0.0),
        ]);
        let angles = joint_angles(&frame);
        assert!((angles[0] - std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_bent_arm_angle() {
        let frame = frame_with(&[
            (Joint::LeftShoulder, 0.0, 1.0),
            (Joint::LeftElbow, 0.0, 0.0),
            (Joint::LeftWrist, 1.0, 0.0),
        ]);
        let angles = joint_angles(&frame);
        assert!((angles[0] - std::f64::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_coincident_joints_yield_zero_angle() {
        // all keypoints at the origin: every limb vector is degenerate
        let frame = frame_with(&[]);
        assert_eq!(joint_angles(&frame), [0.0; ANGLE_COUNT]);
    }

    #[test]
    fn test_smooth_window_one_is_identity() {
        let matrix = FeatureMatrix::new(arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]));
        assert_eq!(smooth(&matrix, 1).data(), matrix.data());
    }

    #[test]
    fn test_smooth_single_row_is_identity() {
        let matrix = FeatureMatrix::new(arr2(&[[1.0, 2.0]]));
        assert_eq!(smooth(&matrix, 5).data(), matrix.data());
    }

    #[test]
    fn test_smooth_centered_average() {
        let matrix = FeatureMatrix::new(arr2(&[[1.0], [2.0], [3.0], [4.0], [5.0]]));
        let smoothed = smooth(&matrix, 3);
        let expected = [1.5, 2.0, 3.0, 4.0, 4.5];
        for (row, want) in expected.iter().enumerate() {
            assert!((smoothed.data()[[row, 0]] - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_smooth_preserves_constant_columns() {
        let matrix = FeatureMatrix::new(Array2::from_elem((6, 3), 7.0));
        let smoothed = smooth(&matrix, 4);
        for value in smoothed.data() {
            assert!((value - 7.0).abs() < 1e-12);
        }
    }
}
