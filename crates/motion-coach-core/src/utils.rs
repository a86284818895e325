//! Shared geometric helpers.

use crate::types::{Joint, Keypoint, KeypointFrame};
use crate::JOINT_COUNT;

/// Epsilon guarding angle denominators against zero-length limb vectors.
pub const ANGLE_EPSILON: f64 = 1e-8;

/// Minimum torso length accepted for normalization scaling.
pub const MIN_TORSO_LENGTH: f64 = 0.01;

/// Angle in radians between two planar vectors.
///
/// Degenerate (near-zero-length) vectors yield 0 rather than NaN; the
/// cosine is clipped to [-1, 1] before `acos`.
#[must_use]
pub fn angle_between(v1: (f64, f64), v2: (f64, f64)) -> f64 {
    let norm1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let norm2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if norm1 < ANGLE_EPSILON || norm2 < ANGLE_EPSILON {
        return 0.0;
    }
    let cos = (v1.0 * v2.0 + v1.1 * v2.1) / (norm1 * norm2 + ANGLE_EPSILON);
    cos.clamp(-1.0, 1.0).acos()
}

/// Midpoint of two planar positions.
#[must_use]
pub fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Re-expresses a frame relative to the shoulder center, scaled by torso
/// length, so different body sizes and camera distances compare directly.
///
/// A torso shorter than [`MIN_TORSO_LENGTH`] skips scaling (scale 1.0)
/// instead of dividing by a near-zero length.
#[must_use]
pub fn normalize_torso(frame: &KeypointFrame) -> KeypointFrame {
    let shoulder_center = midpoint(
        frame.position(Joint::LeftShoulder),
        frame.position(Joint::RightShoulder),
    );
    let hip_center = midpoint(
        frame.position(Joint::LeftHip),
        frame.position(Joint::RightHip),
    );
    let dx = shoulder_center.0 - hip_center.0;
    let dy = shoulder_center.1 - hip_center.1;
    let mut torso_length = (dx * dx + dy * dy).sqrt();
    if torso_length < MIN_TORSO_LENGTH {
        torso_length = 1.0;
    }

    let mut keypoints = [Keypoint::default(); JOINT_COUNT];
    for (out, kp) in keypoints.iter_mut().zip(frame.keypoints()) {
        *out = Keypoint::new(
            (kp.x - shoulder_center.0) / torso_length,
            (kp.y - shoulder_center.1) / torso_length,
            kp.confidence,
        );
    }
    KeypointFrame::new(keypoints)
}
