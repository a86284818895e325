//! Deviation and stress analysis over an alignment path.
//!
//! Two complementary stress signals feed the final report:
//!
//! - comparative: per-joint average deviation along the alignment path,
//!   flagged against configurable thresholds;
//! - ergonomic: per-frame posture checks on the user sequence alone
//!   (neck, shoulders, elbows, spine), independent of the reference.

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;

use motion_coach_core::utils::angle_between;
use motion_coach_core::{AlignmentPath, DeviationReport, Joint, Sequence};

use crate::config::CompareConfig;
use crate::features::joint_angles;

/// Reference timestamps at or below this value are skipped when averaging
/// timing ratios (division guard for the zeroth frame).
const MIN_TIMESTAMP: f64 = 1e-6;

/// Head tilted more than this from vertical flags the neck.
const NECK_LIMIT: f64 = 30.0 * PI / 180.0;

/// Extreme elbow flexion bound.
const ELBOW_MIN: f64 = 45.0 * PI / 180.0;

/// Extreme elbow extension bound.
const ELBOW_MAX: f64 = 170.0 * PI / 180.0;

/// Torso leaning more than this from vertical flags the spine.
const SPINE_LIMIT: f64 = 15.0 * PI / 180.0;

/// One shoulder raised above the other by more than this fraction of torso
/// length flags the raised shoulder.
const SHOULDER_ELEVATION_FRACTION: f64 = 0.1;

/// Computes timing and per-joint deviation statistics for two sequences
/// joined by an alignment path.
///
/// The path indices must refer to frames of the given sequences, so callers
/// that sampled before alignment must pass the sampled sequences here.
/// Joints with no contributing pairs report 0.0; an empty path yields a
/// neutral timing ratio of 1.0.
#[must_use]
pub fn analyze(reference: &Sequence, user: &Sequence, path: &AlignmentPath) -> DeviationReport {
    let times_ref = reference.timestamps();
    let times_user = user.timestamps();

    let mut ratios = Vec::with_capacity(path.len());
    for &(i, j) in path {
        let t_ref = times_ref[i];
        if t_ref <= MIN_TIMESTAMP {
            continue;
        }
        ratios.push(times_user[j] / t_ref);
    }
    let timing_ratio = if ratios.is_empty() {
        1.0
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    };

    let mut per_joint = BTreeMap::new();
    let pairs = path.len();
    for joint in Joint::all() {
        let total: f64 = path
            .iter()
            .map(|&(i, j)| {
                let a = reference.frames()[i].get(*joint);
                let b = user.frames()[j].get(*joint);
                a.distance_to(&b)
            })
            .sum();
        let average = if pairs > 0 { total / pairs as f64 } else { 0.0 };
        per_joint.insert(joint.name().to_string(), average);
    }

    DeviationReport {
        per_joint,
        timing_ratio,
        total_duration_reference: reference.duration_seconds(),
        total_duration_user: user.duration_seconds(),
    }
}

/// Joints whose average deviation exceeds the configured threshold.
#[must_use]
pub fn detect_stress(report: &DeviationReport, config: &CompareConfig) -> BTreeSet<String> {
    report
        .per_joint
        .iter()
        .filter(|(name, deviation)| **deviation > config.threshold_for(name))
        .map(|(name, _)| name.clone())
        .collect()
}

/// Per-frame ergonomic posture checks on a single sequence.
///
/// A region is flagged when any frame violates its rule. Besides the
/// canonical joint names this can report the virtual regions `"neck"` and
/// `"spine"`, which have no keypoint index.
#[must_use]
pub fn ergonomic_stress(sequence: &Sequence) -> BTreeSet<String> {
    let mut stressed = BTreeSet::new();

    for frame in sequence.frames() {
        let (lsx, lsy) = frame.position(Joint::LeftShoulder);
        let (rsx, rsy) = frame.position(Joint::RightShoulder);
        let (lhx, lhy) = frame.position(Joint::LeftHip);
        let (rhx, rhy) = frame.position(Joint::RightHip);
        let shoulder_center = ((lsx + rsx) / 2.0, (lsy + rsy) / 2.0);
        let hip_center = ((lhx + rhx) / 2.0, (lhy + rhy) / 2.0);

        // head forward posture: nose more than 30 degrees off vertical
        let (nx, ny) = frame.position(Joint::Nose);
        let neck_vector = (nx - shoulder_center.0, ny - shoulder_center.1);
        if angle_between(neck_vector, (0.0, -1.0)) > NECK_LIMIT {
            stressed.insert("neck".to_string());
        }

        // one shoulder hiked above the other (image coordinates: smaller y
        // is higher)
        let torso_length = (shoulder_center.1 - hip_center.1).abs();
        if torso_length > 0.0 {
            let limit = SHOULDER_ELEVATION_FRACTION * torso_length;
            if rsy - lsy > limit {
                stressed.insert(Joint::LeftShoulder.name().to_string());
            } else if lsy - rsy > limit {
                stressed.insert(Joint::RightShoulder.name().to_string());
            }
        }

        // extreme elbow flexion or full extension; an angle of exactly 0
        // means a zero-length limb vector (missing or coincident
        // keypoints), not true flexion, and is skipped
        let angles = joint_angles(frame);
        for (angle, joint) in [(angles[0], Joint::LeftElbow), (angles[1], Joint::RightElbow)] {
            if angle > 0.0 && (angle < ELBOW_MIN || angle > ELBOW_MAX) {
                stressed.insert(joint.name().to_string());
            }
        }

        // torso lean off vertical
        let spine_vector = (
            shoulder_center.0 - hip_center.0,
            shoulder_center.1 - hip_center.1,
        );
        let spine_angle = spine_vector.0.abs().atan2(spine_vector.1.abs());
        if spine_angle > SPINE_LIMIT {
            stressed.insert("spine".to_string());
        }
    }

    stressed
}
