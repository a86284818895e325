//! Whole-sequence embedding reduction.
//!
//! Collapses a variable-length keypoint sequence into one fixed-length
//! statistical summary vector for fast coarse similarity: per-frame joint
//! angles and frame-to-frame velocity magnitudes, aggregated across time
//! (mean/std/min/max of angles, mean/std of velocities, mean/std of raw
//! positions, concatenated in that fixed order), zero-padded to 256.
//!
//! Computed once at ingestion time and cached by the storage collaborator.

use motion_coach_core::{Embedding, Joint, Sequence, ANGLE_COUNT, JOINT_COUNT};

use crate::features::joint_angles;

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (matching the aggregation the stored
/// embeddings were built with).
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.max(0.0).sqrt()
}

/// Reduces a sequence to its fixed-length embedding.
///
/// An empty sequence yields the all-zero embedding. Sequences with a single
/// frame have no velocity block; the remaining statistics shift up and the
/// tail is zero-padded.
#[must_use]
pub fn reduce(sequence: &Sequence) -> Embedding {
    if sequence.is_empty() {
        return Embedding::zeros();
    }

    let frames = sequence.frames();
    let n = frames.len();

    // per-frame angles, column-major access below
    let angles: Vec<[f64; ANGLE_COUNT]> = frames.iter().map(joint_angles).collect();

    let mut features = Vec::with_capacity(4 * ANGLE_COUNT + 2 * JOINT_COUNT + 4 * JOINT_COUNT);

    let mut column = Vec::with_capacity(n);
    let mut stats: [Vec<f64>; 4] = [
        Vec::with_capacity(ANGLE_COUNT),
        Vec::with_capacity(ANGLE_COUNT),
        Vec::with_capacity(ANGLE_COUNT),
        Vec::with_capacity(ANGLE_COUNT),
    ];
    for a in 0..ANGLE_COUNT {
        column.clear();
        column.extend(angles.iter().map(|row| row[a]));
        stats[0].push(mean(&column));
        stats[1].push(std_dev(&column));
        stats[2].push(column.iter().copied().fold(f64::INFINITY, f64::min));
        stats[3].push(column.iter().copied().fold(f64::NEG_INFINITY, f64::max));
    }
    for block in &stats {
        features.extend_from_slice(block);
    }

    // frame-to-frame velocity magnitudes per joint (absent for n == 1)
    if n >= 2 {
        let mut vel_mean = Vec::with_capacity(JOINT_COUNT);
        let mut vel_std = Vec::with_capacity(JOINT_COUNT);
        for joint in Joint::all() {
            column.clear();
            for pair in frames.windows(2) {
                let (x0, y0) = pair[0].position(*joint);
                let (x1, y1) = pair[1].position(*joint);
                column.push(((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt());
            }
            vel_mean.push(mean(&column));
            vel_std.push(std_dev(&column));
        }
        features.extend_from_slice(&vel_mean);
        features.extend_from_slice(&vel_std);
    }

    // raw positional statistics, x then y per joint
    let mut pos_mean = Vec::with_capacity(2 * JOINT_COUNT);
    let mut pos_std = Vec::with_capacity(2 * JOINT_COUNT);
    for joint in Joint::all() {
        for axis in 0..2 {
            column.clear();
            column.extend(frames.iter().map(|f| {
                let (x, y) = f.position(*joint);
                if axis == 0 {
                    x
                } else {
                    y
                }
            }));
            pos_mean.push(mean(&column));
            pos_std.push(std_dev(&column));
        }
    }
    features.extend_from_slice(&pos_mean);
    features.extend_from_slice(&pos_std);

    Embedding::from_features(features)
}

/// Cosine similarity between two embeddings, remapped from [-1, 1] to
/// [0, 1]. Either vector having zero norm yields 0.0 rather than an error.
#[must_use]
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }
    let cosine = dot / (norm_a.sqrt() * norm_b.sqrt());
    (cosine + 1.0) / 2.0
}
