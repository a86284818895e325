//! Coaching recommendation rules.
//!
//! Pure function over the analysis outputs; message order is fixed:
//! similarity feedback, then pacing, then per-joint advisories, with a
//! positive fallback when nothing else triggered. Similarity is always
//! evaluated on the unit scale here, before any output scaling.

use std::collections::BTreeSet;

/// Below this similarity the movement pattern itself needs work.
const SIMILARITY_LOW: f64 = 0.6;

/// Below this similarity the pattern is close but needs refinement.
const SIMILARITY_GOOD: f64 = 0.8;

/// Duration differences under this many seconds get no pacing message.
const PACING_TOLERANCE_SECONDS: f64 = 5.0;

fn joint_advice(joint: &str) -> Option<&'static str> {
    Some(match joint {
        "neck" => "Keep your head aligned with your spine to reduce neck strain",
        "left_shoulder" => "Relax your left shoulder - avoid unnecessary elevation",
        "right_shoulder" => "Relax your right shoulder - avoid unnecessary elevation",
        "left_elbow" => "Check your left elbow angle - avoid extreme positions",
        "right_elbow" => "Check your right elbow angle - avoid extreme positions",
        "spine" => "Maintain better spinal alignment - keep your torso upright",
        "left_knee" => "Be mindful of your left knee position during the movement",
        "right_knee" => "Be mindful of your right knee position during the movement",
        _ => return None,
    })
}

/// Builds the ordered recommendation list.
///
/// `similarity` must be on the unit scale; `time_difference_seconds` is
/// signed, user minus reference (positive means the user was slower).
#[must_use]
pub fn generate(
    similarity: f64,
    time_difference_seconds: f64,
    stressed_joints: &BTreeSet<String>,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if similarity < SIMILARITY_LOW {
        recommendations.push(
            "Review the reference video and focus on matching the overall movement pattern"
                .to_string(),
        );
    } else if similarity < SIMILARITY_GOOD {
        recommendations
            .push("Good progress! Refine your movements to more closely match the reference".to_string());
    }

    if time_difference_seconds.abs() > PACING_TOLERANCE_SECONDS {
        let magnitude = time_difference_seconds.abs();
        if time_difference_seconds > 0.0 {
            recommendations.push(format!(
                "Try to speed up - you're {magnitude:.1}s slower than the reference"
            ));
        } else {
            recommendations.push(format!(
                "Slow down to match the reference pace - you're {magnitude:.1}s faster"
            ));
        }
    }

    for joint in stressed_joints {
        if let Some(advice) = joint_advice(joint) {
            recommendations.push(advice.to_string());
        }
    }

    if recommendations.is_empty() {
        recommendations
            .push("Excellent execution! Your movement closely matches the reference".to_string());
    }

    recommendations
}
