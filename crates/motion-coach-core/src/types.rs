//! Core data types for the motion comparison engine.
//!
//! # Type Categories
//!
//! - **Pose Types**: [`Joint`], [`Keypoint`], [`KeypointFrame`], [`Sequence`]
//! - **Feature Types**: [`FeatureMatrix`], [`Embedding`]
//! - **Alignment Types**: [`AlignmentPath`], [`AlignmentMethod`], [`DtwResult`]
//! - **Result Types**: [`DeviationReport`], [`ComparisonResult`]

use chrono::{DateTime, Utc};
use ndarray::{Array2, ArrayView1};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::{EMBEDDING_DIM, JOINT_COUNT};

// =============================================================================
// Pose Types
// =============================================================================

/// Anatomical landmarks in canonical MoveNet/COCO order.
///
/// The discriminant of each variant is its index in a [`KeypointFrame`] and
/// in the movement deviation vector of a [`ComparisonResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Joint {
    /// Nose
    Nose = 0,
    /// Left eye
    LeftEye = 1,
    /// Right eye
    RightEye = 2,
    /// Left ear
    LeftEar = 3,
    /// Right ear
    RightEar = 4,
    /// Left shoulder
    LeftShoulder = 5,
    /// Right shoulder
    RightShoulder = 6,
    /// Left elbow
    LeftElbow = 7,
    /// Right elbow
    RightElbow = 8,
    /// Left wrist
    LeftWrist = 9,
    /// Right wrist
    RightWrist = 10,
    /// Left hip
    LeftHip = 11,
    /// Right hip
    RightHip = 12,
    /// Left knee
    LeftKnee = 13,
    /// Right knee
    RightKnee = 14,
    /// Left ankle
    LeftAnkle = 15,
    /// Right ankle
    RightAnkle = 16,
}

impl Joint {
    /// Returns all joints in canonical order.
    #[must_use]
    pub fn all() -> &'static [Self; JOINT_COUNT] {
        &[
            Self::Nose,
            Self::LeftEye,
            Self::RightEye,
            Self::LeftEar,
            Self::RightEar,
            Self::LeftShoulder,
            Self::RightShoulder,
            Self::LeftElbow,
            Self::RightElbow,
            Self::LeftWrist,
            Self::RightWrist,
            Self::LeftHip,
            Self::RightHip,
            Self::LeftKnee,
            Self::RightKnee,
            Self::LeftAnkle,
            Self::RightAnkle,
        ]
    }

    /// Returns the canonical joint name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }

    /// Returns the canonical index of this joint.
    #[must_use]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Joint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Joint {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::all()
            .get(value as usize)
            .copied()
            .ok_or_else(|| CoreError::validation(format!("Invalid joint index: {value}")))
    }
}

/// A single anatomical landmark in normalized, torso-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    /// Normalized x coordinate
    pub x: f64,
    /// Normalized y coordinate (image convention: smaller is higher)
    pub y: f64,
    /// Detection confidence in [0.0, 1.0]
    pub confidence: f64,
}

impl Keypoint {
    /// Creates a new keypoint.
    #[must_use]
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    /// Returns the planar position as a tuple.
    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Planar Euclidean distance to another keypoint (confidence ignored).
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One frame of pose data: exactly 17 ordered keypoints.
///
/// Produced by the external pose-extraction collaborator and immutable once
/// created.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeypointFrame {
    keypoints: [Keypoint; JOINT_COUNT],
}

impl KeypointFrame {
    /// Creates a frame from a full set of keypoints.
    #[must_use]
    pub fn new(keypoints: [Keypoint; JOINT_COUNT]) -> Self {
        Self { keypoints }
    }

    /// Creates a frame from a vector of keypoints.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless exactly 17 keypoints are supplied.
    pub fn from_vec(keypoints: Vec<Keypoint>) -> CoreResult<Self> {
        let actual = keypoints.len();
        let keypoints: [Keypoint; JOINT_COUNT] = keypoints.try_into().map_err(|_| {
            CoreError::validation(format!(
                "KeypointFrame requires {JOINT_COUNT} keypoints, got {actual}"
            ))
        })?;
        Ok(Self { keypoints })
    }

    /// Returns the keypoint for the given joint.
    #[must_use]
    pub fn get(&self, joint: Joint) -> Keypoint {
        self.keypoints[joint.index()]
    }

    /// Returns the planar position of the given joint.
    #[must_use]
    pub fn position(&self, joint: Joint) -> (f64, f64) {
        self.keypoints[joint.index()].position()
    }

    /// Returns all keypoints in canonical order.
    #[must_use]
    pub fn keypoints(&self) -> &[Keypoint; JOINT_COUNT] {
        &self.keypoints
    }
}

/// An ordered sequence of keypoint frames with a session duration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sequence {
    frames: Vec<KeypointFrame>,
    duration_seconds: f64,
    /// Explicit per-frame timestamps, when the collaborator supplies them.
    timestamps: Option<Vec<f64>>,
}

impl Sequence {
    /// Creates a sequence with timestamps derived from frame position.
    #[must_use]
    pub fn new(frames: Vec<KeypointFrame>, duration_seconds: f64) -> Self {
        Self {
            frames,
            duration_seconds,
            timestamps: None,
        }
    }

    /// Creates a sequence with explicit per-frame timestamps.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the timestamp count does not match the
    /// frame count.
    pub fn with_timestamps(
        frames: Vec<KeypointFrame>,
        duration_seconds: f64,
        timestamps: Vec<f64>,
    ) -> CoreResult<Self> {
        if timestamps.len() != frames.len() {
            return Err(CoreError::validation(format!(
                "Expected {} timestamps, got {}",
                frames.len(),
                timestamps.len()
            )));
        }
        Ok(Self {
            frames,
            duration_seconds,
            timestamps: Some(timestamps),
        })
    }

    /// Returns the frames in order.
    #[must_use]
    pub fn frames(&self) -> &[KeypointFrame] {
        &self.frames
    }

    /// Returns the session duration in seconds.
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Returns the number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if the sequence has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Per-frame timestamps: explicit when supplied, otherwise derived as
    /// `index / frame_count * duration`.
    #[must_use]
    pub fn timestamps(&self) -> Vec<f64> {
        if let Some(ts) = &self.timestamps {
            return ts.clone();
        }
        let n = self.frames.len();
        (0..n)
            .map(|i| i as f64 / n as f64 * self.duration_seconds)
            .collect()
    }

    /// Returns a copy with every frame re-expressed in torso-relative
    /// coordinates (see [`normalize_torso`](crate::utils::normalize_torso)).
    /// Applied at ingestion when the pose collaborator emits raw image
    /// coordinates.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            frames: self
                .frames
                .iter()
                .map(crate::utils::normalize_torso)
                .collect(),
            duration_seconds: self.duration_seconds,
            timestamps: self.timestamps.clone(),
        }
    }

    /// Keeps every `rate`-th frame (rate 1 keeps all), preserving the
    /// session duration and any explicit timestamps.
    #[must_use]
    pub fn sample(&self, rate: usize) -> Self {
        let rate = rate.max(1);
        if rate == 1 {
            return self.clone();
        }
        Self {
            frames: self.frames.iter().step_by(rate).cloned().collect(),
            duration_seconds: self.duration_seconds,
            timestamps: self
                .timestamps
                .as_ref()
                .map(|ts| ts.iter().step_by(rate).copied().collect()),
        }
    }
}

/// Unique identifier for a recorded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new unique session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a session ID from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Feature Types
// =============================================================================

/// A per-frame feature matrix of shape `n_frames x feature_dim`.
///
/// Never mutated after creation; smoothing produces a new matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Array2<f64>,
}

impl FeatureMatrix {
    /// Wraps a raw feature array.
    #[must_use]
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Returns the number of frames (rows).
    #[must_use]
    pub fn num_frames(&self) -> usize {
        self.data.nrows()
    }

    /// Returns the feature dimension (columns).
    #[must_use]
    pub fn feature_dim(&self) -> usize {
        self.data.ncols()
    }

    /// Returns the underlying array.
    #[must_use]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Returns one frame's feature vector.
    #[must_use]
    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.row(index)
    }
}

impl From<Array2<f64>> for FeatureMatrix {
    fn from(data: Array2<f64>) -> Self {
        Self::new(data)
    }
}

/// Fixed-length statistical summary of a whole sequence.
///
/// Persisted per session by the external vector-store collaborator for
/// cheap nearest-neighbour lookup.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Embedding(Vec<f64>);

impl Embedding {
    /// Pads with zeros or truncates the given features to the fixed
    /// embedding length.
    #[must_use]
    pub fn from_features(mut features: Vec<f64>) -> Self {
        features.resize(EMBEDDING_DIM, 0.0);
        Self(features)
    }

    /// The all-zero embedding, produced for empty sequences.
    #[must_use]
    pub fn zeros() -> Self {
        Self(vec![0.0; EMBEDDING_DIM])
    }

    /// Returns the embedding values.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Returns the embedding length (always [`EMBEDDING_DIM`]).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Alignment Types
// =============================================================================

/// An ordered list of aligned frame index pairs `(i, j)`.
///
/// Contract relied upon by every downstream consumer: the path starts at
/// `(0, 0)`, ends at `(n-1, m-1)`, both indices are non-decreasing, and
/// consecutive pairs differ by exactly one unit in `i`, `j`, or both.
pub type AlignmentPath = Vec<(usize, usize)>;

/// Checks the [`AlignmentPath`] contract for sequences of length `n` and `m`.
#[must_use]
pub fn is_valid_path(path: &[(usize, usize)], n: usize, m: usize) -> bool {
    if n == 0 || m == 0 {
        return path.is_empty();
    }
    let Some(&first) = path.first() else {
        return false;
    };
    let Some(&last) = path.last() else {
        return false;
    };
    if first != (0, 0) || last != (n - 1, m - 1) {
        return false;
    }
    path.windows(2).all(|w| {
        let (i0, j0) = w[0];
        let (i1, j1) = w[1];
        let di = i1.wrapping_sub(i0);
        let dj = j1.wrapping_sub(j0);
        di <= 1 && dj <= 1 && di + dj >= 1
    })
}

/// Which alignment strategy produced a [`DtwResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AlignmentMethod {
    /// Full-grid exact dynamic time warping
    Exact,
    /// Exact search restricted to a Sakoe-Chiba band
    Windowed,
    /// Multi-resolution approximate alignment
    Approximate,
    /// No alignment was possible (an input sequence was empty)
    Degenerate,
}

impl AlignmentMethod {
    /// Returns the method name used in serialized results.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Windowed => "windowed",
            Self::Approximate => "approximate",
            Self::Degenerate => "degenerate",
        }
    }
}

/// Result of aligning two feature matrices.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DtwResult {
    /// Sum of pairwise costs along the alignment path
    pub total_cost: f64,
    /// `total_cost / max(1, path length)`
    pub normalized_cost: f64,
    /// `1 / (1 + normalized_cost)`, in (0, 1]
    pub similarity: f64,
    /// The optimal (or approximate) monotone correspondence
    pub path: AlignmentPath,
    /// Strategy that produced this result
    pub method: AlignmentMethod,
}

impl DtwResult {
    /// Builds a result from a raw path cost, deriving the normalized cost
    /// and similarity score.
    #[must_use]
    pub fn from_cost(total_cost: f64, path: AlignmentPath, method: AlignmentMethod) -> Self {
        let normalized_cost = total_cost / path.len().max(1) as f64;
        Self {
            total_cost,
            normalized_cost,
            similarity: 1.0 / (1.0 + normalized_cost),
            path,
            method,
        }
    }

    /// The degenerate result returned when either input has zero frames.
    #[must_use]
    pub fn degenerate() -> Self {
        Self {
            total_cost: f64::INFINITY,
            normalized_cost: f64::INFINITY,
            similarity: 0.0,
            path: Vec::new(),
            method: AlignmentMethod::Degenerate,
        }
    }
}

// =============================================================================
// Result Types
// =============================================================================

/// Timing and per-joint deviation statistics over an alignment path.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviationReport {
    /// Average planar deviation per joint name (0.0 when a joint had no
    /// contributing aligned pairs)
    pub per_joint: std::collections::BTreeMap<String, f64>,
    /// Mean of `t_user / t_reference` over aligned pairs; > 1 means the
    /// user is proportionally slower
    pub timing_ratio: f64,
    /// Reference session duration in seconds
    pub total_duration_reference: f64,
    /// User session duration in seconds
    pub total_duration_user: f64,
}

impl DeviationReport {
    /// Returns the deviation vector in canonical joint order.
    #[must_use]
    pub fn deviation_vector(&self) -> Vec<f64> {
        Joint::all()
            .iter()
            .map(|j| self.per_joint.get(j.name()).copied().unwrap_or(0.0))
            .collect()
    }
}

/// The externally visible artifact of one comparison.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComparisonResult {
    /// Movement similarity, on the configured scale (unit interval or 0-100)
    pub similarity_score: f64,
    /// Signed duration difference in seconds (user minus reference)
    pub time_difference_seconds: f64,
    /// Average deviation per joint, canonical order, 17 entries
    pub movement_deviation_vector: Vec<f64>,
    /// Deduplicated names of stressed joints
    pub stressed_joints: Vec<String>,
    /// Ordered, human-readable coaching messages
    pub recommendations: Vec<String>,
    /// When the comparison was computed
    pub computed_at: DateTime<Utc>,
}
