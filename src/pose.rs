//! Poses and prediction frames.
//!
//! A [`Pose`] always carries a 2D keypoint map. Models that also emit 3D
//! keypoints fill the optional companion map instead of producing a
//! different pose type.

use crate::{
    features::euclidean_distance,
    keypoint::{Keypoint2D, Keypoint3D, Landmark},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keypoints of one pose, keyed by name
pub type KeypointMap<K = Keypoint2D> = BTreeMap<String, K>;

/// One detected person at one moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Overall detection score
    pub score: f64,
    /// 2D keypoints
    pub keypoints: KeypointMap<Keypoint2D>,
    /// 3D keypoints, when the model produced them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints_3d: Option<KeypointMap<Keypoint3D>>,
}

impl Pose {
    /// Create a 2D-only pose
    #[must_use]
    pub fn new(score: f64, keypoints: KeypointMap<Keypoint2D>) -> Self {
        Self {
            score,
            keypoints,
            keypoints_3d: None,
        }
    }

    /// Attach a 3D companion map
    #[must_use]
    pub fn with_3d(mut self, keypoints_3d: KeypointMap<Keypoint3D>) -> Self {
        self.keypoints_3d = Some(keypoints_3d);
        self
    }

    /// Build a pose from an iterator of keypoints, keyed by their names
    pub fn from_keypoints<I>(score: f64, keypoints: I) -> Self
    where
        I: IntoIterator<Item = Keypoint2D>,
    {
        let keypoints = keypoints.into_iter().map(|kp| (kp.name.clone(), kp)).collect();
        Self::new(score, keypoints)
    }

    /// Look up a 2D keypoint by name
    pub fn keypoint(&self, name: &str) -> Option<&Keypoint2D> {
        self.keypoints.get(name)
    }

    /// Look up a 3D keypoint by name
    pub fn keypoint_3d(&self, name: &str) -> Option<&Keypoint3D> {
        self.keypoints_3d.as_ref().and_then(|kps| kps.get(name))
    }

    /// Whether 3D data is attached
    #[must_use]
    pub fn has_3d(&self) -> bool {
        self.keypoints_3d.is_some()
    }

    /// Mean keypoint score, or 0 for an empty pose
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_confidence(&self) -> f64 {
        if self.keypoints.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.keypoints.values().map(Landmark::score).sum();
        sum / self.keypoints.len() as f64
    }

    /// Euclidean distance between two named 2D keypoints
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if either name is not in the pose. Use
    /// [`crate::features::segment_lengths`] for sentinel-based batch output.
    pub fn distance_between(&self, first: &str, second: &str) -> Result<f64> {
        let a = self.require(first)?;
        let b = self.require(second)?;
        euclidean_distance(a.coords(), b.coords())
    }

    /// Distances for each connection, in order
    ///
    /// # Errors
    ///
    /// Fails on the first connection naming an absent keypoint
    pub fn distances(&self, connections: &[(String, String)]) -> Result<Vec<f64>> {
        connections
            .iter()
            .map(|(a, b)| self.distance_between(a, b))
            .collect()
    }

    /// Angle in degrees of the line from `first` to `second` against the
    /// horizontal axis, using only the x and y coordinates
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if either name is not in the pose
    pub fn angle_to_horizontal(&self, first: &str, second: &str) -> Result<f64> {
        let a = self.require(first)?;
        let b = self.require(second)?;
        let dx = b.x() - a.x();
        let dy = b.y() - a.y();
        Ok(dy.atan2(dx).to_degrees())
    }

    fn require(&self, name: &str) -> Result<&Keypoint2D> {
        self.keypoint(name)
            .ok_or_else(|| Error::InvalidInput(format!("Keypoint '{name}' not present in pose")))
    }
}

/// One log entry: the poses one model produced at one temporal key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionFrame {
    /// Timestamp or frame index, depending on the log scheme
    pub key: f64,
    /// Model identifier
    pub model_id: String,
    /// Poses in the order the model emitted them
    pub poses: Vec<Pose>,
}

impl PredictionFrame {
    /// First detection, which is what alignment hands back
    pub fn primary_pose(&self) -> Option<&Pose> {
        self.poses.first()
    }
}
