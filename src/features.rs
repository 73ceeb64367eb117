//! Geometric features over a single pose's keypoints.
//!
//! All extractors take the keypoint map as `Option` so that an absent pose
//! (the model produced nothing at the matched key) yields a full row of
//! sentinels instead of an error. A missing keypoint only blanks its own
//! entry. Output order always follows the order of the configured lists.

use crate::{
    constants::{DEFAULT_CONFIDENCE_THRESHOLD, PRESENCE_SENTINEL, SENTINEL},
    keypoint::Landmark,
    pose::{KeypointMap, Pose},
    skeleton::KeypointScheme,
    Error, Result,
};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Named keypoint pair measured by [`segment_lengths`]
pub type Segment = (String, String);

/// Named keypoint triple measured by [`joint_angles`]
pub type Joint = (String, String, String);

/// Euclidean distance between two coordinate vectors
///
/// # Errors
///
/// Returns `DimensionMismatch` if the vectors differ in length
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Result<f64> {
    Ok(difference(a, b)?.norm())
}

/// `b - a`
fn difference(a: &[f64], b: &[f64]) -> Result<DVector<f64>> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(DVector::from_column_slice(b) - DVector::from_column_slice(a))
}

/// Distance between each pair of named keypoints
///
/// Missing keypoints yield [`SENTINEL`] for their entry; an absent pose yields
/// a sentinel for every entry.
///
/// # Errors
///
/// Returns `DimensionMismatch` if a pair mixes keypoints of different
/// dimensionality.
pub fn segment_lengths<K, S>(kps: Option<&KeypointMap<K>>, pairs: &[(S, S)]) -> Result<Vec<f64>>
where
    K: Landmark,
    S: AsRef<str>,
{
    let Some(kps) = kps else {
        return Ok(vec![SENTINEL; pairs.len()]);
    };

    pairs
        .iter()
        .map(|(a, b)| match (kps.get(a.as_ref()), kps.get(b.as_ref())) {
            (Some(a), Some(b)) => euclidean_distance(a.coords(), b.coords()),
            _ => Ok(SENTINEL),
        })
        .collect()
}

/// Segment lengths over a pose's 3D companion map
///
/// A pose without 3D data is treated like an absent pose.
///
/// # Errors
///
/// As [`segment_lengths`].
pub fn segment_lengths_3d<S: AsRef<str>>(pose: Option<&Pose>, pairs: &[(S, S)]) -> Result<Vec<f64>> {
    segment_lengths(pose.and_then(|p| p.keypoints_3d.as_ref()), pairs)
}

/// Angle in radians between the vectors A→B and B→C for each triple
///
/// Entries are `None` when a keypoint is missing or either vector has zero
/// length.
///
/// # Errors
///
/// Returns `DimensionMismatch` if a triple mixes dimensionalities.
pub fn joint_angles<K, S>(kps: Option<&KeypointMap<K>>, triples: &[(S, S, S)]) -> Result<Vec<Option<f64>>>
where
    K: Landmark,
    S: AsRef<str>,
{
    let Some(kps) = kps else {
        return Ok(vec![None; triples.len()]);
    };

    triples
        .iter()
        .map(|(a, b, c)| {
            match (kps.get(a.as_ref()), kps.get(b.as_ref()), kps.get(c.as_ref())) {
                (Some(a), Some(b), Some(c)) => angle_between(a.coords(), b.coords(), c.coords()),
                _ => Ok(None),
            }
        })
        .collect()
}

fn angle_between(a: &[f64], b: &[f64], c: &[f64]) -> Result<Option<f64>> {
    let u = difference(a, b)?;
    let v = difference(b, c)?;
    let (nu, nv) = (u.norm(), v.norm());
    if nu == 0.0 || nv == 0.0 {
        return Ok(None);
    }
    let cos = (u.dot(&v) / (nu * nv)).clamp(-1.0, 1.0);
    Ok(Some(cos.acos()))
}

/// Map an angle to its tabular form, `None` becoming [`SENTINEL`]
#[must_use]
pub fn angle_sentinel(angle: Option<f64>) -> f64 {
    angle.unwrap_or(SENTINEL)
}

/// 1 if the named keypoint exists with a score above `threshold`, else 0
///
/// An absent pose yields [`PRESENCE_SENTINEL`] for every name.
pub fn presence_flags<K, S>(kps: Option<&KeypointMap<K>>, names: &[S], threshold: f64) -> Vec<i8>
where
    K: Landmark,
    S: AsRef<str>,
{
    let Some(kps) = kps else {
        return vec![PRESENCE_SENTINEL; names.len()];
    };

    names
        .iter()
        .map(|name| match kps.get(name.as_ref()) {
            Some(kp) if kp.is_confident(threshold) => 1,
            _ => 0,
        })
        .collect()
}

/// The measurements to take from each pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Keypoint pairs whose distance is measured
    #[serde(default)]
    pub segments: Vec<Segment>,

    /// Keypoint triples whose angle is measured
    #[serde(default)]
    pub angles: Vec<Joint>,

    /// Keypoints checked for presence
    #[serde(default)]
    pub presence: Vec<String>,

    /// Score a keypoint must exceed to count as present
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn pair(a: &str, b: &str) -> Segment {
    (a.to_string(), b.to_string())
}

fn triple(a: &str, b: &str, c: &str) -> Joint {
    (a.to_string(), b.to_string(), c.to_string())
}

impl FeatureSet {
    /// Body posture measurements; the limb names are shared by both schemes
    #[must_use]
    pub fn default_for(scheme: KeypointScheme) -> Self {
        Self {
            segments: vec![
                pair("left_shoulder", "right_shoulder"),
                pair("left_hip", "right_hip"),
                pair("left_shoulder", "left_hip"),
                pair("right_shoulder", "right_hip"),
                pair("left_shoulder", "left_elbow"),
                pair("left_elbow", "left_wrist"),
                pair("right_shoulder", "right_elbow"),
                pair("right_elbow", "right_wrist"),
                pair("left_hip", "left_knee"),
                pair("left_knee", "left_ankle"),
                pair("right_hip", "right_knee"),
                pair("right_knee", "right_ankle"),
            ],
            angles: vec![
                triple("left_shoulder", "left_elbow", "left_wrist"),
                triple("right_shoulder", "right_elbow", "right_wrist"),
                triple("left_shoulder", "left_hip", "left_knee"),
                triple("right_shoulder", "right_hip", "right_knee"),
                triple("left_hip", "left_knee", "left_ankle"),
                triple("right_hip", "right_knee", "right_ankle"),
            ],
            presence: scheme.names().iter().map(|n| (*n).to_string()).collect(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Column labels in row order: segments, then angles, then presence
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        let segments = self.segments.iter().map(|(a, b)| format!("len:{a}-{b}"));
        let angles = self.angles.iter().map(|(a, b, c)| format!("angle:{a}-{b}-{c}"));
        let presence = self.presence.iter().map(|n| format!("present:{n}"));
        segments.chain(angles).chain(presence).collect()
    }

    /// Total number of columns
    #[must_use]
    pub fn width(&self) -> usize {
        self.segments.len() + self.angles.len() + self.presence.len()
    }

    /// Names referenced by the set that `scheme` does not define
    #[must_use]
    pub fn unknown_names(&self, scheme: KeypointScheme) -> Vec<String> {
        let referenced = self
            .segments
            .iter()
            .flat_map(|(a, b)| [a, b])
            .chain(self.angles.iter().flat_map(|(a, b, c)| [a, b, c]))
            .chain(self.presence.iter());

        let mut unknown: Vec<String> = referenced
            .filter(|name| scheme.index_of(name).is_none())
            .cloned()
            .collect();
        unknown.sort();
        unknown.dedup();
        unknown
    }

    /// Run every extractor over one pose
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` as the individual extractors do.
    pub fn extract<K: Landmark>(&self, kps: Option<&KeypointMap<K>>) -> Result<FeatureVector> {
        Ok(FeatureVector {
            lengths: segment_lengths(kps, &self.segments)?,
            angles: joint_angles(kps, &self.angles)?,
            presence: presence_flags(kps, &self.presence, self.confidence_threshold),
        })
    }
}

/// Features of one pose, positionally aligned with a [`FeatureSet`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Segment lengths
    pub lengths: Vec<f64>,
    /// Joint angles in radians
    pub angles: Vec<Option<f64>>,
    /// Presence flags
    pub presence: Vec<i8>,
}

impl FeatureVector {
    /// Flatten into a numeric row with sentinels in place of missing values
    #[must_use]
    pub fn to_row(&self) -> Vec<f64> {
        self.lengths
            .iter()
            .copied()
            .chain(self.angles.iter().copied().map(angle_sentinel))
            .chain(self.presence.iter().map(|&p| f64::from(p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::{Keypoint, Keypoint2D, Keypoint3D};
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn map(points: &[(&str, f64, f64, f64)]) -> KeypointMap<Keypoint2D> {
        points
            .iter()
            .map(|&(name, x, y, score)| (name.to_string(), Keypoint2D::new(name, x, y, score)))
            .collect()
    }

    #[test]
    fn test_segment_lengths_basic() {
        let kps = map(&[("a", 0.0, 0.0, 1.0), ("b", 3.0, 4.0, 1.0)]);
        let lengths = segment_lengths(Some(&kps), &[("a", "b"), ("a", "missing"), ("b", "a")]).unwrap();
        assert_eq!(lengths, vec![5.0, SENTINEL, 5.0]);
    }

    #[test]
    fn test_segment_lengths_absent_pose() {
        let lengths = segment_lengths::<Keypoint2D, _>(None, &[("a", "b"), ("c", "d")]).unwrap();
        assert_eq!(lengths, vec![SENTINEL, SENTINEL]);
    }

    #[test]
    fn test_segment_lengths_dimension_mismatch() {
        let mut kps: KeypointMap<Keypoint> = KeypointMap::new();
        kps.insert("a".into(), Keypoint2D::new("a", 0.0, 0.0, 1.0).into());
        kps.insert("b".into(), Keypoint3D::new("b", 1.0, 1.0, 1.0, 1.0).into());
        match segment_lengths(Some(&kps), &[("a", "b")]) {
            Err(Error::DimensionMismatch { left, right }) => assert_eq!((left, right), (2, 3)),
            other => panic!("Expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_segment_lengths_3d() {
        let mut kps3d = KeypointMap::new();
        kps3d.insert("a".to_string(), Keypoint3D::new("a", 0.0, 0.0, 0.0, 1.0));
        kps3d.insert("b".to_string(), Keypoint3D::new("b", 1.0, 2.0, 2.0, 1.0));
        let pose = Pose::new(1.0, KeypointMap::new()).with_3d(kps3d);
        assert_eq!(segment_lengths_3d(Some(&pose), &[("a", "b")]).unwrap(), vec![3.0]);

        let flat = Pose::new(1.0, KeypointMap::new());
        assert_eq!(segment_lengths_3d(Some(&flat), &[("a", "b")]).unwrap(), vec![SENTINEL]);
    }

    #[test]
    fn test_joint_angles_directional() {
        // A→B points right, B→C points down: quarter turn
        let kps = map(&[("a", 0.0, 0.0, 1.0), ("b", 1.0, 0.0, 1.0), ("c", 1.0, 1.0, 1.0)]);
        let angles = joint_angles(Some(&kps), &[("a", "b", "c")]).unwrap();
        assert!((angles[0].unwrap() - FRAC_PI_2).abs() < 1e-12);

        // Straight line continues in the same direction: zero
        let kps = map(&[("a", 0.0, 0.0, 1.0), ("b", 1.0, 0.0, 1.0), ("c", 2.0, 0.0, 1.0)]);
        let angles = joint_angles(Some(&kps), &[("a", "b", "c")]).unwrap();
        assert!(angles[0].unwrap().abs() < 1e-12);

        // Doubling back: pi
        let kps = map(&[("a", 0.0, 0.0, 1.0), ("b", 1.0, 0.0, 1.0), ("c", 0.0, 0.0, 1.0)]);
        let angles = joint_angles(Some(&kps), &[("a", "b", "c")]).unwrap();
        assert!((angles[0].unwrap() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_joint_angles_degenerate_and_missing() {
        let kps = map(&[("a", 1.0, 1.0, 1.0), ("b", 1.0, 1.0, 1.0), ("c", 2.0, 0.0, 1.0)]);
        let angles = joint_angles(Some(&kps), &[("a", "b", "c"), ("a", "x", "c")]).unwrap();
        assert_eq!(angles, vec![None, None]);
        assert_eq!(angle_sentinel(angles[0]), SENTINEL);

        let absent = joint_angles::<Keypoint2D, _>(None, &[("a", "b", "c")]).unwrap();
        assert_eq!(absent, vec![None]);
    }

    #[test]
    fn test_presence_flags() {
        let kps = map(&[("nose", 0.0, 0.0, 0.9), ("left_eye", 0.0, 0.0, 0.5), ("right_eye", 0.0, 0.0, 0.6)]);
        let flags = presence_flags(Some(&kps), &["nose", "left_eye", "right_eye", "left_ear"], 0.6);
        assert_eq!(flags, vec![1, 0, 0, 0]);

        let absent = presence_flags::<Keypoint2D, _>(None, &["nose", "left_eye"], 0.6);
        assert_eq!(absent, vec![PRESENCE_SENTINEL, PRESENCE_SENTINEL]);
    }

    #[test]
    fn test_feature_set_extract_and_row() {
        let set = FeatureSet {
            segments: vec![pair("a", "b")],
            angles: vec![triple("a", "b", "c")],
            presence: vec!["a".to_string(), "z".to_string()],
            confidence_threshold: 0.6,
        };
        let kps = map(&[("a", 0.0, 0.0, 0.9), ("b", 0.0, 10.0, 0.9)]);
        let features = set.extract(Some(&kps)).unwrap();
        assert_eq!(features.to_row(), vec![10.0, SENTINEL, 1.0, 0.0]);
        assert_eq!(set.labels().len(), set.width());
        assert_eq!(set.labels()[0], "len:a-b");
    }

    #[test]
    fn test_default_sets_use_known_names() {
        for scheme in [KeypointScheme::Coco17, KeypointScheme::BlazePose33] {
            let set = FeatureSet::default_for(scheme);
            assert!(set.unknown_names(scheme).is_empty(), "{scheme}");
            assert_eq!(set.presence.len(), scheme.len());
        }
    }

    proptest! {
        #[test]
        fn prop_segment_length_symmetric(
            ax in -1e4f64..1e4, ay in -1e4f64..1e4,
            bx in -1e4f64..1e4, by in -1e4f64..1e4,
        ) {
            let kps = map(&[("a", ax, ay, 1.0), ("b", bx, by, 1.0)]);
            let forward = segment_lengths(Some(&kps), &[("a", "b")]).unwrap();
            let backward = segment_lengths(Some(&kps), &[("b", "a")]).unwrap();
            prop_assert_eq!(forward[0], backward[0]);
            let expected = ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt();
            prop_assert!((forward[0] - expected).abs() <= 1e-9 * expected.max(1.0));
        }

        #[test]
        fn prop_joint_angle_in_range(
            ax in -1000i32..1000, ay in -1000i32..1000,
            bx in -1000i32..1000, by in -1000i32..1000,
            cx in -1000i32..1000, cy in -1000i32..1000,
        ) {
            let (ax, ay, bx, by, cx, cy) =
                (f64::from(ax), f64::from(ay), f64::from(bx), f64::from(by), f64::from(cx), f64::from(cy));
            let kps = map(&[("a", ax, ay, 1.0), ("b", bx, by, 1.0), ("c", cx, cy, 1.0)]);
            let angles = joint_angles(Some(&kps), &[("a", "b", "c")]).unwrap();
            let degenerate = (ax == bx && ay == by) || (bx == cx && by == cy);
            match angles[0] {
                Some(angle) => {
                    prop_assert!(!degenerate);
                    prop_assert!((0.0..=PI).contains(&angle));
                }
                None => prop_assert!(degenerate),
            }
        }

        #[test]
        fn prop_output_length_matches_config(n in 0usize..20) {
            let kps = map(&[("a", 0.0, 0.0, 1.0)]);
            let pairs: Vec<(String, String)> = (0..n).map(|i| (format!("k{i}"), "a".to_string())).collect();
            let names: Vec<String> = (0..n).map(|i| format!("k{i}")).collect();
            let lengths = segment_lengths(Some(&kps), &pairs).unwrap();
            prop_assert_eq!(lengths.len(), n);
            prop_assert!(lengths.iter().all(|&l| l == SENTINEL));
            prop_assert_eq!(presence_flags(Some(&kps), &names, 0.6).len(), n);
        }
    }
}
