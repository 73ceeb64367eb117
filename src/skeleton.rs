//! Keypoint vocabularies and skeleton connection tables.
//!
//! Two naming schemes are in use by the supported models: the 17-point COCO
//! layout (`MoveNet`, `PoseNet`) and the 33-point `BlazePose` layout. The
//! tables are exposed through [`KeypointScheme`] so feature extraction and
//! drawing can take the scheme as a parameter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 17-point COCO keypoint names, indexed by position
pub const COCO_17_NAMES: [&str; 17] = [
    "nose",
    "left_eye",
    "right_eye",
    "left_ear",
    "right_ear",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
];

/// Skeleton connections for the 17-point layout
pub const COCO_17_CONNECTIONS: [(usize, usize); 16] = [
    // face
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    // arms
    (5, 6),
    (5, 7),
    (7, 9),
    (6, 8),
    (8, 10),
    // torso
    (5, 11),
    (6, 12),
    (11, 12),
    // legs
    (11, 13),
    (13, 15),
    (12, 14),
    (14, 16),
];

/// 33-point `BlazePose` keypoint names, indexed by position
pub const BLAZEPOSE_33_NAMES: [&str; 33] = [
    "nose",
    "left_eye_inner",
    "left_eye",
    "left_eye_outer",
    "right_eye_inner",
    "right_eye",
    "right_eye_outer",
    "left_ear",
    "right_ear",
    "mouth_left",
    "mouth_right",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_pinky",
    "right_pinky",
    "left_index",
    "right_index",
    "left_thumb",
    "right_thumb",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
    "left_heel",
    "right_heel",
    "left_foot_index",
    "right_foot_index",
];

/// Skeleton connections for the 33-point layout
pub const BLAZEPOSE_33_CONNECTIONS: [(usize, usize); 35] = [
    // face
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 7),
    (0, 4),
    (4, 5),
    (5, 6),
    (6, 8),
    (9, 10),
    // arms and hands
    (11, 12),
    (11, 13),
    (13, 15),
    (15, 17),
    (15, 19),
    (15, 21),
    (17, 19),
    (12, 14),
    (14, 16),
    (16, 18),
    (16, 20),
    (16, 22),
    (18, 20),
    // torso
    (11, 23),
    (12, 24),
    (23, 24),
    // legs and feet
    (23, 25),
    (24, 26),
    (25, 27),
    (26, 28),
    (27, 29),
    (28, 30),
    (29, 31),
    (30, 32),
    (27, 31),
    (28, 32),
];

/// Keypoint naming scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypointScheme {
    /// 17-point COCO layout
    Coco17,
    /// 33-point `BlazePose` layout
    BlazePose33,
}

impl KeypointScheme {
    /// Keypoint names in index order
    #[must_use]
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Self::Coco17 => &COCO_17_NAMES,
            Self::BlazePose33 => &BLAZEPOSE_33_NAMES,
        }
    }

    /// Number of keypoints in the scheme
    #[must_use]
    pub fn len(self) -> usize {
        self.names().len()
    }

    /// Always false; both schemes are non-empty
    #[must_use]
    pub fn is_empty(self) -> bool {
        false
    }

    /// Index of a keypoint name
    #[must_use]
    pub fn index_of(self, name: &str) -> Option<usize> {
        self.names().iter().position(|n| *n == name)
    }

    /// Name at an index
    #[must_use]
    pub fn name_at(self, index: usize) -> Option<&'static str> {
        self.names().get(index).copied()
    }

    /// Skeleton connections as index pairs
    #[must_use]
    pub fn connections(self) -> &'static [(usize, usize)] {
        match self {
            Self::Coco17 => &COCO_17_CONNECTIONS,
            Self::BlazePose33 => &BLAZEPOSE_33_CONNECTIONS,
        }
    }

    /// Skeleton connections as name pairs
    #[must_use]
    pub fn connection_names(self) -> Vec<(&'static str, &'static str)> {
        let names = self.names();
        self.connections()
            .iter()
            .map(|&(a, b)| (names[a], names[b]))
            .collect()
    }

    /// Guess the scheme from the keypoint count a model emitted
    #[must_use]
    pub fn from_keypoint_count(count: usize) -> Option<Self> {
        match count {
            17 => Some(Self::Coco17),
            33 => Some(Self::BlazePose33),
            _ => None,
        }
    }
}

impl fmt::Display for KeypointScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coco17 => write!(f, "coco17"),
            Self::BlazePose33 => write!(f, "blaze_pose33"),
        }
    }
}

impl FromStr for KeypointScheme {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "coco17" | "coco" | "17" | "movenet" | "posenet" => Ok(Self::Coco17),
            "blaze_pose33" | "blazepose33" | "blazepose" | "33" => Ok(Self::BlazePose33),
            _ => Err(crate::Error::InvalidInput(format!("Unknown keypoint scheme: {s}"))),
        }
    }
}
