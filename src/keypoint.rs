//! Named 2D and 3D keypoints.
//!
//! Both keypoint kinds implement [`Landmark`], which exposes the coordinates
//! as a slice so geometry can be written once for any dimensionality.

use serde::{Deserialize, Serialize};

/// A named point with coordinates and a confidence score
pub trait Landmark {
    /// Keypoint name, unique within a pose
    fn name(&self) -> &str;

    /// Confidence score in `[0, 1]`
    fn score(&self) -> f64;

    /// Coordinate vector (`[x, y]` or `[x, y, z]`)
    fn coords(&self) -> &[f64];

    /// Number of coordinates
    fn dimensions(&self) -> usize {
        self.coords().len()
    }

    /// Whether the score is strictly above `threshold`
    fn is_confident(&self, threshold: f64) -> bool {
        self.score() > threshold
    }
}

/// Planar keypoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint2D {
    /// Landmark name (e.g. `left_shoulder`)
    pub name: String,
    coords: [f64; 2],
    /// Confidence score
    pub score: f64,
}

impl Keypoint2D {
    /// Create a new planar keypoint
    pub fn new(name: impl Into<String>, x: f64, y: f64, score: f64) -> Self {
        Self {
            name: name.into(),
            coords: [x, y],
            score,
        }
    }

    /// Horizontal coordinate
    #[must_use]
    pub fn x(&self) -> f64 {
        self.coords[0]
    }

    /// Vertical coordinate
    #[must_use]
    pub fn y(&self) -> f64 {
        self.coords[1]
    }

    /// Truncate to integer pixel coordinates for drawing
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x() as i32, self.y() as i32)
    }
}

impl Landmark for Keypoint2D {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self) -> f64 {
        self.score
    }

    fn coords(&self) -> &[f64] {
        &self.coords
    }
}

/// Spatial keypoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint3D {
    /// Landmark name
    pub name: String,
    coords: [f64; 3],
    /// Confidence score
    pub score: f64,
}

impl Keypoint3D {
    /// Create a new spatial keypoint
    pub fn new(name: impl Into<String>, x: f64, y: f64, z: f64, score: f64) -> Self {
        Self {
            name: name.into(),
            coords: [x, y, z],
            score,
        }
    }

    /// Horizontal coordinate
    #[must_use]
    pub fn x(&self) -> f64 {
        self.coords[0]
    }

    /// Vertical coordinate
    #[must_use]
    pub fn y(&self) -> f64 {
        self.coords[1]
    }

    /// Depth coordinate
    #[must_use]
    pub fn z(&self) -> f64 {
        self.coords[2]
    }

    /// Drop the depth coordinate
    #[must_use]
    pub fn to_planar(&self) -> Keypoint2D {
        Keypoint2D::new(self.name.clone(), self.x(), self.y(), self.score)
    }
}

impl Landmark for Keypoint3D {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self) -> f64 {
        self.score
    }

    fn coords(&self) -> &[f64] {
        &self.coords
    }
}

/// Either kind of keypoint, for maps that mix 2D and 3D entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Keypoint {
    /// 2D keypoint
    Planar(Keypoint2D),
    /// 3D keypoint
    Spatial(Keypoint3D),
}

impl Landmark for Keypoint {
    fn name(&self) -> &str {
        match self {
            Self::Planar(kp) => kp.name(),
            Self::Spatial(kp) => kp.name(),
        }
    }

    fn score(&self) -> f64 {
        match self {
            Self::Planar(kp) => kp.score,
            Self::Spatial(kp) => kp.score,
        }
    }

    fn coords(&self) -> &[f64] {
        match self {
            Self::Planar(kp) => kp.coords(),
            Self::Spatial(kp) => kp.coords(),
        }
    }
}

impl From<Keypoint2D> for Keypoint {
    fn from(kp: Keypoint2D) -> Self {
        Self::Planar(kp)
    }
}

impl From<Keypoint3D> for Keypoint {
    fn from(kp: Keypoint3D) -> Self {
        Self::Spatial(kp)
    }
}
