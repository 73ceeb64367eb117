//! Nearest-key alignment between video playback position and a pose archive.
//!
//! A requested timestamp or frame number is matched to the archive key with
//! the smallest absolute difference. Equidistant keys resolve to the smaller
//! key. Matches further away than the tolerance are still returned but carry
//! a flag and emit a warning.

use crate::{
    parser::{PoseArchive, TemporalKey, TemporalScheme},
    pose::{KeypointMap, Pose},
    Error, Result,
};
use log::{debug, warn};
use ordered_float::OrderedFloat;

/// A successful lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedMatch<'a> {
    /// Key that was asked for
    pub requested: f64,
    /// Archive key that was selected
    pub matched_key: f64,
    /// Absolute distance between the two
    pub offset: f64,
    /// Whether `offset` exceeded the tolerance
    pub flagged: bool,
    /// Number of poses the model recorded at the matched key
    pub detections: usize,
    pose: &'a Pose,
}

impl<'a> AlignedMatch<'a> {
    /// First pose recorded at the matched key; further detections are not
    /// disambiguated
    #[must_use]
    pub fn pose(&self) -> &'a Pose {
        self.pose
    }

    /// 2D keypoints of the first pose
    #[must_use]
    pub fn keypoints(&self) -> &'a KeypointMap {
        &self.pose.keypoints
    }
}

/// Nearest-key lookup with a mismatch tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aligner {
    tolerance: f64,
}

impl Aligner {
    /// Create an aligner flagging offsets above `tolerance`
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Aligner using the scheme's default tolerance
    #[must_use]
    pub fn for_scheme(scheme: TemporalScheme) -> Self {
        Self::new(scheme.default_tolerance())
    }

    /// Tolerance in archive units
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Find the poses of `model_id` nearest to `requested`
    ///
    /// Returns `Ok(None)` when the model recorded nothing at the nearest key.
    ///
    /// # Errors
    ///
    /// Returns `Lookup` for an empty archive and `InvalidInput` for a NaN
    /// request.
    pub fn lookup<'a>(&self, archive: &'a PoseArchive, requested: f64, model_id: &str) -> Result<Option<AlignedMatch<'a>>> {
        let key = nearest_key(archive, requested)?;
        debug!("Alignment requested {requested}, closest {key}");

        let Some(poses) = archive.poses(key, model_id) else {
            debug!("Model '{model_id}' has no entry at {key}");
            return Ok(None);
        };
        let Some(pose) = poses.first() else {
            debug!("Model '{model_id}' recorded no detections at {key}");
            return Ok(None);
        };

        let offset = (key - requested).abs();
        let flagged = offset > self.tolerance;
        if flagged {
            warn!(
                "Difference between requested and returned {} is unexpectedly large: requested {requested}, returned {key} (offset {offset}, tolerance {})",
                archive.scheme(),
                self.tolerance
            );
        }

        Ok(Some(AlignedMatch {
            requested,
            matched_key: key,
            offset,
            flagged,
            detections: poses.len(),
            pose,
        }))
    }

    /// First pose of `model_id` nearest to `requested`
    ///
    /// # Errors
    ///
    /// As [`Aligner::lookup`].
    pub fn lookup_pose<'a>(&self, archive: &'a PoseArchive, requested: f64, model_id: &str) -> Result<Option<&'a Pose>> {
        Ok(self.lookup(archive, requested, model_id)?.map(|m| m.pose()))
    }

    /// Look up a video frame number scaled into archive frame indices
    ///
    /// # Errors
    ///
    /// As [`Aligner::lookup`].
    pub fn lookup_scaled<'a>(
        &self,
        archive: &'a PoseArchive,
        video_frame: f64,
        factor: f64,
        model_id: &str,
    ) -> Result<Option<AlignedMatch<'a>>> {
        self.lookup(archive, video_frame * factor, model_id)
    }
}

/// Look up `model_id` near `requested` with the archive scheme's tolerance
///
/// # Errors
///
/// As [`Aligner::lookup`].
pub fn lookup<'a>(archive: &'a PoseArchive, requested: f64, model_id: &str) -> Result<Option<AlignedMatch<'a>>> {
    Aligner::for_scheme(archive.scheme()).lookup(archive, requested, model_id)
}

/// Archive key closest to `requested`, preferring the smaller key on ties
///
/// # Errors
///
/// Returns `Lookup` for an empty archive and `InvalidInput` for NaN.
pub fn nearest_key(archive: &PoseArchive, requested: f64) -> Result<f64> {
    if requested.is_nan() {
        return Err(Error::InvalidInput("Requested key is NaN".to_string()));
    }
    if archive.is_empty() {
        return Err(Error::Lookup("cannot align against an empty archive".to_string()));
    }

    let target: TemporalKey = OrderedFloat(requested);
    let below = archive.entries.range(..=target).next_back().map(|(k, _)| k.0);
    let above = archive.entries.range(target..).next().map(|(k, _)| k.0);

    match (below, above) {
        (Some(lo), Some(hi)) => Ok(if requested - lo <= hi - requested { lo } else { hi }),
        (Some(key), None) | (None, Some(key)) => Ok(key),
        (None, None) => Err(Error::Lookup("cannot align against an empty archive".to_string())),
    }
}

/// Ratio mapping video frame numbers onto log frame indices
///
/// # Errors
///
/// Returns `InvalidInput` if the video has no frames.
#[allow(clippy::cast_precision_loss)]
pub fn conversion_factor(max_json_frame: f64, max_video_frame: u64) -> Result<f64> {
    if max_video_frame == 0 {
        return Err(Error::InvalidInput("Video reports zero frames".to_string()));
    }
    let factor = max_json_frame / max_video_frame as f64;
    debug!("Conversion factor: max video frame {max_video_frame}, max json frame {max_json_frame}, factor {factor}");
    Ok(factor)
}
