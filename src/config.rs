//! Configuration management for pose synchronization runs

use crate::{
    constants::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_FFMPEG, DEFAULT_FFPROBE, DEFAULT_FRAME_TOLERANCE, DEFAULT_TIMESTAMP_TOLERANCE},
    features::{FeatureSet, Joint, Segment},
    parser::TemporalScheme,
    skeleton::KeypointScheme,
    alignment::Aligner,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log parsing configuration
    pub parser: ParserConfig,

    /// Alignment tolerances
    pub alignment: AlignmentConfig,

    /// Feature extraction configuration
    pub features: FeatureConfig,

    /// External tool configuration
    pub video: VideoConfig,
}

/// Log parsing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Field the log is keyed by
    pub scheme: TemporalScheme,
}

/// Alignment tolerances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Offset in seconds above which timestamp matches are flagged
    pub timestamp_tolerance: f64,

    /// Offset in frames above which frame-index matches are flagged
    pub frame_tolerance: f64,
}

/// Feature extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Keypoint naming scheme of the model being analysed
    pub keypoint_scheme: KeypointScheme,

    /// Score a keypoint must exceed to count as present
    pub confidence_threshold: f64,

    /// Custom segment pairs; the scheme's defaults when absent
    pub segments: Option<Vec<Segment>>,

    /// Custom angle triples; the scheme's defaults when absent
    pub angles: Option<Vec<Joint>>,

    /// Custom presence names; every scheme keypoint when absent
    pub presence: Option<Vec<String>>,
}

/// External tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Encoder executable
    pub ffmpeg: String,

    /// Prober executable
    pub ffprobe: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            scheme: TemporalScheme::Timestamp,
        }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            timestamp_tolerance: DEFAULT_TIMESTAMP_TOLERANCE,
            frame_tolerance: DEFAULT_FRAME_TOLERANCE,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            keypoint_scheme: KeypointScheme::Coco17,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            segments: None,
            angles: None,
            presence: None,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffmpeg: DEFAULT_FFMPEG.to_string(),
            ffprobe: DEFAULT_FFPROBE.to_string(),
        }
    }
}

impl AlignmentConfig {
    /// Aligner for the given scheme
    #[must_use]
    pub fn aligner(&self, scheme: TemporalScheme) -> Aligner {
        match scheme {
            TemporalScheme::Timestamp => Aligner::new(self.timestamp_tolerance),
            TemporalScheme::FrameIndex => Aligner::new(self.frame_tolerance),
        }
    }
}

impl FeatureConfig {
    /// Resolve into a feature set, filling gaps from the scheme defaults
    #[must_use]
    pub fn feature_set(&self) -> FeatureSet {
        let defaults = FeatureSet::default_for(self.keypoint_scheme);
        FeatureSet {
            segments: self.segments.clone().unwrap_or(defaults.segments),
            angles: self.angles.clone().unwrap_or(defaults.angles),
            presence: self.presence.clone().unwrap_or(defaults.presence),
            confidence_threshold: self.confidence_threshold,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Aligner for the configured scheme
    #[must_use]
    pub fn aligner(&self) -> Aligner {
        self.alignment.aligner(self.parser.scheme)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.features.confidence_threshold) {
            return Err(Error::ConfigError(
                "Confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        for (name, tolerance) in [
            ("Timestamp", self.alignment.timestamp_tolerance),
            ("Frame", self.alignment.frame_tolerance),
        ] {
            if !(tolerance.is_finite() && tolerance >= 0.0) {
                return Err(Error::ConfigError(format!(
                    "{name} tolerance must be a non-negative number"
                )));
            }
        }

        if self.video.ffmpeg.trim().is_empty() || self.video.ffprobe.trim().is_empty() {
            return Err(Error::ConfigError("Video tool paths must not be empty".to_string()));
        }

        let unknown = self.features.feature_set().unknown_names(self.features.keypoint_scheme);
        if !unknown.is_empty() {
            return Err(Error::ConfigError(format!(
                "Keypoints not defined by {}: {}",
                self.features.keypoint_scheme,
                unknown.join(", ")
            )));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Pose Sync Configuration

# Prediction log parsing
parser:
  # timestamp (timeStamp field) or frame_index (frameIdx field)
  scheme: timestamp

# Alignment tolerances
alignment:
  timestamp_tolerance: 3.0
  frame_tolerance: 10.0

# Feature extraction
features:
  # coco17 or blaze_pose33
  keypoint_scheme: coco17
  confidence_threshold: 0.6
  segments:
    - [left_shoulder, right_shoulder]
    - [left_shoulder, left_hip]
    - [left_hip, left_knee]
  angles:
    - [left_shoulder, left_elbow, left_wrist]
    - [left_hip, left_knee, left_ankle]
  presence: [nose, left_shoulder, right_shoulder, left_hip, right_hip]

# External tools
video:
  ffmpeg: "ffmpeg"
  ffprobe: "ffprobe"
"#;
