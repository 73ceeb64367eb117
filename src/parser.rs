//! Prediction log parsing.
//!
//! A prediction log is a JSON array of groups, each group an array of
//! records shaped like
//!
//! ```json
//! {"timeStamp": 1.25, "frameIdx": 75, "modelId": "movenet",
//!  "poseData": [{"score": 0.8,
//!                "keypoints": [{"name": "nose", "x": 310.2, "y": 88.0, "score": 0.93}],
//!                "keypoints3D": [{"name": "nose", "x": 0.01, "y": -0.6, "z": -0.2, "score": 0.93}]}]}
//! ```
//!
//! Records are keyed either by `timeStamp` or by `frameIdx`; the caller picks
//! the [`TemporalScheme`]. Parsing walks the JSON tree by hand so that every
//! failure names the offending record.

use crate::{
    constants::{DEFAULT_FRAME_TOLERANCE, DEFAULT_TIMESTAMP_TOLERANCE, FRAME_INDEX_FIELD, TIMESTAMP_FIELD},
    keypoint::{Keypoint2D, Keypoint3D},
    pose::{KeypointMap, Pose, PredictionFrame},
    Error, Result,
};
use log::{debug, info};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Totally ordered temporal key
pub type TemporalKey = OrderedFloat<f64>;

/// Poses per model at one temporal key
pub type ModelPoses = BTreeMap<String, Vec<Pose>>;

/// Which record field indexes the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalScheme {
    /// Wall-clock playback time in seconds (`timeStamp`)
    Timestamp,
    /// Capture frame counter (`frameIdx`)
    FrameIndex,
}

impl TemporalScheme {
    /// JSON field holding the key
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            Self::Timestamp => TIMESTAMP_FIELD,
            Self::FrameIndex => FRAME_INDEX_FIELD,
        }
    }

    /// Offset above which an alignment match is flagged
    #[must_use]
    pub fn default_tolerance(self) -> f64 {
        match self {
            Self::Timestamp => DEFAULT_TIMESTAMP_TOLERANCE,
            Self::FrameIndex => DEFAULT_FRAME_TOLERANCE,
        }
    }
}

impl fmt::Display for TemporalScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp => write!(f, "timestamp"),
            Self::FrameIndex => write!(f, "frame_index"),
        }
    }
}

impl FromStr for TemporalScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "timestamp" | "time" | "timestamp_ms" | "ts" => Ok(Self::Timestamp),
            "frame_index" | "frame" | "frameidx" | "frames" => Ok(Self::FrameIndex),
            _ => Err(Error::InvalidInput(format!("Unknown temporal scheme: {s}"))),
        }
    }
}

/// Parsed prediction log: temporal key to model id to poses
#[derive(Debug, Clone, PartialEq)]
pub struct PoseArchive {
    scheme: TemporalScheme,
    pub(crate) entries: BTreeMap<TemporalKey, ModelPoses>,
}

impl PoseArchive {
    /// Create an empty archive
    #[must_use]
    pub fn new(scheme: TemporalScheme) -> Self {
        Self {
            scheme,
            entries: BTreeMap::new(),
        }
    }

    /// Build an archive from frames; the first frame for a (key, model) pair wins
    pub fn from_frames<I>(scheme: TemporalScheme, frames: I) -> Self
    where
        I: IntoIterator<Item = PredictionFrame>,
    {
        let mut archive = Self::new(scheme);
        for frame in frames {
            archive.insert(frame.key, frame.model_id, frame.poses);
        }
        archive
    }

    /// Store poses unless the slot is already taken; returns whether it was stored
    fn insert(&mut self, key: f64, model_id: String, poses: Vec<Pose>) -> bool {
        let models = self.entries.entry(OrderedFloat(key)).or_default();
        if models.contains_key(&model_id) {
            return false;
        }
        models.insert(model_id, poses);
        true
    }

    /// Scheme the archive was parsed with
    #[must_use]
    pub fn scheme(&self) -> TemporalScheme {
        self.scheme
    }

    /// Number of distinct temporal keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no keys were recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Temporal keys in ascending order
    pub fn keys(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.keys().map(|k| k.0)
    }

    /// Smallest key
    #[must_use]
    pub fn min_key(&self) -> Option<f64> {
        self.entries.keys().next().map(|k| k.0)
    }

    /// Largest key
    #[must_use]
    pub fn max_key(&self) -> Option<f64> {
        self.entries.keys().next_back().map(|k| k.0)
    }

    /// Distance between the smallest and largest key
    #[must_use]
    pub fn span(&self) -> Option<f64> {
        Some(self.max_key()? - self.min_key()?)
    }

    /// Models recorded at exactly `key`
    #[must_use]
    pub fn models_at(&self, key: f64) -> Option<&ModelPoses> {
        self.entries.get(&OrderedFloat(key))
    }

    /// Poses of `model_id` at exactly `key`
    #[must_use]
    pub fn poses(&self, key: f64, model_id: &str) -> Option<&[Pose]> {
        self.models_at(key)
            .and_then(|models| models.get(model_id))
            .map(Vec::as_slice)
    }

    /// Every model id in the archive, sorted
    #[must_use]
    pub fn model_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .values()
            .flat_map(|models| models.keys().cloned())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Every stored entry as a prediction frame, in key then model order
    pub fn frames(&self) -> impl Iterator<Item = PredictionFrame> + '_ {
        self.entries.iter().flat_map(|(key, models)| {
            models.iter().map(move |(model_id, poses)| PredictionFrame {
                key: key.0,
                model_id: model_id.clone(),
                poses: poses.clone(),
            })
        })
    }
}

/// Result of parsing one log
#[derive(Debug, Clone)]
pub struct ParsedLog {
    /// The archive
    pub archive: PoseArchive,
    /// Largest key observed, `None` for an empty log
    pub max_key: Option<f64>,
    /// Smallest key observed, `None` for an empty log
    pub min_key: Option<f64>,
    /// Records read, including dropped duplicates
    pub record_count: usize,
    /// Records dropped because their (key, model) slot was already filled
    pub duplicate_count: usize,
}

impl ParsedLog {
    /// Split into the archive and the largest key
    #[must_use]
    pub fn into_parts(self) -> (PoseArchive, Option<f64>) {
        (self.archive, self.max_key)
    }

    /// Recorded duration covered by the log
    #[must_use]
    pub fn recorded_span(&self) -> Option<f64> {
        Some(self.max_key? - self.min_key?)
    }
}

/// Parse a prediction log held as a JSON value
///
/// # Errors
///
/// Returns `Parse` when a record lacks a required field and `Value` when a
/// field has the wrong type.
pub fn parse(log: &Value, scheme: TemporalScheme) -> Result<ParsedLog> {
    let groups = log
        .as_array()
        .ok_or_else(|| Error::value("log", format!("expected an array of groups, found {}", kind(log))))?;

    let mut archive = PoseArchive::new(scheme);
    let mut max_key: Option<f64> = None;
    let mut min_key: Option<f64> = None;
    let mut record_count = 0;
    let mut duplicate_count = 0;

    for (group_idx, group) in groups.iter().enumerate() {
        let group_loc = format!("log[{group_idx}]");
        let records = group
            .as_array()
            .ok_or_else(|| Error::value(&group_loc, format!("expected an array of records, found {}", kind(group))))?;

        for (record_idx, record) in records.iter().enumerate() {
            let loc = format!("{group_loc}[{record_idx}]");
            let frame = parse_record(record, &loc, scheme)?;
            record_count += 1;

            max_key = Some(max_key.map_or(frame.key, |m| m.max(frame.key)));
            min_key = Some(min_key.map_or(frame.key, |m| m.min(frame.key)));

            let key = frame.key;
            let model_id = frame.model_id.clone();
            if !archive.insert(frame.key, frame.model_id, frame.poses) {
                duplicate_count += 1;
                debug!("Dropping duplicate entry for model '{model_id}' at {scheme} {key} ({loc})");
            }
        }
    }

    info!(
        "Parsed {} records into {} {} keys ({} duplicates dropped)",
        record_count,
        archive.len(),
        scheme,
        duplicate_count
    );

    Ok(ParsedLog {
        archive,
        max_key,
        min_key,
        record_count,
        duplicate_count,
    })
}

/// Parse a prediction log from JSON text
///
/// # Errors
///
/// Returns `Json` for malformed text, otherwise as [`parse`].
pub fn parse_str(text: &str, scheme: TemporalScheme) -> Result<ParsedLog> {
    let value: Value = serde_json::from_str(text)?;
    parse(&value, scheme)
}

/// Read and parse a prediction log file
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, otherwise as [`parse_str`].
pub fn load<P: AsRef<Path>>(path: P, scheme: TemporalScheme) -> Result<ParsedLog> {
    info!("Loading prediction log from {}", path.as_ref().display());
    let text = std::fs::read_to_string(path)?;
    parse_str(&text, scheme)
}

/// Parse one record into a prediction frame
pub fn parse_record(record: &Value, loc: &str, scheme: TemporalScheme) -> Result<PredictionFrame> {
    let obj = object(record, loc)?;

    let key = number(required(obj, loc, scheme.field())?, &format!("{loc}.{}", scheme.field()))?;
    let model_id = string(required(obj, loc, "modelId")?, &format!("{loc}.modelId"))?;

    let pose_loc = format!("{loc}.poseData");
    let poses = array(required(obj, loc, "poseData")?, &pose_loc)?
        .iter()
        .enumerate()
        .map(|(idx, pose)| parse_pose(pose, &format!("{pose_loc}[{idx}]")))
        .collect::<Result<Vec<_>>>()?;

    Ok(PredictionFrame { key, model_id, poses })
}

fn parse_pose(pose: &Value, loc: &str) -> Result<Pose> {
    let obj = object(pose, loc)?;

    // The browser logger serialises an undefined score as null.
    let score = match required(obj, loc, "score")? {
        Value::Null => 0.0,
        other => number(other, &format!("{loc}.score"))?,
    };

    let kp_loc = format!("{loc}.keypoints");
    let mut keypoints = KeypointMap::new();
    for (idx, kp) in array(required(obj, loc, "keypoints")?, &kp_loc)?.iter().enumerate() {
        let kp = parse_keypoint_2d(kp, &format!("{kp_loc}[{idx}]"))?;
        keypoints.insert(kp.name.clone(), kp);
    }

    let mut parsed = Pose::new(score, keypoints);

    if let Some(raw) = obj.get("keypoints3D").filter(|v| !v.is_null()) {
        let kp3_loc = format!("{loc}.keypoints3D");
        let mut keypoints_3d = KeypointMap::new();
        for (idx, kp) in array(raw, &kp3_loc)?.iter().enumerate() {
            let kp = parse_keypoint_3d(kp, &format!("{kp3_loc}[{idx}]"))?;
            keypoints_3d.insert(kp.name.clone(), kp);
        }
        parsed = parsed.with_3d(keypoints_3d);
    }

    Ok(parsed)
}

fn parse_keypoint_2d(kp: &Value, loc: &str) -> Result<Keypoint2D> {
    let obj = object(kp, loc)?;
    Ok(Keypoint2D::new(
        string(required(obj, loc, "name")?, &format!("{loc}.name"))?,
        number(required(obj, loc, "x")?, &format!("{loc}.x"))?,
        number(required(obj, loc, "y")?, &format!("{loc}.y"))?,
        keypoint_score(obj, loc)?,
    ))
}

fn parse_keypoint_3d(kp: &Value, loc: &str) -> Result<Keypoint3D> {
    let obj = object(kp, loc)?;
    Ok(Keypoint3D::new(
        string(required(obj, loc, "name")?, &format!("{loc}.name"))?,
        number(required(obj, loc, "x")?, &format!("{loc}.x"))?,
        number(required(obj, loc, "y")?, &format!("{loc}.y"))?,
        number(required(obj, loc, "z")?, &format!("{loc}.z"))?,
        keypoint_score(obj, loc)?,
    ))
}

fn keypoint_score(obj: &Map<String, Value>, loc: &str) -> Result<f64> {
    match required(obj, loc, "score")? {
        Value::Null => Ok(0.0),
        other => number(other, &format!("{loc}.score")),
    }
}

fn required<'a>(obj: &'a Map<String, Value>, loc: &str, field: &str) -> Result<&'a Value> {
    obj.get(field).ok_or_else(|| Error::missing(loc, field))
}

fn object<'a>(value: &'a Value, loc: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::value(loc, format!("expected an object, found {}", kind(value))))
}

fn array<'a>(value: &'a Value, loc: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::value(loc, format!("expected an array, found {}", kind(value))))
}

fn number(value: &Value, loc: &str) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| Error::value(loc, format!("expected a number, found {}", kind(value))))
}

fn string(value: &Value, loc: &str) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::value(loc, format!("expected a string, found {}", kind(value))))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
