//! Constants used throughout the library

/// Placeholder for a feature that cannot be computed (missing keypoint or pose)
pub const SENTINEL: f64 = -1.0;

/// Integer form of [`SENTINEL`] used by presence flags
pub const PRESENCE_SENTINEL: i8 = -1;

/// Default confidence a keypoint must exceed to count as present
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Offset in seconds above which a timestamp match is flagged
pub const DEFAULT_TIMESTAMP_TOLERANCE: f64 = 3.0;

/// Offset in frames above which a frame-index match is flagged
pub const DEFAULT_FRAME_TOLERANCE: f64 = 10.0;

/// JSON field holding a wall-clock timestamp
pub const TIMESTAMP_FIELD: &str = "timeStamp";

/// JSON field holding a frame index
pub const FRAME_INDEX_FIELD: &str = "frameIdx";

/// Default encoder executable
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Default prober executable
pub const DEFAULT_FFPROBE: &str = "ffprobe";

/// Radius of keypoint dots drawn on frames
pub const KEYPOINT_RADIUS: i32 = 1;

/// Thickness of skeleton lines drawn on frames
pub const SKELETON_THICKNESS: i32 = 2;
