//! Error types for the pose synchronization library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// A log record is missing a required field
    #[error("Parse error at {location}: missing field `{field}`")]
    Parse {
        /// Path of the record inside the log, e.g. `log[0][2].poseData[1]`
        location: String,
        /// Name of the absent field
        field: String,
    },

    /// A log field is present but has the wrong type or an unusable value
    #[error("Value error at {location}: {message}")]
    Value {
        /// Path of the offending field inside the log
        location: String,
        /// What was wrong with it
        message: String,
    },

    /// Alignment requested against an archive that cannot answer it
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// Geometry requested between keypoints of differing dimensionality
    #[error("Dimension mismatch: {left}D keypoint paired with {right}D keypoint")]
    DimensionMismatch {
        /// Dimensionality of the first keypoint
        left: usize,
        /// Dimensionality of the second keypoint
        right: usize,
    },

    /// An external encoder or prober failed
    #[error("{tool} failed: {message}")]
    ExternalTool {
        /// Executable that was invoked
        tool: String,
        /// Exit status and captured stderr, or the spawn error
        message: String,
    },

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Log text is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Feature table export failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// `OpenCV` operation failed
    #[cfg(feature = "video")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),
}

impl Error {
    /// Shorthand for a missing-field parse error
    pub(crate) fn missing(location: impl Into<String>, field: &str) -> Self {
        Self::Parse {
            location: location.into(),
            field: field.to_string(),
        }
    }

    /// Shorthand for a wrongly-typed field
    pub(crate) fn value(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Value {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
