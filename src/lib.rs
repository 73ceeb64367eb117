//! Synchronization of recorded pose-estimation output with video playback.
//!
//! This library turns the JSON prediction logs written by browser pose
//! models into an ordered archive and answers questions against it:
//! - which poses a model recorded nearest to a given playback time or frame
//! - geometric features of those poses (segment lengths, joint angles,
//!   keypoint presence)
//! - per-key feature tables and column statistics for a whole recording
//!
//! External tools (`ffmpeg`, `ffprobe`) handle video conversion and probing;
//! frame access and overlays use `OpenCV` behind the `video` feature.
//!
//! # Examples
//!
//! ## Nearest-pose lookup
//!
//! ```no_run
//! use pose_sync::{alignment, parser::{self, TemporalScheme}};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let parsed = parser::load("predictions.json", TemporalScheme::Timestamp)?;
//! println!("Log spans {:?} seconds", parsed.recorded_span());
//!
//! if let Some(found) = alignment::lookup(&parsed.archive, 12.5, "movenet")? {
//!     if found.flagged {
//!         println!("Nearest pose is {:.2}s away", found.offset);
//!     }
//!     println!("{} keypoints", found.keypoints().len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature extraction
//!
//! ```no_run
//! use pose_sync::{features::FeatureSet, parser::{self, TemporalScheme},
//!                 report::FeatureTable, skeleton::KeypointScheme};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let parsed = parser::load("predictions.json", TemporalScheme::FrameIndex)?;
//! let set = FeatureSet::default_for(KeypointScheme::Coco17);
//!
//! let table = FeatureTable::build(&parsed.archive, "movenet", &set)?;
//! table.save_csv("features.csv")?;
//!
//! for (label, stats) in table.column_statistics() {
//!     if let Some(stats) = stats {
//!         println!("{label}: mean {:.2}, std {:.2}", stats.mean, stats.std_dev);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

/// 2D and 3D keypoints
pub mod keypoint;

/// Poses and prediction frames
pub mod pose;

/// Keypoint vocabularies and skeleton connections
pub mod skeleton;

/// Prediction log parsing
pub mod parser;

/// Nearest-key temporal alignment
pub mod alignment;

/// Geometric pose features
pub mod features;

/// Per-key feature tables
pub mod report;

/// Column statistics
pub mod stats;

/// External video tools and frame access
pub mod video;

/// Command implementations for the binary
pub mod app;

pub use error::{Error, Result};
