//! Command implementations for the pose-sync binary.

use crate::{
    config::{Config, EXAMPLE_CONFIG},
    error::{Error, Result},
    features::FeatureSet,
    keypoint::Landmark,
    parser::{self, ParsedLog, TemporalScheme},
    report::FeatureTable,
    video,
};
use log::{info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Feature table output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma separated values
    Csv,
    /// Pretty printed JSON
    Json,
}

/// Work the application can be asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Describe a prediction log, optionally against a video's duration
    Summary {
        /// Prediction log path
        log: PathBuf,
        /// Video the log was recorded against
        video: Option<PathBuf>,
    },
    /// Print the keypoints a model recorded nearest to a key
    Lookup {
        /// Prediction log path
        log: PathBuf,
        /// Model identifier
        model: String,
        /// Requested timestamp or frame number
        key: f64,
        /// Multiplier applied to `key` before lookup (video to log frames)
        factor: Option<f64>,
    },
    /// Extract a feature table for one model
    Features {
        /// Prediction log path
        log: PathBuf,
        /// Model identifier
        model: String,
        /// Requested keys; every archive key when empty
        at: Vec<f64>,
        /// Output file; stdout when absent
        output: Option<PathBuf>,
        /// Output format
        format: OutputFormat,
        /// Print per-column statistics
        stats: bool,
    },
    /// Convert a WebM recording to MP4
    Convert {
        /// Source recording
        source: PathBuf,
        /// Destination; the source with an `.mp4` extension when absent
        destination: Option<PathBuf>,
    },
    /// Print a media file's duration
    Duration {
        /// Media file
        video: PathBuf,
    },
    /// Write the example configuration
    InitConfig {
        /// Destination path
        path: PathBuf,
        /// Overwrite an existing file
        force: bool,
    },
}

/// Application state shared by all commands
pub struct PoseSyncApp {
    config: Config,
}

impl PoseSyncApp {
    /// Create the application, rejecting invalid configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        info!(
            "Using {} keyed logs with {} keypoints",
            config.parser.scheme, config.features.keypoint_scheme
        );
        Ok(Self { config })
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a command, writing human-readable output to `out`
    pub fn run<W: Write>(&self, command: &Command, out: &mut W) -> Result<()> {
        match command {
            Command::Summary { log, video } => self.summary(log, video.as_deref(), out),
            Command::Lookup { log, model, key, factor } => self.lookup(log, model, *key, *factor, out),
            Command::Features {
                log,
                model,
                at,
                output,
                format,
                stats,
            } => self.features(log, model, at, output.as_deref(), *format, *stats, out),
            Command::Convert { source, destination } => self.convert(source, destination.as_deref(), out),
            Command::Duration { video } => {
                let duration = video::probe_duration(video, &self.config.video)?;
                writeln!(out, "{duration}")?;
                Ok(())
            }
            Command::InitConfig { path, force } => init_config(path, *force, out),
        }
    }

    fn load(&self, log: &Path) -> Result<ParsedLog> {
        info!("Loading prediction log: {}", log.display());
        parser::load(log, self.config.parser.scheme)
    }

    fn summary<W: Write>(&self, log: &Path, video_path: Option<&Path>, out: &mut W) -> Result<()> {
        let parsed = self.load(log)?;
        let archive = &parsed.archive;

        writeln!(out, "Log:        {}", log.display())?;
        writeln!(out, "Scheme:     {}", archive.scheme())?;
        writeln!(out, "Records:    {} ({} duplicates dropped)", parsed.record_count, parsed.duplicate_count)?;
        writeln!(out, "Keys:       {}", archive.len())?;
        if let (Some(min), Some(max)) = (parsed.min_key, parsed.max_key) {
            writeln!(out, "Range:      {min} .. {max} (span {})", max - min)?;
        }
        writeln!(out, "Models:     {}", archive.model_ids().join(", "))?;

        let Some(video_path) = video_path else {
            return Ok(());
        };

        let duration = video::probe_duration(video_path, &self.config.video)?;
        writeln!(out, "Video:      {duration}s")?;

        match (archive.scheme(), parsed.max_key) {
            (TemporalScheme::Timestamp, Some(max_key)) => {
                let gap = duration - max_key;
                writeln!(out, "Gap:        {gap}s between video end and last prediction")?;
                if gap.abs() > self.config.alignment.timestamp_tolerance {
                    warn!("Video and log durations differ by {gap}s");
                }
            }
            (TemporalScheme::FrameIndex, Some(max_key)) => self.frame_summary(video_path, max_key, out)?,
            (_, None) => warn!("Log is empty; nothing to compare against the video"),
        }

        Ok(())
    }

    #[cfg(feature = "video")]
    fn frame_summary<W: Write>(&self, video_path: &Path, max_key: f64, out: &mut W) -> Result<()> {
        let playable = video::ensure_mp4(video_path, &self.config.video)?;
        let frames = video::frame_count(&playable, false)?;
        let factor = crate::alignment::conversion_factor(max_key, frames)?;
        writeln!(out, "Frames:     {frames}")?;
        writeln!(out, "Factor:     {factor} log frames per video frame")?;
        Ok(())
    }

    #[cfg(not(feature = "video"))]
    fn frame_summary<W: Write>(&self, _video_path: &Path, _max_key: f64, _out: &mut W) -> Result<()> {
        warn!("Frame counting requires the `video` feature; skipping conversion factor");
        Ok(())
    }

    fn lookup<W: Write>(&self, log: &Path, model: &str, key: f64, factor: Option<f64>, out: &mut W) -> Result<()> {
        let parsed = self.load(log)?;
        let aligner = self.config.aligner();
        let found = match factor {
            Some(factor) => aligner.lookup_scaled(&parsed.archive, key, factor, model)?,
            None => aligner.lookup(&parsed.archive, key, model)?,
        };

        let Some(found) = found else {
            writeln!(out, "No pose for model '{model}' near {key}")?;
            return Ok(());
        };

        writeln!(
            out,
            "Requested {} matched {} (offset {}{})",
            found.requested,
            found.matched_key,
            found.offset,
            if found.flagged { ", beyond tolerance" } else { "" }
        )?;
        writeln!(out, "Detections: {}, pose score {}", found.detections, found.pose().score)?;
        for kp in found.keypoints().values() {
            writeln!(out, "{:<16} {:>10.2} {:>10.2} {:>6.3}", kp.name(), kp.x(), kp.y(), kp.score())?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn features<W: Write>(
        &self,
        log: &Path,
        model: &str,
        at: &[f64],
        output: Option<&Path>,
        format: OutputFormat,
        stats: bool,
        out: &mut W,
    ) -> Result<()> {
        let parsed = self.load(log)?;
        let set: FeatureSet = self.config.features.feature_set();

        if !parsed.archive.model_ids().iter().any(|m| m == model) {
            warn!("Model '{model}' does not appear in the log; every row will be sentinel");
        }

        let table = if at.is_empty() {
            FeatureTable::build(&parsed.archive, model, &set)?
        } else {
            FeatureTable::build_aligned(&parsed.archive, at.iter().copied(), &self.config.aligner(), model, &set)?
        };

        match (format, output) {
            (OutputFormat::Csv, Some(path)) => table.save_csv(path)?,
            (OutputFormat::Csv, None) => table.write_csv(&mut *out)?,
            (OutputFormat::Json, Some(path)) => {
                std::fs::write(path, table.to_json()?)?;
                info!("Wrote {} rows to {}", table.rows.len(), path.display());
            }
            (OutputFormat::Json, None) => writeln!(out, "{}", table.to_json()?)?,
        }

        if stats {
            for (label, column) in table.column_statistics() {
                match column {
                    Some(s) => writeln!(
                        out,
                        "{label}: n={} mean={:.4} std={:.4} min={:.4} max={:.4}",
                        s.count, s.mean, s.std_dev, s.min, s.max
                    )?,
                    None => writeln!(out, "{label}: no data")?,
                }
            }
        }

        Ok(())
    }

    fn convert<W: Write>(&self, source: &Path, destination: Option<&Path>, out: &mut W) -> Result<()> {
        let destination = destination.map_or_else(|| source.with_extension("mp4"), Path::to_path_buf);
        if destination == source {
            return Err(Error::InvalidInput(format!(
                "Destination equals source: {}",
                source.display()
            )));
        }
        video::convert_webm_to_mp4(source, &destination, &self.config.video)?;
        writeln!(out, "{}", destination.display())?;
        Ok(())
    }
}

/// Write the example configuration to `path`
fn init_config<W: Write>(path: &Path, force: bool, out: &mut W) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::InvalidInput(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    std::fs::write(path, EXAMPLE_CONFIG)?;
    writeln!(out, "Wrote example configuration to {}", path.display())?;
    Ok(())
}
