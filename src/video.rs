//! Video glue: external encoder and prober invocations, and, with the
//! `video` feature, `OpenCV` frame access and pose overlays.

use crate::{config::VideoConfig, Error, Result};
use log::{debug, info};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Run an external tool to completion, failing on spawn error or non-zero exit
fn run_tool<I, S>(program: &str, args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program).args(args).output().map_err(|e| Error::ExternalTool {
        tool: program.to_string(),
        message: format!("failed to execute: {e}"),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::ExternalTool {
            tool: program.to_string(),
            message: format!("{}: {}", output.status, stderr.trim()),
        });
    }

    Ok(output)
}

/// Re-encode a WebM recording as H.264/AAC MP4
///
/// # Errors
///
/// Returns `ExternalTool` if the encoder cannot be run or exits non-zero.
pub fn convert_webm_to_mp4<P: AsRef<Path>, Q: AsRef<Path>>(source: P, destination: Q, config: &VideoConfig) -> Result<()> {
    let (source, destination) = (source.as_ref(), destination.as_ref());
    info!("Converting {} to {}", source.display(), destination.display());

    run_tool(
        &config.ffmpeg,
        [
            OsStr::new("-y"),
            OsStr::new("-i"),
            source.as_os_str(),
            OsStr::new("-c:v"),
            OsStr::new("libx264"),
            OsStr::new("-preset"),
            OsStr::new("fast"),
            OsStr::new("-c:a"),
            OsStr::new("aac"),
            destination.as_os_str(),
        ],
    )?;
    Ok(())
}

/// Return a path the frame readers can open, converting `.webm` files to a
/// sibling `.mp4` first
///
/// # Errors
///
/// As [`convert_webm_to_mp4`].
pub fn ensure_mp4<P: AsRef<Path>>(path: P, config: &VideoConfig) -> Result<PathBuf> {
    let path = path.as_ref();
    let is_webm = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("webm"));

    if !is_webm {
        return Ok(path.to_path_buf());
    }

    let converted = path.with_extension("mp4");
    convert_webm_to_mp4(path, &converted, config)?;
    Ok(converted)
}

/// Media duration in seconds as reported by the prober
///
/// # Errors
///
/// Returns `ExternalTool` if the prober fails or prints something that is
/// not a number.
pub fn probe_duration<P: AsRef<Path>>(path: P, config: &VideoConfig) -> Result<f64> {
    let path = path.as_ref();
    let output = run_tool(
        &config.ffprobe,
        [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-show_entries"),
            OsStr::new("format=duration"),
            OsStr::new("-of"),
            OsStr::new("default=noprint_wrappers=1:nokey=1"),
            path.as_os_str(),
        ],
    )?;

    let duration = parse_duration(&String::from_utf8_lossy(&output.stdout)).map_err(|message| Error::ExternalTool {
        tool: config.ffprobe.clone(),
        message,
    })?;
    debug!("{} lasts {duration}s", path.display());
    Ok(duration)
}

/// Parse the prober's duration output
fn parse_duration(stdout: &str) -> std::result::Result<f64, String> {
    let trimmed = stdout.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| format!("unexpected duration output: '{trimmed}'"))
}

/// Playback time in seconds of a 1-based frame number
///
/// # Errors
///
/// Returns `InvalidInput` for a non-positive frame rate.
#[allow(clippy::cast_precision_loss)]
pub fn frame_to_timestamp(frame_number: u64, fps: f64) -> Result<f64> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(Error::InvalidInput(format!("Invalid frame rate: {fps}")));
    }
    Ok(frame_number.saturating_sub(1) as f64 / fps)
}

#[cfg(feature = "video")]
pub use frames::{draw_pose, frame_at, frame_count, frame_rate};

#[cfg(feature = "video")]
mod frames {
    use crate::{
        constants::{KEYPOINT_RADIUS, SKELETON_THICKNESS},
        keypoint::Landmark,
        pose::KeypointMap,
        skeleton::KeypointScheme,
        Error, Result,
    };
    use opencv::{
        core::{Mat, Point, Scalar},
        imgproc::{self, FILLED, LINE_8},
        prelude::*,
        videoio::{self, VideoCapture},
    };
    use std::path::Path;

    fn open(path: &Path) -> Result<VideoCapture> {
        let name = path
            .to_str()
            .ok_or_else(|| Error::InvalidInput(format!("Non UTF-8 video path: {}", path.display())))?;
        let cap = VideoCapture::from_file(name, videoio::CAP_ANY)?;
        if !cap.is_opened()? {
            return Err(Error::InvalidInput(format!("Cannot open video: {}", path.display())));
        }
        Ok(cap)
    }

    /// Number of frames, decoded one by one when `manual` is set, otherwise
    /// taken from the container metadata (falling back to decoding when the
    /// container reports nothing)
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the file cannot be opened, or `OpenCV` on
    /// decode failure.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn frame_count<P: AsRef<Path>>(path: P, manual: bool) -> Result<u64> {
        let mut cap = open(path.as_ref())?;

        if !manual {
            let reported = cap.get(videoio::CAP_PROP_FRAME_COUNT)?;
            if reported.is_finite() && reported > 0.0 {
                return Ok(reported as u64);
            }
            log::debug!("Container reports no frame count, decoding instead");
        }

        let mut frame = Mat::default();
        let mut frames = 0;
        while cap.read(&mut frame)? {
            frames += 1;
        }
        Ok(frames)
    }

    /// Frames per second reported by the container
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the file cannot be opened.
    pub fn frame_rate<P: AsRef<Path>>(path: P) -> Result<f64> {
        let cap = open(path.as_ref())?;
        Ok(cap.get(videoio::CAP_PROP_FPS)?)
    }

    /// Decode the frame at a 1-based frame number; `None` past the end
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the file cannot be opened.
    #[allow(clippy::cast_precision_loss)]
    pub fn frame_at<P: AsRef<Path>>(path: P, frame_number: u64) -> Result<Option<Mat>> {
        let mut cap = open(path.as_ref())?;
        cap.set(videoio::CAP_PROP_POS_FRAMES, frame_number.saturating_sub(1) as f64)?;

        let mut frame = Mat::default();
        if cap.read(&mut frame)? && !frame.empty() {
            Ok(Some(frame))
        } else {
            Ok(None)
        }
    }

    /// Draw keypoint dots and skeleton lines onto a frame
    ///
    /// Keypoints scoring at or below `min_confidence` are skipped, as are
    /// connections with a skipped end.
    ///
    /// # Errors
    ///
    /// Returns `OpenCV` if drawing fails.
    pub fn draw_pose(frame: &mut Mat, kps: &KeypointMap, scheme: KeypointScheme, min_confidence: f64) -> Result<()> {
        let dot = Scalar::new(0.0, 0.0, 255.0, 0.0);
        let bone = Scalar::new(0.0, 255.0, 0.0, 0.0);

        let visible = |name: &str| kps.get(name).filter(|kp| kp.score() > min_confidence);

        for kp in kps.values().filter(|kp| kp.score() > min_confidence) {
            let (x, y) = kp.to_pixel();
            imgproc::circle(frame, Point::new(x, y), KEYPOINT_RADIUS, dot, FILLED, LINE_8, 0)?;
        }

        for (start, end) in scheme.connection_names() {
            if let (Some(a), Some(b)) = (visible(start), visible(end)) {
                let (ax, ay) = a.to_pixel();
                let (bx, by) = b.to_pixel();
                imgproc::line(frame, Point::new(ax, ay), Point::new(bx, by), bone, SKELETON_THICKNESS, LINE_8, 0)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.345000\n").unwrap(), 12.345);
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-1").is_err());
    }

    #[test]
    fn test_frame_to_timestamp() {
        assert_eq!(frame_to_timestamp(1, 30.0).unwrap(), 0.0);
        assert_eq!(frame_to_timestamp(61, 60.0).unwrap(), 1.0);
        assert!(frame_to_timestamp(10, 0.0).is_err());
        assert!(frame_to_timestamp(10, f64::NAN).is_err());
    }

    #[test]
    fn test_ensure_mp4_passes_through_other_formats() {
        let config = VideoConfig::default();
        let path = ensure_mp4("clip.mov", &config).unwrap();
        assert_eq!(path, PathBuf::from("clip.mov"));
    }

    #[test]
    fn test_missing_tool_is_external_failure() {
        let config = VideoConfig {
            ffmpeg: "definitely-not-an-encoder".to_string(),
            ffprobe: "definitely-not-a-prober".to_string(),
        };
        assert!(matches!(
            probe_duration("clip.mp4", &config),
            Err(Error::ExternalTool { ref tool, .. }) if tool == "definitely-not-a-prober"
        ));
        assert!(matches!(
            convert_webm_to_mp4("a.webm", "a.mp4", &config),
            Err(Error::ExternalTool { .. })
        ));
    }
}
