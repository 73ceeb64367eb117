//! Pose log synchronization tool: inspect prediction logs, align them with
//! video playback, and export pose features.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use pose_sync::{
    app::{Command, OutputFormat, PoseSyncApp},
    config::Config,
    parser::TemporalScheme,
    skeleton::KeypointScheme,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Override the log key field (timestamp, frame_index)
    #[arg(long, global = true)]
    scheme: Option<TemporalScheme>,

    /// Override the keypoint vocabulary (coco17, blaze_pose33)
    #[arg(long, global = true)]
    keypoints: Option<KeypointScheme>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Describe a prediction log
    Summary {
        /// Prediction log (JSON)
        log: PathBuf,

        /// Video the log was recorded against
        #[arg(short, long)]
        video: Option<PathBuf>,
    },

    /// Print the pose a model recorded nearest to a timestamp or frame
    Lookup {
        /// Prediction log (JSON)
        log: PathBuf,

        /// Model identifier
        #[arg(short, long)]
        model: String,

        /// Requested timestamp or frame number
        #[arg(short, long, allow_negative_numbers = true)]
        at: f64,

        /// Scale the request by this factor (video frames to log frames)
        #[arg(long)]
        factor: Option<f64>,
    },

    /// Export a feature table for one model
    Features {
        /// Prediction log (JSON)
        log: PathBuf,

        /// Model identifier
        #[arg(short, long)]
        model: String,

        /// Align to these keys instead of using every log key
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        at: Vec<f64>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,

        /// Print per-column statistics
        #[arg(long)]
        stats: bool,
    },

    /// Convert a WebM recording to MP4
    Convert {
        /// Source recording
        source: PathBuf,

        /// Destination (source with .mp4 extension when omitted)
        destination: Option<PathBuf>,
    },

    /// Print a media file's duration in seconds
    Duration {
        /// Media file
        video: PathBuf,
    },

    /// Write an example configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = "pose-sync.yaml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => OutputFormat::Csv,
            Format::Json => OutputFormat::Json,
        }
    }
}

impl From<Cmd> for Command {
    fn from(cmd: Cmd) -> Self {
        match cmd {
            Cmd::Summary { log, video } => Command::Summary { log, video },
            Cmd::Lookup { log, model, at, factor } => Command::Lookup {
                log,
                model,
                key: at,
                factor,
            },
            Cmd::Features {
                log,
                model,
                at,
                output,
                format,
                stats,
            } => Command::Features {
                log,
                model,
                at,
                output,
                format: format.into(),
                stats,
            },
            Cmd::Convert { source, destination } => Command::Convert { source, destination },
            Cmd::Duration { video } => Command::Duration { video },
            Cmd::InitConfig { path, force } => Command::InitConfig { path, force },
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("pose-sync {}", env!("CARGO_PKG_VERSION"));

    // Load configuration if provided
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("Failed to load config file: {}. Using defaults.", e);
                    Config::default()
                }
            }
        }
        None => Config::default(),
    };

    if let Some(scheme) = args.scheme {
        config.parser.scheme = scheme;
    }
    if let Some(keypoints) = args.keypoints {
        config.features.keypoint_scheme = keypoints;
    }

    let app = PoseSyncApp::new(config).context("Invalid configuration")?;
    let command = Command::from(args.command);

    let stdout = std::io::stdout();
    app.run(&command, &mut stdout.lock())
        .with_context(|| format!("Command failed: {command:?}"))?;

    Ok(())
}
