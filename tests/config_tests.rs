//! Configuration file tests

use pose_sync::{
    config::{Config, EXAMPLE_CONFIG},
    features::FeatureSet,
    parser::TemporalScheme,
    skeleton::KeypointScheme,
};

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.parser.scheme, TemporalScheme::Timestamp);
    assert_eq!(config.alignment.timestamp_tolerance, 3.0);
    assert_eq!(config.alignment.frame_tolerance, 10.0);
    assert_eq!(config.features.confidence_threshold, 0.6);
    assert_eq!(config.video.ffmpeg, "ffmpeg");
    assert_eq!(config.video.ffprobe, "ffprobe");
    assert!(config.validate().is_ok());
    assert_eq!(config.aligner().tolerance(), 3.0);
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pose-sync.yaml");

    let mut config = Config::default();
    config.parser.scheme = TemporalScheme::FrameIndex;
    config.alignment.frame_tolerance = 4.0;
    config.features.keypoint_scheme = KeypointScheme::BlazePose33;
    config.features.presence = Some(vec!["left_heel".to_string()]);
    config.video.ffmpeg = "/opt/ffmpeg/bin/ffmpeg".to_string();
    config.to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
    assert_eq!(loaded.aligner().tolerance(), 4.0);
}

#[test]
fn test_example_config_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("example.yaml");
    std::fs::write(&path, EXAMPLE_CONFIG).unwrap();

    let config = Config::from_file(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.features.keypoint_scheme, KeypointScheme::Coco17);
    assert_eq!(config.features.feature_set().confidence_threshold, 0.6);
}

#[test]
fn test_partial_feature_overrides() {
    let yaml = "features:\n  keypoint_scheme: blaze_pose33\n  confidence_threshold: 0.4\n  angles: []\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let set = config.features.feature_set();
    let defaults = FeatureSet::default_for(KeypointScheme::BlazePose33);

    assert!(set.angles.is_empty());
    assert_eq!(set.segments, defaults.segments);
    assert_eq!(set.presence.len(), 33);
    assert_eq!(set.confidence_threshold, 0.4);
}

#[test]
fn test_validation() {
    let mut config = Config::default();
    config.alignment.timestamp_tolerance = f64::NAN;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.video.ffprobe = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.features.segments = Some(vec![("nose".to_string(), "tail".to_string())]);
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("tail"), "{err}");
}
