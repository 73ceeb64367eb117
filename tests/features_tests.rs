//! Geometric feature extraction tests


use pose_sync::{
    constants::{PRESENCE_SENTINEL, SENTINEL},
    features::{
        angle_sentinel, euclidean_distance, joint_angles, presence_flags, segment_lengths, segment_lengths_3d,
        FeatureSet,
    },
    keypoint::{Keypoint, Keypoint2D, Keypoint3D},
    pose::{KeypointMap, Pose},
    skeleton::KeypointScheme,
    Error,
};
use std::f64::consts::{FRAC_PI_2, PI};
use test_helpers::{pose, standing_figure};

fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
    list.iter().map(|(a, b)| ((*a).to_string(), (*b).to_string())).collect()
}

#[test]
fn test_segment_lengths_follow_input_order() {
    let p = pose(0.9, &standing_figure());
    let lengths = segment_lengths(
        Some(&p.keypoints),
        &[("left_shoulder", "right_shoulder"), ("left_hip", "left_knee"), ("left_shoulder", "left_shoulder")],
    )
    .unwrap();
    assert_eq!(lengths, vec![20.0, 30.0, 0.0]);
}

#[test]
fn test_missing_keypoint_only_blanks_its_entry() {
    let p = pose(0.9, &[("a", 0.0, 0.0, 0.9), ("b", 6.0, 8.0, 0.9)]);
    let lengths = segment_lengths(Some(&p.keypoints), &pairs(&[("a", "b"), ("a", "ghost"), ("b", "a")])).unwrap();
    assert_eq!(lengths, vec![10.0, SENTINEL, 10.0]);
}

#[test]
fn test_absent_pose_yields_sentinels() {
    let names = ["a", "b"];
    assert_eq!(
        segment_lengths::<Keypoint2D, _>(None, &[("a", "b"), ("b", "c")]).unwrap(),
        vec![SENTINEL, SENTINEL]
    );
    assert_eq!(
        joint_angles::<Keypoint2D, _>(None, &[("a", "b", "c")]).unwrap(),
        vec![None]
    );
    assert_eq!(
        presence_flags::<Keypoint2D, _>(None, &names, 0.6),
        vec![PRESENCE_SENTINEL, PRESENCE_SENTINEL]
    );
}

#[test]
fn test_joint_angles() {
    let p = pose(
        0.9,
        &[
            ("a", 0.0, 0.0, 0.9),
            ("b", 1.0, 0.0, 0.9),
            ("straight", 2.0, 0.0, 0.9),
            ("up", 1.0, 1.0, 0.9),
            ("back", 0.0, 0.0, 0.9),
        ],
    );
    let angles = joint_angles(
        Some(&p.keypoints),
        &[("a", "b", "straight"), ("a", "b", "up"), ("a", "b", "back"), ("a", "back", "b"), ("a", "b", "ghost")],
    )
    .unwrap();

    assert!(angles[0].unwrap().abs() < 1e-12);
    assert!((angles[1].unwrap() - FRAC_PI_2).abs() < 1e-12);
    assert!((angles[2].unwrap() - PI).abs() < 1e-12);
    // zero-length first vector
    assert_eq!(angles[3], None);
    assert_eq!(angles[4], None);
    assert_eq!(angle_sentinel(angles[4]), SENTINEL);
}

#[test]
fn test_presence_threshold_is_strict() {
    let p = pose(
        0.9,
        &[("low", 0.0, 0.0, 0.5), ("edge", 0.0, 0.0, 0.6), ("high", 0.0, 0.0, 0.61)],
    );
    let flags = presence_flags(Some(&p.keypoints), &["low", "edge", "high", "ghost"], 0.6);
    assert_eq!(flags, vec![0, 0, 1, 0]);
}

#[test]
fn test_three_dimensional_lengths() {
    let mut kps_3d = KeypointMap::new();
    kps_3d.insert("a".to_string(), Keypoint3D::new("a", 0.0, 0.0, 0.0, 0.9));
    kps_3d.insert("b".to_string(), Keypoint3D::new("b", 1.0, 2.0, 2.0, 0.9));
    let p = Pose::new(0.9, KeypointMap::new()).with_3d(kps_3d);

    assert_eq!(segment_lengths_3d(Some(&p), &[("a", "b")]).unwrap(), vec![3.0]);

    let planar_only = pose(0.9, &[("a", 0.0, 0.0, 0.9)]);
    assert_eq!(segment_lengths_3d(Some(&planar_only), &[("a", "b")]).unwrap(), vec![SENTINEL]);
}

#[test]
fn test_mixed_dimensions_are_rejected() {
    let mut kps: KeypointMap<Keypoint> = KeypointMap::new();
    kps.insert("flat".to_string(), Keypoint2D::new("flat", 0.0, 0.0, 0.9).into());
    kps.insert("deep".to_string(), Keypoint3D::new("deep", 0.0, 0.0, 1.0, 0.9).into());

    assert!(matches!(
        segment_lengths(Some(&kps), &[("flat", "deep")]),
        Err(Error::DimensionMismatch { left: 2, right: 3 })
    ));
    assert!(matches!(
        euclidean_distance(&[0.0, 0.0], &[0.0, 0.0, 0.0]),
        Err(Error::DimensionMismatch { .. })
    ));
}

#[test]
fn test_default_feature_sets_use_scheme_names() {
    for scheme in [KeypointScheme::Coco17, KeypointScheme::BlazePose33] {
        let set = FeatureSet::default_for(scheme);
        assert!(set.unknown_names(scheme).is_empty(), "{scheme} defaults reference unknown names");
        assert_eq!(set.presence.len(), scheme.len());
        assert_eq!(set.labels().len(), set.width());
    }
}

#[test]
fn test_extract_standing_figure() {
    let p = pose(0.9, &standing_figure());
    let set = FeatureSet::default_for(KeypointScheme::Coco17);
    let features = set.extract(Some(&p.keypoints)).unwrap();

    assert_eq!(features.lengths.len(), set.segments.len());
    assert!(features.lengths.iter().all(|&l| l > 0.0));
    // Straight arms and legs
    assert!(features.angles[0].unwrap().abs() < 1e-9);
    assert!(features.angles[4].unwrap().abs() < 1e-9);

    let nose = KeypointScheme::Coco17.index_of("nose").unwrap();
    let left_eye = KeypointScheme::Coco17.index_of("left_eye").unwrap();
    assert_eq!(features.presence[nose], 1);
    assert_eq!(features.presence[left_eye], 0);

    let row = features.to_row();
    assert_eq!(row.len(), set.width());
}
