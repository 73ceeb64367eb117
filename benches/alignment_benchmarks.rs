//! Benchmarks for parsing and nearest-key lookup

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pose_sync::{
    alignment::{nearest_key, Aligner},
    parser::{self, PoseArchive, TemporalScheme},
};
use rand::Rng;
use serde_json::{json, Value};

const NAMES: [&str; 5] = ["nose", "left_shoulder", "right_shoulder", "left_hip", "right_hip"];

/// Synthetic log: one record per model per frame at 30 fps with jittered keypoints
fn synthetic_log(frames: usize, models: &[&str]) -> Value {
    let mut rng = rand::thread_rng();
    let records: Vec<Value> = (0..frames)
        .flat_map(|i| {
            let keypoints: Vec<Value> = NAMES
                .iter()
                .map(|name| json!({"name": name, "x": rng.gen_range(0.0..640.0), "y": rng.gen_range(0.0..480.0), "score": rng.gen::<f64>()}))
                .collect();
            models
                .iter()
                .map(move |model| {
                    json!({
                        "timeStamp": i as f64 / 30.0,
                        "frameIdx": i,
                        "modelId": model,
                        "poseData": [{"score": 0.8, "keypoints": keypoints.clone()}]
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect();
    json!([records])
}

fn archive(frames: usize) -> PoseArchive {
    parser::parse(&synthetic_log(frames, &["movenet", "blazepose"]), TemporalScheme::Timestamp)
        .expect("synthetic log parses")
        .archive
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for frames in [300, 3000] {
        let log = synthetic_log(frames, &["movenet", "blazepose"]);
        group.bench_with_input(BenchmarkId::from_parameter(frames), &log, |b, log| {
            b.iter(|| black_box(parser::parse(black_box(log), TemporalScheme::Timestamp)));
        });
    }

    group.finish();
}

fn benchmark_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    let mut rng = rand::thread_rng();

    for frames in [300, 3000, 30000] {
        let archive = archive(frames);
        let span = archive.span().unwrap_or_default();
        let requests: Vec<f64> = (0..1000).map(|_| rng.gen_range(0.0..=span)).collect();
        let aligner = Aligner::for_scheme(TemporalScheme::Timestamp);

        group.bench_with_input(BenchmarkId::new("nearest_key", frames), &requests, |b, requests| {
            b.iter(|| {
                for &r in requests {
                    black_box(nearest_key(&archive, black_box(r)).ok());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("aligned_pose", frames), &requests, |b, requests| {
            b.iter(|| {
                for &r in requests {
                    black_box(aligner.lookup(&archive, black_box(r), "movenet").ok());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parse, benchmark_lookup);
criterion_main!(benches);
