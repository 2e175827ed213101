//! Criterion microbenches for export parsing and track assembly.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use tracklift::assemble::{assemble_export, AssembleOptions};
use tracklift::ir::io_export_json::{from_export_slice, from_export_str};

const EXPORT_FIXTURE: &str = include_str!("../tests/fixtures/sample_export.json");

/// A larger synthetic export: 20 files, 50 tracks each, 30 frames per track.
fn synthetic_export() -> String {
    let mut video_meta = Vec::new();
    let mut annotations = Vec::new();
    let mut metadata = Vec::new();

    for file in 0..20 {
        video_meta.push(format!(
            r#"{{"file_id": "clip_{file:02}", "width": 1920, "height": 1080}}"#
        ));
        for track in 0..50 {
            metadata.push(format!(
                r#"{{"annotation_id": "f{file}t{track}", "question": "Shoes", "answer": "Sneakers"}}"#
            ));
            for frame in 0..30 {
                let x = (track * 30 + frame) as f64;
                let y = (track * 10) as f64;
                annotations.push(format!(
                    r#"{{"file_id": "clip_{file:02}", "annotation_id": "f{file}t{track}", "frame": {frame}, "coordinates": [{{"x": {x}, "y": {y}}}, {{"x": {x2}, "y": {y}}}, {{"x": {x2}, "y": {y2}}}, {{"x": {x}, "y": {y2}}}]}}"#,
                    x2 = x + 120.0,
                    y2 = y + 240.0,
                ));
            }
        }
    }

    format!(
        r#"{{"video_meta": [{}], "annotations": [{}], "annotation_metadata": [{}]}}"#,
        video_meta.join(","),
        annotations.join(","),
        metadata.join(",")
    )
}

fn bench_export_parse_str(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_parse");
    group.throughput(Throughput::Bytes(EXPORT_FIXTURE.len() as u64));

    group.bench_function("from_export_str", |b| {
        b.iter(|| {
            let export = from_export_str(black_box(EXPORT_FIXTURE)).unwrap();
            black_box(export)
        })
    });

    group.finish();
}

fn bench_export_parse_slice(c: &mut Criterion) {
    let synthetic = synthetic_export();
    let bytes = synthetic.as_bytes();
    let mut group = c.benchmark_group("export_parse");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("from_export_slice_synthetic", |b| {
        b.iter(|| {
            let export = from_export_slice(black_box(bytes)).unwrap();
            black_box(export)
        })
    });

    group.finish();
}

/// Benchmark assembly alone: the export is parsed once up front.
fn bench_assemble(c: &mut Criterion) {
    let export = from_export_str(&synthetic_export()).unwrap();
    let opts = AssembleOptions::default();
    let mut group = c.benchmark_group("assemble");
    group.throughput(Throughput::Elements(export.records.len() as u64));

    group.bench_function("assemble_export_synthetic", |b| {
        b.iter(|| {
            let assembly = assemble_export(black_box(&export), &opts).unwrap();
            black_box(assembly)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_export_parse_str,
    bench_export_parse_slice,
    bench_assemble
);
criterion_main!(benches);
