#![allow(dead_code)]

use std::collections::BTreeMap;

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use tracklift::ir::{Coord, FileId, MediaDimension, Pixel, RawAnnotation};

/// Slack for comparing fractions computed along different paths.
pub const EPS_NORMALIZED: f64 = 1e-9;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Frame sizes from tiny to 4K.
pub fn arb_dimensions() -> impl Strategy<Value = (i64, i64)> {
    (1i64..=3840, 1i64..=2160)
}

/// A point anywhere in (or somewhat outside) a frame of the given size.
pub fn arb_point(width: i64, height: i64) -> impl Strategy<Value = Coord<Pixel>> {
    let w = width as f64;
    let h = height as f64;
    (-0.25 * w..1.25 * w, -0.25 * h..1.25 * h).prop_map(|(x, y)| Coord::new(x, y))
}

/// A non-empty polygon with up to `max_points` corners.
pub fn arb_polygon(
    width: i64,
    height: i64,
    max_points: usize,
) -> impl Strategy<Value = Vec<Coord<Pixel>>> {
    prop::collection::vec(arb_point(width, height), 1..=max_points)
}

/// A dimension table plus records that only reference files in it.
///
/// File, track and frame IDs are drawn from small pools so that repeated
/// `(file, track)` pairs and repeated frames are common.
pub fn arb_export(
    max_files: usize,
    max_records: usize,
) -> impl Strategy<Value = (BTreeMap<FileId, MediaDimension>, Vec<RawAnnotation>)> {
    prop::collection::vec(arb_dimensions(), 1..=max_files).prop_flat_map(move |sizes| {
        let dimensions: BTreeMap<FileId, MediaDimension> = sizes
            .iter()
            .enumerate()
            .map(|(idx, &(w, h))| {
                let id = format!("clip_{idx:02}");
                (FileId::from(id.as_str()), MediaDimension::new(id.as_str(), w, h))
            })
            .collect();
        let file_count = sizes.len();

        let record = (0..file_count, 0usize..4, 0u64..6).prop_flat_map(move |(file, track, frame)| {
            let (w, h) = sizes[file];
            arb_polygon(w, h, 6).prop_map(move |points| {
                RawAnnotation::new(
                    format!("clip_{file:02}").as_str(),
                    format!("t{track}").as_str(),
                    frame,
                    points,
                )
            })
        });

        (Just(dimensions), prop::collection::vec(record, 0..=max_records))
    })
}
