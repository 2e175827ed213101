//! Track assembly.
//!
//! Exports list one record per track per frame, in no useful order. This
//! module folds those records into media -> track -> frame -> box, then
//! attaches each track's categorical answers. Both folds are ordered and
//! last-write-wins:
//!
//! - a repeated `(file, track, frame)` keeps the box of the later record,
//! - a repeated `(track, question)` keeps the later answer.
//!
//! Files keep the order in which they first appear in the records, and
//! tracks within a file keep their creation order.

pub mod report;

pub use report::{
    AssemblyCounts, AssemblyIssue, AssemblyIssueCode, AssemblyReport, AssemblySeverity,
};

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{GeometryError, TrackliftError};
use crate::ir::{
    is_axis_aligned_rect, normalize, AssembledExport, Export, FileId, FileTracks, MediaDimension,
    MetadataEntry, NormalizedBox, RawAnnotation, TrackId, TrackInstance,
};

/// Slack allowed on frame edges before a box counts as out of bounds.
const FRAME_EPS: f64 = 1e-6;

/// Options for assembly behavior.
#[derive(Clone, Debug, Default)]
pub struct AssembleOptions {
    /// Skip records whose file has no `video_meta` entry instead of failing.
    pub skip_missing_media: bool,
}

/// Assembled tracks together with the report describing how they were built.
#[derive(Clone, Debug)]
pub struct Assembly {
    pub export: AssembledExport,
    pub report: AssemblyReport,
}

/// Assembles a parsed export.
pub fn assemble_export(export: &Export, opts: &AssembleOptions) -> Result<Assembly, TrackliftError> {
    assemble(
        &export.records,
        &export.dimensions,
        export.metadata.as_ref(),
        opts,
    )
}

/// Folds annotation records into tracks and resolves their attributes.
///
/// # Errors
/// - [`TrackliftError::MissingMedia`] if a record's file has no dimensions
///   (unless `opts.skip_missing_media`)
/// - [`TrackliftError::InvalidDimensions`] if that file's size is not positive
/// - [`TrackliftError::InvalidGeometry`] if a record's polygon is empty or
///   non-finite
///
/// Any error aborts the whole assembly; no partial result is returned.
pub fn assemble(
    records: &[RawAnnotation],
    dimensions: &BTreeMap<FileId, MediaDimension>,
    metadata: Option<&BTreeMap<TrackId, Vec<MetadataEntry>>>,
    opts: &AssembleOptions,
) -> Result<Assembly, TrackliftError> {
    let mut report = AssemblyReport::new();
    let mut folder = TrackFolder::default();
    let mut approximated = 0usize;

    for record in records {
        let Some(dimension) = dimensions.get(&record.file_id) else {
            if opts.skip_missing_media {
                tracing::warn!(
                    file_id = %record.file_id,
                    annotation_id = %record.annotation_id,
                    "skipping record for unknown media"
                );
                report.add(AssemblyIssue::warning(
                    AssemblyIssueCode::MissingMedia,
                    format!(
                        "skipped annotation '{}' frame {}: no video_meta entry for file '{}'",
                        record.annotation_id, record.frame, record.file_id
                    ),
                ));
                continue;
            }
            return Err(TrackliftError::MissingMedia {
                file_id: record.file_id.clone(),
                annotation_id: record.annotation_id.clone(),
            });
        };

        let bbox = normalize_record(record, dimension)?;

        if !is_axis_aligned_rect(&record.coordinates) {
            approximated += 1;
        }
        if !bbox.is_within_frame(FRAME_EPS) {
            report.add(AssemblyIssue::warning(
                AssemblyIssueCode::OutOfBounds,
                format!(
                    "annotation '{}' in file '{}' frame {} extends outside the frame ({:?})",
                    record.annotation_id, record.file_id, record.frame, bbox
                ),
            ));
        }

        if folder.insert(record, bbox).is_some() {
            report.add(AssemblyIssue::info(
                AssemblyIssueCode::DuplicateFrame,
                format!(
                    "annotation '{}' in file '{}' has several records for frame {}; the last one is kept",
                    record.annotation_id, record.file_id, record.frame
                ),
            ));
        }
    }

    if approximated > 0 {
        report.add(AssemblyIssue::info(
            AssemblyIssueCode::PolygonApproximated,
            format!(
                "{} of {} record(s) are not axis-aligned rectangles and were replaced by their bounding box",
                approximated,
                records.len()
            ),
        ));
    }

    let mut export = folder.finish();
    if let Some(metadata) = metadata {
        resolve_attributes(&mut export, metadata, &mut report);
    }

    report.counts = AssemblyCounts {
        media: dimensions.len(),
        records: records.len(),
        metadata_entries: metadata
            .map(|m| m.values().map(Vec::len).sum())
            .unwrap_or(0),
        files: export.files.len(),
        tracks: export.track_count(),
        frames: export.frame_count(),
        answers: export.answer_count(),
    };

    Ok(Assembly { export, report })
}

fn normalize_record(
    record: &RawAnnotation,
    dimension: &MediaDimension,
) -> Result<NormalizedBox, TrackliftError> {
    normalize(&record.coordinates, dimension.width, dimension.height).map_err(|err| match err {
        GeometryError::InvalidDimensions { width, height } => TrackliftError::InvalidDimensions {
            file_id: record.file_id.clone(),
            width,
            height,
        },
        source => TrackliftError::InvalidGeometry {
            file_id: record.file_id.clone(),
            annotation_id: record.annotation_id.clone(),
            frame: record.frame,
            source,
        },
    })
}

/// Accumulates tracks in first-seen order.
#[derive(Default)]
struct TrackFolder {
    files: Vec<FileTracks>,
    file_index: HashMap<FileId, usize>,
    track_index: HashMap<(FileId, TrackId), usize>,
}

impl TrackFolder {
    /// Stores the box for the record's frame, returning the box it replaced.
    fn insert(&mut self, record: &RawAnnotation, bbox: NormalizedBox) -> Option<NormalizedBox> {
        let file_idx = *self
            .file_index
            .entry(record.file_id.clone())
            .or_insert_with(|| {
                self.files.push(FileTracks {
                    file_id: record.file_id.clone(),
                    tracks: Vec::new(),
                });
                self.files.len() - 1
            });
        let tracks = &mut self.files[file_idx].tracks;

        let track_idx = *self
            .track_index
            .entry((record.file_id.clone(), record.annotation_id.clone()))
            .or_insert_with(|| {
                tracing::debug!(
                    file_id = %record.file_id,
                    annotation_id = %record.annotation_id,
                    "new track"
                );
                tracks.push(TrackInstance::new(
                    record.annotation_id.clone(),
                    record.file_id.clone(),
                ));
                tracks.len() - 1
            });

        tracks[track_idx].frames.insert(record.frame, bbox)
    }

    fn finish(self) -> AssembledExport {
        AssembledExport { files: self.files }
    }
}

/// Applies metadata answers to every track with a matching ID.
fn resolve_attributes(
    export: &mut AssembledExport,
    metadata: &BTreeMap<TrackId, Vec<MetadataEntry>>,
    report: &mut AssemblyReport,
) {
    let mut matched: HashSet<TrackId> = HashSet::new();

    for file in &mut export.files {
        for track in &mut file.tracks {
            let Some(entries) = metadata.get(&track.track_id) else {
                continue;
            };
            matched.insert(track.track_id.clone());

            for entry in entries {
                let previous = track
                    .attributes
                    .insert(entry.question.clone(), entry.answer.clone());
                if let Some(previous) = previous {
                    report.add(AssemblyIssue::info(
                        AssemblyIssueCode::DuplicateAnswer,
                        format!(
                            "annotation '{}' in file '{}': '{}' answer '{}' replaced by '{}'",
                            track.track_id, track.file_id, entry.question, previous, entry.answer
                        ),
                    ));
                }
            }
        }
    }

    for (track_id, entries) in metadata {
        if !matched.contains(track_id) {
            report.add(AssemblyIssue::info(
                AssemblyIssueCode::UnmatchedMetadata,
                format!(
                    "{} metadata entr{} for annotation '{}' ignored: no records for that track",
                    entries.len(),
                    if entries.len() == 1 { "y" } else { "ies" },
                    track_id
                ),
            ));
        }
    }
}
