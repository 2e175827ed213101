//! Video annotation export reader.
//!
//! The export is a single JSON document with three sections:
//!
//! ```json
//! {
//!   "video_meta": [{"file_id": "clip_01", "width": 1920, "height": 1080}],
//!   "annotations": [
//!     {"file_id": "clip_01", "annotation_id": "t1", "frame": 0,
//!      "coordinates": [{"x": 10, "y": 20}, {"x": 110, "y": 20},
//!                      {"x": 110, "y": 220}, {"x": 10, "y": 220}]}
//!   ],
//!   "annotation_metadata": [
//!     {"annotation_id": "t1", "question": "Shoes", "answer": "Sneakers"}
//!   ]
//! }
//! ```
//!
//! `video_meta` and `annotations` are required; `annotation_metadata` is
//! optional. `frame` may be an integer or a string holding one.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use super::model::{Export, MediaDimension, MetadataEntry, RawAnnotation};
use super::{Coord, FileId, Pixel, TrackId};
use crate::error::TrackliftError;

// ============================================================================
// Export schema types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ExportDoc {
    #[serde(default)]
    video_meta: Option<Vec<VideoMetaRow>>,
    #[serde(default)]
    annotations: Option<Vec<AnnotationRow>>,
    #[serde(default)]
    annotation_metadata: Option<Vec<MetadataRow>>,
}

#[derive(Debug, Deserialize)]
struct VideoMetaRow {
    file_id: String,
    width: i64,
    height: i64,
}

#[derive(Debug, Deserialize)]
struct AnnotationRow {
    file_id: String,
    annotation_id: String,
    frame: serde_json::Value,
    coordinates: Vec<Coord<Pixel>>,
}

#[derive(Debug, Deserialize)]
struct MetadataRow {
    annotation_id: String,
    question: String,
    answer: String,
}

// ============================================================================
// Public API
// ============================================================================

/// Reads an export document from a JSON file.
///
/// # Errors
/// Returns [`TrackliftError::ExportJsonParse`] if the file is not valid JSON
/// of the expected shape and [`TrackliftError::MalformedExport`] if a
/// required section is missing or a field is structurally invalid.
pub fn read_export_json(path: &Path) -> Result<Export, TrackliftError> {
    let file = File::open(path).map_err(TrackliftError::Io)?;
    let reader = BufReader::new(file);

    let doc: ExportDoc =
        serde_json::from_reader(reader).map_err(|source| TrackliftError::ExportJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    doc_to_export(doc, path)
}

/// Parses an export document from a string.
pub fn from_export_str(json: &str) -> Result<Export, TrackliftError> {
    let path = Path::new("<string>");
    let doc: ExportDoc =
        serde_json::from_str(json).map_err(|source| TrackliftError::ExportJsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    doc_to_export(doc, path)
}

/// Parses an export document from bytes.
pub fn from_export_slice(bytes: &[u8]) -> Result<Export, TrackliftError> {
    let path = Path::new("<bytes>");
    let doc: ExportDoc =
        serde_json::from_slice(bytes).map_err(|source| TrackliftError::ExportJsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    doc_to_export(doc, path)
}

// ============================================================================
// Conversion: export document -> model
// ============================================================================

fn doc_to_export(doc: ExportDoc, path: &Path) -> Result<Export, TrackliftError> {
    let video_meta = doc
        .video_meta
        .ok_or_else(|| malformed(path, "missing required section 'video_meta'"))?;
    let annotations = doc
        .annotations
        .ok_or_else(|| malformed(path, "missing required section 'annotations'"))?;

    let mut dimensions = BTreeMap::new();
    for (idx, row) in video_meta.into_iter().enumerate() {
        let file_id = FileId::new(row.file_id);
        if dimensions.contains_key(&file_id) {
            return Err(malformed(
                path,
                format!("video_meta[{idx}] repeats file_id '{file_id}'"),
            ));
        }
        let dimension = MediaDimension::new(file_id.clone(), row.width, row.height);
        dimensions.insert(file_id, dimension);
    }

    let mut records = Vec::with_capacity(annotations.len());
    for (idx, row) in annotations.into_iter().enumerate() {
        let frame = parse_frame(&row.frame).ok_or_else(|| {
            malformed(
                path,
                format!(
                    "annotations[{idx}] (annotation '{}' in file '{}') has invalid frame {}",
                    row.annotation_id, row.file_id, row.frame
                ),
            )
        })?;
        records.push(RawAnnotation::new(
            FileId::new(row.file_id),
            TrackId::new(row.annotation_id),
            frame,
            row.coordinates,
        ));
    }

    let metadata = doc.annotation_metadata.map(group_metadata);

    Ok(Export {
        dimensions,
        records,
        metadata,
    })
}

/// Groups metadata rows by track, keeping source order within each track.
fn group_metadata(rows: Vec<MetadataRow>) -> BTreeMap<TrackId, Vec<MetadataEntry>> {
    let mut grouped: BTreeMap<TrackId, Vec<MetadataEntry>> = BTreeMap::new();
    for row in rows {
        let entry = MetadataEntry::new(TrackId::new(row.annotation_id), row.question, row.answer);
        grouped
            .entry(entry.annotation_id.clone())
            .or_default()
            .push(entry);
    }
    grouped
}

/// Accepts a non-negative integer, a float with no fractional part
/// (`3.0`), or a string holding an integer.
fn parse_frame(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64)
                .map(|f| f as u64)
        }),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn malformed(path: &Path, message: impl Into<String>) -> TrackliftError {
    TrackliftError::MalformedExport {
        path: path.to_path_buf(),
        message: message.into(),
    }
}
