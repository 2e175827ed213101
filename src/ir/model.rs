//! Core data model for tracklift.
//!
//! The first half of this module holds the facts read from an export
//! ([`Export`] and its parts). The second half holds the assembled,
//! frame-indexed form ([`AssembledExport`]) that is replayed against a
//! label store.

use serde::Serialize;
use std::collections::BTreeMap;

use super::bbox::NormalizedBox;
use super::coord::Coord;
use super::ids::{FileId, TrackId};
use super::space::Pixel;

/// Everything read from one export document.
#[derive(Clone, Debug, Default)]
pub struct Export {
    /// Pixel dimensions per media file, one entry per `video_meta` row.
    pub dimensions: BTreeMap<FileId, MediaDimension>,

    /// Annotation records in source order.
    pub records: Vec<RawAnnotation>,

    /// Per-track metadata entries in source order, if the export has an
    /// `annotation_metadata` section.
    pub metadata: Option<BTreeMap<TrackId, Vec<MetadataEntry>>>,
}

impl Export {
    /// Number of metadata entries across all tracks.
    pub fn metadata_len(&self) -> usize {
        self.metadata
            .as_ref()
            .map(|m| m.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

/// Pixel size of one media file.
///
/// Stored signed so that a zero or negative size in the export survives
/// parsing and is rejected where it is used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaDimension {
    pub file_id: FileId,
    pub width: i64,
    pub height: i64,
}

impl MediaDimension {
    pub fn new(file_id: impl Into<FileId>, width: i64, height: i64) -> Self {
        Self {
            file_id: file_id.into(),
            width,
            height,
        }
    }
}

/// One detection of one track in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RawAnnotation {
    pub file_id: FileId,
    pub annotation_id: TrackId,
    pub frame: u64,
    /// Polygon corners in pixel space.
    pub coordinates: Vec<Coord<Pixel>>,
}

impl RawAnnotation {
    pub fn new(
        file_id: impl Into<FileId>,
        annotation_id: impl Into<TrackId>,
        frame: u64,
        coordinates: Vec<Coord<Pixel>>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            annotation_id: annotation_id.into(),
            frame,
            coordinates,
        }
    }
}

/// A categorical answer about a track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataEntry {
    pub annotation_id: TrackId,
    pub question: String,
    pub answer: String,
}

impl MetadataEntry {
    pub fn new(
        annotation_id: impl Into<TrackId>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            annotation_id: annotation_id.into(),
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A track gathered from all of its per-frame records.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackInstance {
    pub track_id: TrackId,
    pub file_id: FileId,

    /// Box per frame. Iteration is in ascending frame order.
    pub frames: BTreeMap<u64, NormalizedBox>,

    /// Chosen option per question, at most one each.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl TrackInstance {
    pub fn new(track_id: TrackId, file_id: FileId) -> Self {
        Self {
            track_id,
            file_id,
            frames: BTreeMap::new(),
            attributes: BTreeMap::new(),
        }
    }
}

/// The tracks of one media file, in creation order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileTracks {
    pub file_id: FileId,
    pub tracks: Vec<TrackInstance>,
}

impl FileTracks {
    pub fn frame_count(&self) -> usize {
        self.tracks.iter().map(|t| t.frames.len()).sum()
    }

    pub fn answer_count(&self) -> usize {
        self.tracks.iter().map(|t| t.attributes.len()).sum()
    }
}

/// Assembler output: files in the order they first appear in the records.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AssembledExport {
    pub files: Vec<FileTracks>,
}

impl AssembledExport {
    pub fn track_count(&self) -> usize {
        self.files.iter().map(|f| f.tracks.len()).sum()
    }

    pub fn frame_count(&self) -> usize {
        self.files.iter().map(FileTracks::frame_count).sum()
    }

    pub fn answer_count(&self) -> usize {
        self.files.iter().map(FileTracks::answer_count).sum()
    }

    /// Finds a track by file and track ID.
    pub fn track(&self, file_id: &str, track_id: &str) -> Option<&TrackInstance> {
        self.files
            .iter()
            .find(|f| f.file_id.as_str() == file_id)?
            .tracks
            .iter()
            .find(|t| t.track_id.as_str() == track_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembled_counts() {
        let mut track = TrackInstance::new(TrackId::from("t1"), FileId::from("clip"));
        track.frames.insert(3, NormalizedBox::new(0.0, 0.0, 0.5, 0.5));
        track.frames.insert(1, NormalizedBox::new(0.1, 0.1, 0.5, 0.5));
        track.attributes.insert("Shoes".into(), "Boots".into());

        let assembled = AssembledExport {
            files: vec![FileTracks {
                file_id: FileId::from("clip"),
                tracks: vec![track],
            }],
        };

        assert_eq!(assembled.track_count(), 1);
        assert_eq!(assembled.frame_count(), 2);
        assert_eq!(assembled.answer_count(), 1);

        let frames: Vec<u64> = assembled
            .track("clip", "t1")
            .unwrap()
            .frames
            .keys()
            .copied()
            .collect();
        assert_eq!(frames, vec![1, 3]);
        assert!(assembled.track("clip", "t2").is_none());
    }

    #[test]
    fn test_export_metadata_len() {
        let mut export = Export::default();
        assert_eq!(export.metadata_len(), 0);

        let mut metadata = BTreeMap::new();
        metadata.insert(
            TrackId::from("t1"),
            vec![
                MetadataEntry::new("t1", "Shoes", "Boots"),
                MetadataEntry::new("t1", "Hat", "Cap"),
            ],
        );
        export.metadata = Some(metadata);
        assert_eq!(export.metadata_len(), 2);
    }
}
