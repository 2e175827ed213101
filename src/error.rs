use std::path::PathBuf;
use thiserror::Error;

use crate::ir::{FileId, TrackId};

/// The main error type for tracklift operations.
#[derive(Debug, Error)]
pub enum TrackliftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse export JSON from {path}: {source}")]
    ExportJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed export {path}: {message}")]
    MalformedExport { path: PathBuf, message: String },

    #[error(
        "Invalid geometry for annotation '{annotation_id}' in file '{file_id}' at frame {frame}: {source}"
    )]
    InvalidGeometry {
        file_id: FileId,
        annotation_id: TrackId,
        frame: u64,
        #[source]
        source: GeometryError,
    },

    #[error("Invalid dimensions {width}x{height} for file '{file_id}' (must be positive)")]
    InvalidDimensions {
        file_id: FileId,
        width: i64,
        height: i64,
    },

    #[error("No video_meta entry for file '{file_id}' (referenced by annotation '{annotation_id}')")]
    MissingMedia {
        file_id: FileId,
        annotation_id: TrackId,
    },

    #[error("No label row found for file '{media_key}'")]
    UnresolvedTarget { media_key: String },

    #[error("{kind} '{name}' not found in ontology ({context})")]
    UnresolvedSchema {
        kind: SchemaKind,
        name: String,
        context: String,
    },

    #[error("Failed to parse project file {path}: {source}")]
    ProjectParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write labels to {path}: {source}")]
    LabelsWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u64 },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Geometry failures raised by the coordinate normalizer.
///
/// These carry no record context; the assembler wraps them into
/// [`TrackliftError::InvalidGeometry`] or [`TrackliftError::InvalidDimensions`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GeometryError {
    #[error("polygon has no points")]
    EmptyPoints,

    #[error("polygon has a non-finite coordinate")]
    NonFinite,

    #[error("media dimensions {width}x{height} must be positive")]
    InvalidDimensions { width: i64, height: i64 },
}

/// Which part of the target ontology a lookup failed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaKind {
    Class,
    Attribute,
    Option,
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SchemaKind::Class => "Class",
            SchemaKind::Attribute => "Attribute",
            SchemaKind::Option => "Option",
        };
        f.write_str(name)
    }
}
