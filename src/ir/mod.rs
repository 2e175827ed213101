//! Data model for tracklift.
//!
//! This module covers everything up to and including a single normalized
//! box: the export reader, the typed IDs and coordinate spaces, and the
//! polygon normalizer. Grouping boxes into tracks lives in
//! [`crate::assemble`].
//!
//! # Design Principles
//!
//! 1. **Type Safety**: file and track IDs are distinct newtypes, and pixel
//!    and fractional coordinates carry marker types so they cannot be mixed.
//!
//! 2. **Permissive Construction**: the reader keeps values such as zero or
//!    negative media sizes so that processing can report them with context
//!    instead of the JSON decoder rejecting the whole file.
//!
//! # Example
//!
//! ```
//! use tracklift::ir::{normalize, Coord, NormalizedBox, Pixel};
//!
//! let corners: Vec<Coord<Pixel>> = vec![
//!     Coord::new(0.0, 0.0),
//!     Coord::new(0.0, 500.0),
//!     Coord::new(1000.0, 0.0),
//!     Coord::new(1000.0, 500.0),
//! ];
//! let bbox = normalize(&corners, 1000, 500).unwrap();
//! assert_eq!(bbox, NormalizedBox::new(0.0, 0.0, 1.0, 1.0));
//! ```

mod bbox;
mod coord;
mod ids;
pub mod io_export_json;
mod model;
mod normalize;
mod space;

pub use bbox::{BBoxXYXY, NormalizedBox};
pub use coord::Coord;
pub use ids::{FileId, TrackId};
pub use model::{
    AssembledExport, Export, FileTracks, MediaDimension, MetadataEntry, RawAnnotation,
    TrackInstance,
};
pub use normalize::{is_axis_aligned_rect, normalize};
pub use space::Pixel;
