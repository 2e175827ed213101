//! Coordinate space marker types.
//!
//! Export polygons arrive in pixels while the label store wants fractions
//! of the frame. Pixel geometry carries this zero-sized marker so that it
//! cannot be handed to the store before [`BBoxXYXY::to_normalized`] turns it
//! into a [`NormalizedBox`].
//!
//! [`BBoxXYXY::to_normalized`]: super::BBoxXYXY::to_normalized
//! [`NormalizedBox`]: super::NormalizedBox

use std::fmt;

/// Marker type for pixel coordinates, as found in the export's corner lists.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
