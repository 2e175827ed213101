//! Pixel polygon to fractional box conversion.
//!
//! Export polygons are corner lists. The label store only takes axis-aligned
//! boxes, so every polygon is reduced to its enclosing box. For a rectangle
//! aligned with the frame this is exact; for anything else the shape is
//! lost and only the envelope remains (see [`is_axis_aligned_rect`]).

use super::bbox::{BBoxXYXY, NormalizedBox};
use super::coord::Coord;
use super::space::Pixel;
use crate::error::GeometryError;

/// Converts polygon corners in pixels to a box in fractions of the frame.
///
/// Out-of-frame corners are not clamped.
///
/// # Errors
/// - [`GeometryError::InvalidDimensions`] if `width` or `height` is not positive
/// - [`GeometryError::EmptyPoints`] if `points` is empty
/// - [`GeometryError::NonFinite`] if any coordinate is NaN or infinite
pub fn normalize(
    points: &[Coord<Pixel>],
    width: i64,
    height: i64,
) -> Result<NormalizedBox, GeometryError> {
    if width <= 0 || height <= 0 {
        return Err(GeometryError::InvalidDimensions { width, height });
    }
    if points.iter().any(|p| !p.is_finite()) {
        return Err(GeometryError::NonFinite);
    }
    let envelope = BBoxXYXY::enclosing(points).ok_or(GeometryError::EmptyPoints)?;

    Ok(envelope.to_normalized(width as f64, height as f64))
}

/// Returns true if the corners describe exactly their enclosing box, i.e.
/// every corner sits on the envelope's boundary corners and all four of
/// those corners are present.
///
/// Degenerate inputs (fewer than four distinct corners) count as lossy.
pub fn is_axis_aligned_rect(points: &[Coord<Pixel>]) -> bool {
    let Some(envelope) = BBoxXYXY::enclosing(points) else {
        return false;
    };
    let corners = [
        (envelope.xmin(), envelope.ymin()),
        (envelope.xmax(), envelope.ymin()),
        (envelope.xmax(), envelope.ymax()),
        (envelope.xmin(), envelope.ymax()),
    ];

    let on_corner = |p: &Coord<Pixel>| corners.iter().any(|&(x, y)| p.x == x && p.y == y);
    let covered = |&(x, y): &(f64, f64)| points.iter().any(|p| p.x == x && p.y == y);

    envelope.width() > 0.0
        && envelope.height() > 0.0
        && points.iter().all(on_corner)
        && corners.iter().all(covered)
}
