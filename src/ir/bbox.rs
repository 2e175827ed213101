//! Bounding box types.
//!
//! [`BBoxXYXY`] is the working form while a polygon is reduced to its
//! enclosing box. [`NormalizedBox`] is the top-left/width/height form the
//! label store consumes.

use serde::{Deserialize, Serialize};

use super::coord::Coord;
use super::Pixel;

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax).
///
/// The constructor does not enforce min <= max; [`BBoxXYXY::enclosing`]
/// is the only producer used by the pipeline and always yields ordered boxes.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    /// Returns the smallest box containing every point, or `None` for an
    /// empty slice.
    ///
    /// x and y extents are taken independently, so a rotated or irregular
    /// polygon is widened to its axis-aligned envelope.
    pub fn enclosing(points: &[Coord<TSpace>]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let init = (first.x, first.y, first.x, first.y);
        let (xmin, ymin, xmax, ymax) = rest.iter().fold(init, |(x0, y0, x1, y1), p| {
            (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y))
        });
        Some(Self::from_xyxy(xmin, ymin, xmax, ymax))
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    /// May be negative if the box is malformed (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// May be negative if the box is malformed (ymax < ymin).
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.min.x)
            .field("ymin", &self.min.y)
            .field("xmax", &self.max.x)
            .field("ymax", &self.max.y)
            .finish()
    }
}

impl BBoxXYXY<Pixel> {
    /// Divides the box by the frame size, giving its top-left corner and
    /// extent as fractions of the frame.
    ///
    /// Width and height are the pixel extent divided by the frame size, not
    /// the difference of the divided edges, so `(1, 4)` in a 10 pixel frame
    /// gives a width of exactly `0.3`.
    ///
    /// No clamping is applied: a corner outside the frame produces a
    /// fraction outside `[0, 1]`.
    pub fn to_normalized(&self, frame_width: f64, frame_height: f64) -> NormalizedBox {
        NormalizedBox::new(
            self.min.x / frame_width,
            self.min.y / frame_height,
            self.width() / frame_width,
            self.height() / frame_height,
        )
    }
}

/// A fractional bounding box anchored at its top-left corner.
///
/// This is the geometry attached to a track instance for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub top_left_x: f64,
    pub top_left_y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    pub fn new(top_left_x: f64, top_left_y: f64, width: f64, height: f64) -> Self {
        Self {
            top_left_x,
            top_left_y,
            width,
            height,
        }
    }

    /// Returns true if the box lies inside the frame, allowing `eps` of
    /// floating point slack on every edge.
    pub fn is_within_frame(&self, eps: f64) -> bool {
        self.top_left_x >= -eps
            && self.top_left_y >= -eps
            && self.top_left_x + self.width <= 1.0 + eps
            && self.top_left_y + self.height <= 1.0 + eps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosing_box_of_quad() {
        let points: Vec<Coord<Pixel>> = vec![
            Coord::new(30.0, 10.0),
            Coord::new(80.0, 25.0),
            Coord::new(60.0, 90.0),
            Coord::new(10.0, 70.0),
        ];
        let bbox = BBoxXYXY::enclosing(&points).unwrap();
        assert_eq!(bbox.xmin(), 10.0);
        assert_eq!(bbox.ymin(), 10.0);
        assert_eq!(bbox.xmax(), 80.0);
        assert_eq!(bbox.ymax(), 90.0);
    }

    #[test]
    fn test_enclosing_box_of_nothing() {
        assert!(BBoxXYXY::<Pixel>::enclosing(&[]).is_none());
    }

    #[test]
    fn test_to_normalized_xywh() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(250.0, 125.0, 750.0, 250.0);
        let normalized = bbox.to_normalized(1000.0, 500.0);
        assert_eq!(normalized, NormalizedBox::new(0.25, 0.25, 0.5, 0.25));
    }

    #[test]
    fn test_to_normalized_divides_pixel_extent() {
        // 4/10 - 1/10 is 0.30000000000000004; (4 - 1)/10 is 0.3.
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(1.0, 1.0, 4.0, 4.0);
        let normalized = bbox.to_normalized(10.0, 10.0);
        assert_eq!(normalized.width, 0.3);
        assert_eq!(normalized.height, 0.3);
        assert_eq!(normalized.top_left_x, 0.1);
    }

    #[test]
    fn test_is_within_frame() {
        assert!(NormalizedBox::new(0.0, 0.0, 1.0, 1.0).is_within_frame(1e-9));
        assert!(NormalizedBox::new(0.5, 0.5, 0.5 + 1e-12, 0.5).is_within_frame(1e-9));
        assert!(!NormalizedBox::new(0.8, 0.1, 0.3, 0.1).is_within_frame(1e-9));
        assert!(!NormalizedBox::new(-0.1, 0.1, 0.3, 0.1).is_within_frame(1e-9));
    }
}
