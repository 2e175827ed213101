//! Typed 2D points.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// A 2D point tagged with its coordinate space.
///
/// `TSpace` is [`Pixel`](super::Pixel) for export corners.
#[derive(Clone, Copy, PartialEq)]
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> Coord<TSpace> {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }

    /// Returns true if both coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl<TSpace> std::fmt::Debug for Coord<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// Hand-written so that TSpace needs no serde bounds.
impl<TSpace> Serialize for Coord<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Coord", 2)?;
        state.serialize_field("x", &self.x)?;
        state.serialize_field("y", &self.y)?;
        state.end()
    }
}

impl<'de, TSpace> Deserialize<'de> for Coord<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Point {
            x: f64,
            y: f64,
        }
        let point = Point::deserialize(deserializer)?;
        Ok(Coord::new(point.x, point.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Pixel;

    #[test]
    fn test_coord_from_export_point() {
        let coord: Coord<Pixel> = serde_json::from_str(r#"{"x": 12.5, "y": 40}"#).unwrap();
        assert_eq!(coord, Coord::new(12.5, 40.0));
    }

    #[test]
    fn test_coord_is_finite() {
        assert!(Coord::<Pixel>::new(10.0, 20.0).is_finite());
        assert!(!Coord::<Pixel>::new(f64::NAN, 20.0).is_finite());
        assert!(!Coord::<Pixel>::new(10.0, f64::INFINITY).is_finite());
    }
}
