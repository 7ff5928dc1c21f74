use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Errors raised when constructing geometry from untrusted input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point in CSS pixels.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Element geometry as reported by the browser, in fractional CSS pixels.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a box, rejecting non-finite coordinates and negative extents.
    pub fn try_new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, GeometryError> {
        for (field, value) in [("x", x), ("y", y), ("width", width), ("height", height)] {
            if !value.is_finite() {
                return Err(GeometryError::NotFinite { field, value });
            }
        }
        for (field, value) in [("width", width), ("height", height)] {
            if value < 0.0 {
                return Err(GeometryError::Negative { field, value });
            }
        }
        Ok(Self::new(x, y, width, height))
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True when the whole box lies inside the viewport. Edges touching the
    /// viewport border still count as inside.
    pub fn is_within(&self, viewport: &Viewport) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.right() <= viewport.width
            && self.bottom() <= viewport.height
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_and_area() {
        let bbox = BoundingBox::new(100.0, 100.0, 200.0, 100.0);
        assert_eq!(bbox.center(), Point::new(200.0, 150.0));
        assert_eq!(bbox.area(), 20000.0);
    }

    #[test]
    fn within_viewport_is_inclusive_of_edges() {
        let viewport = Viewport::new(800.0, 600.0);
        assert!(BoundingBox::new(0.0, 0.0, 800.0, 600.0).is_within(&viewport));
        assert!(BoundingBox::new(500.0, 500.0, 10.0, 10.0).is_within(&viewport));
        assert!(!BoundingBox::new(795.0, 10.0, 10.0, 10.0).is_within(&viewport));
        assert!(!BoundingBox::new(-1.0, 10.0, 10.0, 10.0).is_within(&viewport));
    }

    #[test]
    fn distance_matches_pythagoras() {
        let a = Point::new(400.0, 300.0);
        let b = Point::new(200.0, 150.0);
        assert_eq!(a.distance_to(&b), 250.0);
    }

    #[test]
    fn try_new_rejects_bad_input() {
        assert!(BoundingBox::try_new(0.0, 0.0, -1.0, 5.0).is_err());
        assert!(BoundingBox::try_new(f64::NAN, 0.0, 1.0, 5.0).is_err());
        assert!(BoundingBox::try_new(1.5, 2.5, 3.0, 4.0).is_ok());
    }
}
