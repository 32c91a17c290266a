//! Numeric primitives shared by the compiler and the decompiler.
//!
//! Points are plain `glam::DVec2` values in diagram space (Y-down, like the
//! host canvas). Boxes are `Bounds`, an origin plus a size.

use std::fmt;

use glam::DVec2;

/// A point (or displacement) in diagram space
pub type Point = DVec2;

/// Shorthand constructor for a `Point`
#[inline]
pub fn pt(x: f64, y: f64) -> Point {
    DVec2::new(x, y)
}

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is negative when non-negative required
    Negative,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Negative => write!(f, "value is negative"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Validate a finite coordinate
#[inline]
pub fn finite(val: f64) -> Result<f64, NumericError> {
    if val.is_nan() {
        Err(NumericError::NaN)
    } else if val.is_infinite() {
        Err(NumericError::Infinite)
    } else {
        Ok(val)
    }
}

/// Validate a finite, non-negative extent
#[inline]
pub fn non_negative(val: f64) -> Result<f64, NumericError> {
    let val = finite(val)?;
    if val < 0.0 {
        Err(NumericError::Negative)
    } else {
        Ok(val)
    }
}

/// Axis-aligned box: origin corner plus size.
///
/// Used both for primitive geometry and for the group bounds that define the
/// coordinate origin and normalization denominators of a stencil.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Box spanning two corners, in any order
    pub fn from_corners(a: Point, b: Point) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn origin(&self) -> Point {
        pt(self.x, self.y)
    }

    pub fn size(&self) -> DVec2 {
        DVec2::new(self.w, self.h)
    }

    /// Corner opposite the origin
    pub fn max(&self) -> Point {
        self.origin() + self.size()
    }

    pub fn center(&self) -> Point {
        self.origin() + self.size() * 0.5
    }

    /// Smallest box enclosing both
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::from_corners(self.origin().min(other.origin()), self.max().max(other.max()))
    }

    /// True when `other` lies entirely inside this box (edges inclusive)
    pub fn contains_box(&self, other: &Bounds) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.max().x <= self.max().x
            && other.max().y <= self.max().y
    }

    /// A box with no area cannot serve as a normalization denominator
    pub fn is_degenerate(&self) -> bool {
        !(self.w > 0.0 && self.h > 0.0)
    }

    pub fn translate(&self, by: DVec2) -> Bounds {
        Bounds::new(self.x + by.x, self.y + by.y, self.w, self.h)
    }

    /// Diagram point to box-local point
    #[inline]
    pub fn to_local(&self, p: Point) -> Point {
        p - self.origin()
    }

    /// Box-local point to fractions of the box size
    #[inline]
    pub fn normalize(&self, local: Point) -> Point {
        local / self.size()
    }

    /// Fractions of the box size back to a diagram point
    #[inline]
    pub fn denormalize(&self, fraction: Point) -> Point {
        self.origin() + fraction * self.size()
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {}x{}", self.x, self.y, self.w, self.h)
    }
}

/// Accumulates points into a bounding box (expands on each point)
#[derive(Clone, Copy, Debug)]
pub struct BoundsBuilder {
    min: Point,
    max: Point,
}

impl Default for BoundsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundsBuilder {
    /// Create an empty builder (will expand on first point)
    pub fn new() -> Self {
        Self {
            min: DVec2::splat(f64::MAX),
            max: DVec2::splat(f64::MIN),
        }
    }

    /// Check if the builder is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn expand_point(&mut self, p: Point) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn expand_box(&mut self, b: &Bounds) {
        self.expand_point(b.origin());
        self.expand_point(b.max());
    }

    /// Finished box, or `None` if nothing was added
    pub fn build(&self) -> Option<Bounds> {
        if self.is_empty() {
            None
        } else {
            Some(Bounds::from_corners(self.min, self.max))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== NumericError tests ====================

    #[test]
    fn finite_accepts_regular_values() {
        assert_eq!(finite(1.5), Ok(1.5));
        assert_eq!(finite(-3.0), Ok(-3.0));
    }

    #[test]
    fn finite_rejects_nan_and_infinity() {
        assert_eq!(finite(f64::NAN), Err(NumericError::NaN));
        assert_eq!(finite(f64::INFINITY), Err(NumericError::Infinite));
        assert_eq!(finite(f64::NEG_INFINITY), Err(NumericError::Infinite));
    }

    #[test]
    fn non_negative_rejects_negative() {
        assert_eq!(non_negative(0.0), Ok(0.0));
        assert_eq!(non_negative(-0.5), Err(NumericError::Negative));
    }

    // ==================== Bounds tests ====================

    #[test]
    fn from_corners_orders_points() {
        let b = Bounds::from_corners(pt(10.0, 2.0), pt(4.0, 8.0));
        assert_eq!(b, Bounds::new(4.0, 2.0, 6.0, 6.0));
    }

    #[test]
    fn union_encloses_both() {
        let a = Bounds::new(0.0, 0.0, 5.0, 5.0);
        let b = Bounds::new(3.0, -2.0, 10.0, 4.0);
        let u = a.union(&b);
        assert_eq!(u, Bounds::new(0.0, -2.0, 13.0, 7.0));
        assert!(u.contains_box(&a));
        assert!(u.contains_box(&b));
    }

    #[test]
    fn degenerate_when_flat() {
        assert!(Bounds::new(0.0, 0.0, 10.0, 0.0).is_degenerate());
        assert!(Bounds::new(0.0, 0.0, 0.0, 10.0).is_degenerate());
        assert!(!Bounds::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn normalize_and_denormalize_are_inverse() {
        let b = Bounds::new(10.0, 20.0, 40.0, 80.0);
        let p = pt(30.0, 40.0);
        let frac = b.normalize(b.to_local(p));
        assert_eq!(frac, pt(0.5, 0.25));
        assert_eq!(b.denormalize(frac), p);
    }

    #[test]
    fn builder_starts_empty() {
        let mut builder = BoundsBuilder::new();
        assert!(builder.is_empty());
        assert_eq!(builder.build(), None);

        builder.expand_point(pt(1.0, 2.0));
        builder.expand_point(pt(-1.0, 5.0));
        assert_eq!(builder.build(), Some(Bounds::new(-1.0, 2.0, 2.0, 3.0)));
    }
}
