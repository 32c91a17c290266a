//! Geometry helpers: group bounds, point extraction, quadratic curves, stepping

use glam::DVec2;

use crate::errors::{Result, StencilError};
use crate::shapes::{PrimitiveShape, Shape};
use crate::types::{Bounds, BoundsBuilder, Point};

use super::defaults;

/// Minimal box enclosing every shape in `shapes`.
///
/// An empty selection has no bounds and is a caller error.
pub fn bounds_of(shapes: &[PrimitiveShape]) -> Result<Bounds> {
    let mut builder = BoundsBuilder::new();
    for shape in shapes {
        builder.expand_box(&shape.bounds());
    }
    builder.build().ok_or(StencilError::EmptySelection)
}

/// Linear interpolation: `t = 0` gives `a`, `t = 1` gives `b`
#[inline]
pub fn lerp(a: Point, b: Point, t: f64) -> Point {
    a * (1.0 - t) + b * t
}

/// On-curve point implied between two consecutive quad controls
#[inline]
pub fn midpoint_encode(control: Point, next_control: Point) -> Point {
    lerp(control, next_control, defaults::MIDPOINT_BLEND)
}

/// Recover the next control point from a quad's control and implied end.
/// Exact inverse of [`midpoint_encode`].
#[inline]
pub fn midpoint_decode(control: Point, end: Point) -> Point {
    control + (end - control) / defaults::MIDPOINT_BLEND
}

/// Quadratic Bernstein form `(1-t)²·p0 + 2(1-t)t·p1 + t²·p2`
pub fn quad_point(t: f64, p0: Point, p1: Point, p2: Point) -> Point {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

/// A quadratic segment `(start, control, end)`
pub type QuadSegment = (Point, Point, Point);

/// Split a curve through `points` into the quadratic segments of the
/// midpoint construction. Needs at least three points.
pub fn quad_segments(points: &[Point]) -> Vec<QuadSegment> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    let mut segments = Vec::with_capacity(n - 2);
    let mut start = points[0];
    for i in 1..n - 2 {
        let end = midpoint_encode(points[i], points[i + 1]);
        segments.push((start, points[i], end));
        start = end;
    }
    segments.push((start, points[n - 2], points[n - 1]));
    segments
}

/// `start, start + step, ...` strictly below `end`.
///
/// Values are computed from an integer index so long runs do not drift.
pub fn steps(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    let count = step_count(start, end, step, false);
    (0..count).map(move |i| start + i as f64 * step)
}

/// Like [`steps`] but includes `end` when it falls on the grid
pub fn steps_inclusive(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    let count = step_count(start, end, step, true);
    (0..count).map(move |i| start + i as f64 * step)
}

fn step_count(start: f64, end: f64, step: f64, inclusive: bool) -> usize {
    if !(step > 0.0) || !start.is_finite() || !end.is_finite() || end < start {
        return 0;
    }
    let span = (end - start) / step;
    // absorb representation error so 1.0 / 0.02 counts 50 steps, not 49.99..
    let whole = (span + 1e-9).floor();
    let count = if inclusive || (span - whole).abs() > 1e-9 {
        whole + 1.0
    } else {
        whole
    };
    count as usize
}

/// Flatten a quadratic into `segments` straight pieces (excluding `p0`)
pub fn flatten_quad(p0: Point, p1: Point, p2: Point, segments: usize) -> Vec<Point> {
    let segments = segments.max(1);
    (1..=segments)
        .map(|i| quad_point(i as f64 / segments as f64, p0, p1, p2))
        .collect()
}

/// Shortest distance from `p` to the segment `a..b`
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Point on an axis-aligned ellipse inscribed in `bounds` at angle `theta`
pub fn ellipse_point(bounds: &Bounds, theta: f64) -> Point {
    let radius = bounds.size() * 0.5;
    bounds.center() + radius * DVec2::new(theta.cos(), theta.sin())
}
