//! Path builder for edge-like primitives.
//!
//! Turns ordered point lists into drawing commands relative to the group
//! origin.
//!
//! # Key Concepts
//!
//! - **Lines**: one `Line` per point after the first. With rounded corners
//!   every interior vertex is replaced by a `Line` stopping short of it
//!   (at `rounding_blend` of the way) and a `Quad` that uses the vertex as
//!   control and ends the same fraction past it.
//!
//! - **Curves**: the midpoint construction. Each interior control point
//!   becomes a `Quad` control whose end is the midpoint to the next control;
//!   the last quad ends on the target. Three points give a single quad and
//!   two points degrade to a straight line.
//!
//! The `*_through` methods append segments without a leading `Move`, so the
//! stitcher can chain several edges into one path.

use crate::stencil::{DrawCommand, Path};
use crate::types::{Bounds, Point};

use super::defaults;
use super::geometry::{lerp, quad_segments};

/// Accumulates drawing commands in group-local coordinates
#[derive(Debug, Clone)]
pub struct PathBuilder {
    origin: Point,
    rounding_blend: f64,
    commands: Vec<DrawCommand>,
}

impl PathBuilder {
    /// Builder whose output is relative to `origin`
    pub fn new(origin: Point) -> Self {
        Self {
            origin,
            rounding_blend: defaults::ROUNDING_BLEND,
            commands: Vec::new(),
        }
    }

    pub fn with_rounding_blend(mut self, blend: f64) -> Self {
        self.rounding_blend = blend;
        self
    }

    fn local(&self, p: Point) -> Point {
        p - self.origin
    }

    /// Start a new subpath at `p`
    pub fn move_to(&mut self, p: Point) {
        let p = self.local(p);
        self.commands.push(DrawCommand::Move(p));
    }

    /// Append straight segments through `points[1..]`; `points[0]` is the
    /// current position.
    pub fn line_through(&mut self, points: &[Point], rounded: bool) {
        let local: Vec<Point> = points.iter().map(|p| self.local(*p)).collect();
        let n = local.len();
        if n < 2 {
            return;
        }

        if rounded && n > 2 {
            let t = self.rounding_blend;
            for i in 1..n - 1 {
                self.commands.push(DrawCommand::Line(lerp(local[i - 1], local[i], t)));
                self.commands.push(DrawCommand::Quad {
                    control: local[i],
                    end: lerp(local[i], local[i + 1], 1.0 - t),
                });
            }
            self.commands.push(DrawCommand::Line(local[n - 1]));
        } else {
            for p in &local[1..] {
                self.commands.push(DrawCommand::Line(*p));
            }
        }
    }

    /// Append the quadratic run of a curve through `points`;
    /// `points[0]` is the current position.
    pub fn curve_through(&mut self, points: &[Point]) {
        if points.len() < 3 {
            self.line_through(points, false);
            return;
        }
        let local: Vec<Point> = points.iter().map(|p| self.local(*p)).collect();
        for (_, control, end) in quad_segments(&local) {
            self.commands.push(DrawCommand::Quad { control, end });
        }
    }

    pub fn close(&mut self) {
        self.commands.push(DrawCommand::Close);
    }

    /// Local position of the last command, if any
    pub fn current_point(&self) -> Option<Point> {
        self.commands.iter().rev().find_map(DrawCommand::end_point)
    }

    pub fn build(self) -> Path {
        Path::new(self.commands)
    }
}

/// `Move` to the first point, then straight (optionally rounded) segments
pub fn build_line_path(points: &[Point], bounds: &Bounds, rounded: bool) -> Path {
    let mut builder = PathBuilder::new(bounds.origin());
    if let Some(first) = points.first() {
        builder.move_to(*first);
        builder.line_through(points, rounded);
    }
    builder.build()
}

/// `Move` to the first point, then the quadratic run of the curve
pub fn build_curve_path(points: &[Point], bounds: &Bounds) -> Path {
    if points.len() == 2 {
        return build_line_path(points, bounds, false);
    }
    let mut builder = PathBuilder::new(bounds.origin());
    if let Some(first) = points.first() {
        builder.move_to(*first);
        builder.curve_through(points);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::pt;
    use DrawCommand::*;

    const EPSILON: f64 = 1e-10;

    fn assert_point_eq(actual: Point, expected: Point) {
        assert!(
            actual.abs_diff_eq(expected, EPSILON),
            "point mismatch: {actual} != {expected}"
        );
    }

    #[test]
    fn line_path_is_relative_to_bounds() {
        let bounds = Bounds::new(10.0, 20.0, 10.0, 10.0);
        let path = build_line_path(&[pt(10.0, 20.0), pt(20.0, 20.0), pt(20.0, 30.0)], &bounds, false);
        assert_eq!(
            path.commands,
            vec![Move(pt(0.0, 0.0)), Line(pt(10.0, 0.0)), Line(pt(10.0, 10.0))]
        );
    }

    #[test]
    fn rounded_line_blends_corners() {
        let bounds = Bounds::new(0.0, 0.0, 100.0, 100.0);
        let path = build_line_path(&[pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0)], &bounds, true);
        assert_eq!(path.commands.len(), 4);
        assert_eq!(path.commands[0], Move(pt(0.0, 0.0)));
        let Line(before) = path.commands[1] else {
            panic!("expected line, got {:?}", path.commands[1]);
        };
        assert_point_eq(before, pt(89.0, 0.0));
        let Quad { control, end } = path.commands[2] else {
            panic!("expected quad, got {:?}", path.commands[2]);
        };
        assert_point_eq(control, pt(100.0, 0.0));
        assert_point_eq(end, pt(100.0, 11.0));
        assert_eq!(path.commands[3], Line(pt(100.0, 100.0)));
    }

    #[test]
    fn rounded_two_point_line_is_straight() {
        let bounds = Bounds::new(0.0, 0.0, 5.0, 5.0);
        let path = build_line_path(&[pt(0.0, 0.0), pt(5.0, 5.0)], &bounds, true);
        assert_eq!(path.commands, vec![Move(pt(0.0, 0.0)), Line(pt(5.0, 5.0))]);
    }

    #[test]
    fn two_point_curve_degrades_to_line() {
        let bounds = Bounds::new(1.0, 1.0, 8.0, 3.0);
        let points = [pt(1.0, 1.0), pt(9.0, 4.0)];
        assert_eq!(build_curve_path(&points, &bounds), build_line_path(&points, &bounds, false));
    }

    #[test]
    fn three_point_curve_is_single_quad() {
        let bounds = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let path = build_curve_path(&[pt(0.0, 0.0), pt(5.0, 10.0), pt(10.0, 0.0)], &bounds);
        assert_eq!(
            path.commands,
            vec![
                Move(pt(0.0, 0.0)),
                Quad {
                    control: pt(5.0, 10.0),
                    end: pt(10.0, 0.0)
                }
            ]
        );
    }

    #[test]
    fn long_curve_uses_midpoint_run() {
        let bounds = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let points = [pt(0.0, 0.0), pt(2.0, 4.0), pt(4.0, 8.0), pt(6.0, 4.0), pt(10.0, 0.0)];
        let path = build_curve_path(&points, &bounds);
        assert_eq!(
            path.commands,
            vec![
                Move(pt(0.0, 0.0)),
                Quad {
                    control: pt(2.0, 4.0),
                    end: pt(3.0, 6.0)
                },
                Quad {
                    control: pt(4.0, 8.0),
                    end: pt(5.0, 6.0)
                },
                Quad {
                    control: pt(6.0, 4.0),
                    end: pt(10.0, 0.0)
                },
            ]
        );
    }

    #[test]
    fn builder_tracks_current_point() {
        let mut builder = PathBuilder::new(pt(1.0, 1.0));
        assert_eq!(builder.current_point(), None);
        builder.move_to(pt(1.0, 1.0));
        builder.line_through(&[pt(1.0, 1.0), pt(4.0, 5.0)], false);
        assert_eq!(builder.current_point(), Some(pt(3.0, 4.0)));
        builder.close();
        assert_eq!(builder.current_point(), Some(pt(3.0, 4.0)));
    }
}
