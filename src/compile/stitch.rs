//! Join several edges into one continuous path
//!
//! Edges are chained by matching endpoints. The walk starts from a free end
//! chosen by position, so the result does not depend on the order the edges
//! were selected in.

use crate::errors::{Result, StencilError};
use crate::log::{debug, trace};
use crate::shapes::{EdgeGeometry, EdgeKind};
use crate::stencil::Path;
use crate::types::{Bounds, Point};

use super::defaults;
use super::path_builder::PathBuilder;

/// An edge to stitch; always has at least two points
#[derive(Debug, Clone, PartialEq)]
pub struct StitchEdge {
    kind: EdgeKind,
    points: Vec<Point>,
}

impl StitchEdge {
    pub fn new(kind: EdgeKind, geometry: &EdgeGeometry) -> Self {
        Self {
            kind,
            points: geometry.all_points(),
        }
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    fn first(&self) -> Point {
        self.points[0]
    }

    fn last(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    fn oriented(&self, reversed: bool) -> Vec<Point> {
        if reversed {
            self.points.iter().rev().copied().collect()
        } else {
            self.points.clone()
        }
    }
}

fn near(a: Point, b: Point, tolerance: f64) -> bool {
    a.distance(b) <= tolerance
}

/// Stitch with the default endpoint tolerance
pub fn stitch(edges: &[StitchEdge], bounds: &Bounds) -> Result<Path> {
    stitch_with_tolerance(edges, bounds, defaults::STITCH_TOLERANCE)
}

/// Build a single path through every edge, relative to `bounds`.
///
/// After each edge, the first remaining edge (in list order) with an
/// endpoint at the current end is taken next, reversed if it touches with
/// its last point. Fails with `DisconnectedEdges` when no remaining edge
/// connects.
pub fn stitch_with_tolerance(edges: &[StitchEdge], bounds: &Bounds, tolerance: f64) -> Result<Path> {
    if edges.is_empty() {
        return Err(StencilError::EmptySelection);
    }

    let (start, mut reversed) = start_edge(edges, tolerance);
    let mut remaining: Vec<usize> = (0..edges.len()).filter(|&i| i != start).collect();
    let mut current = start;
    let mut stitched = 0;

    let mut builder = PathBuilder::new(bounds.origin());
    builder.move_to(if reversed {
        edges[start].last()
    } else {
        edges[start].first()
    });

    loop {
        let edge = &edges[current];
        let points = edge.oriented(reversed);
        match edge.kind {
            EdgeKind::Line => builder.line_through(&points, false),
            EdgeKind::Curve => builder.curve_through(&points),
        }
        stitched += 1;
        trace!(edge = current, reversed, "stitched edge");

        if remaining.is_empty() {
            break;
        }

        let end = points[points.len() - 1];
        let next = remaining.iter().position(|&i| {
            near(edges[i].first(), end, tolerance) || near(edges[i].last(), end, tolerance)
        });
        let Some(position) = next else {
            debug!(stitched, remaining = remaining.len(), "edges do not connect");
            return Err(StencilError::DisconnectedEdges {
                stitched,
                remaining: remaining.len(),
                x: end.x,
                y: end.y,
            });
        };
        current = remaining.remove(position);
        reversed = !near(edges[current].first(), end, tolerance);
    }

    Ok(builder.build())
}

/// Pick where the walk begins.
///
/// Among edges whose first point is shared with no other edge, the one
/// starting at the smallest point (x, then y). Failing that, the same among
/// edges whose last point is free, walked reversed. A closed loop starts at
/// the edge with the smallest first point.
fn start_edge(edges: &[StitchEdge], tolerance: f64) -> (usize, bool) {
    let shared = |index: usize, p: Point| {
        edges.iter().enumerate().any(|(j, e)| {
            j != index && (near(e.first(), p, tolerance) || near(e.last(), p, tolerance))
        })
    };
    let lowest = |candidates: Vec<(usize, Point)>| {
        candidates
            .into_iter()
            .min_by(|(_, a), (_, b)| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)))
            .map(|(i, _)| i)
    };

    let free_first = (0..edges.len())
        .filter(|&i| !shared(i, edges[i].first()))
        .map(|i| (i, edges[i].first()))
        .collect();
    if let Some(i) = lowest(free_first) {
        return (i, false);
    }
    let free_last = (0..edges.len())
        .filter(|&i| !shared(i, edges[i].last()))
        .map(|i| (i, edges[i].last()))
        .collect();
    if let Some(i) = lowest(free_last) {
        return (i, true);
    }
    let all = (0..edges.len()).map(|i| (i, edges[i].first())).collect();
    (lowest(all).unwrap_or(0), false)
}
