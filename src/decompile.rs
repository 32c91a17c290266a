//! Decompile a stencil back into editable primitives
//!
//! The document is placed into a box: every stencil-local point `p` maps to
//! `placement.origin + p * (placement.size / doc.size)`.
//!
//! # Key Concepts
//!
//! - **Paths**: a run of `Line`s becomes one line edge, a run of `Quad`s one
//!   curve edge whose interior controls come from the midpoint inverse, and
//!   `Close` a line edge back to the subpath start.
//! - **Style nodes** apply to every primitive produced by the most recent
//!   drawing node.
//! - **Connections**: point records become point markers. Records sampled
//!   from edges and regions are dropped and rebuilt from their attack
//!   metadata instead. Metadata owned by a primitive itself sets that
//!   primitive's outline flag.
//!
//! Decompiled markers are standalone, so their geometry is in diagram space.

use std::ops::Range;

use glam::DVec2;

use crate::compile::geometry::midpoint_decode;
use crate::config::DecompileOptions;
use crate::errors::Result;
use crate::log::debug;
use crate::shapes::{
    ConstraintMarker, CurveShape, EdgeGeometry, EdgeKind, ImageShape, LineShape, PrimitiveShape,
    Shape, ShapeRef, SubStencilShape,
};
use crate::stencil::{
    Connection, ConstraintTag, DrawCommand, EdgeAttack, ForegroundNode, Path, RegionAttack,
    RegionKind, Resolver, StencilDocument, TagKind,
};
use crate::types::{Bounds, Point, pt};

/// Output of a decompile run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Decompiled {
    pub primitives: Vec<PrimitiveShape>,
    /// Standalone constraint markers, in diagram space
    pub markers: Vec<ConstraintMarker>,
}

/// Stencil-local to diagram mapping
#[derive(Debug, Clone, Copy)]
struct Placement {
    origin: Point,
    scale: DVec2,
}

impl Placement {
    fn new(doc: &StencilDocument, placement: &Bounds) -> Self {
        let scale = if doc.w > 0.0 && doc.h > 0.0 {
            placement.size() / DVec2::new(doc.w, doc.h)
        } else {
            DVec2::ONE
        };
        Self {
            origin: placement.origin(),
            scale,
        }
    }

    fn point(&self, p: Point) -> Point {
        self.origin + p * self.scale
    }

    fn bounds(&self, b: &Bounds) -> Bounds {
        let origin = self.point(b.origin());
        let size = b.size() * self.scale;
        Bounds::new(origin.x, origin.y, size.x, size.y)
    }
}

/// Turns stencils back into primitives and markers
pub struct Decompiler<'a> {
    resolver: Resolver<'a>,
    options: DecompileOptions,
}

impl<'a> Decompiler<'a> {
    pub fn new(resolver: Resolver<'a>) -> Self {
        Self {
            resolver,
            options: DecompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DecompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve `stencil` and decompile it into `placement`
    pub fn decompile(&self, stencil: &ShapeRef, placement: &Bounds) -> Result<Decompiled> {
        let doc = self.resolver.resolve(stencil)?;
        Ok(self.decompile_document(&doc, placement))
    }

    pub fn decompile_document(&self, doc: &StencilDocument, placement: &Bounds) -> Decompiled {
        let map = Placement::new(doc, placement);
        let mut out = Decompiled::default();

        let mut last_group: Range<usize> = 0..0;
        for node in &doc.foreground {
            let start = out.primitives.len();
            match node {
                ForegroundNode::Path(path) => path_edges(path, &map, &mut out.primitives),
                ForegroundNode::Rect(b) => out.primitives.push(
                    SubStencilShape::new(ShapeRef::Rectangle, map.bounds(b)).into(),
                ),
                ForegroundNode::Ellipse(b) => {
                    out.primitives.push(SubStencilShape::new(ShapeRef::Ellipse, map.bounds(b)).into())
                }
                ForegroundNode::IncludeShape { name, bounds } => out.primitives.push(
                    SubStencilShape::new(ShapeRef::from_style_name(name), map.bounds(bounds)).into(),
                ),
                ForegroundNode::Image { src, bounds } => {
                    out.primitives.push(ImageShape::new(src.clone(), map.bounds(bounds)).into())
                }
                style => {
                    apply_style(style, &mut out.primitives[last_group.clone()]);
                    continue;
                }
            }
            last_group = start..out.primitives.len();
        }

        for connection in &doc.connections {
            match connection {
                Connection::Constraint(record) => {
                    if let Some(marker) = self.point_marker(doc, &map, &record.name, pt(record.x, record.y)) {
                        out.markers.push(marker);
                    }
                }
                Connection::EdgeAttack(attack) => self.edge_attack(attack, &map, &mut out),
                Connection::RegionAttack(attack) => self.region_attack(attack, &map, &mut out),
                Connection::Unknown(_tag) => {
                    debug!(tag = %_tag, "skipping unknown connection");
                }
            }
        }

        debug!(
            primitives = out.primitives.len(),
            markers = out.markers.len(),
            "decompiled stencil"
        );
        out
    }

    fn point_marker(
        &self,
        doc: &StencilDocument,
        map: &Placement,
        name: &str,
        fraction: Point,
    ) -> Option<ConstraintMarker> {
        let label = match ConstraintTag::parse(name) {
            Some(tag) if tag.kind == TagKind::Point => tag.label,
            // regenerated from attack metadata
            Some(_) => return None,
            None => name.to_string(),
        };
        let center = map.point(fraction * DVec2::new(doc.w, doc.h));
        let size = self.options.point_marker_size;
        let geometry = Bounds::new(center.x - size / 2.0, center.y - size / 2.0, size, size);
        Some(ConstraintMarker::point(geometry).with_label(label))
    }

    fn edge_attack(&self, attack: &EdgeAttack, map: &Placement, out: &mut Decompiled) {
        let points: Vec<Point> = attack.points.iter().map(|p| map.point(*p)).collect();
        if attack.owner_self && self.claim_edge(attack.kind, &points, &mut out.primitives) {
            return;
        }
        match EdgeGeometry::from_points(&points) {
            Some(geometry) => out
                .markers
                .push(ConstraintMarker::edge(attack.kind, geometry).with_label(tag_label(&attack.name))),
            None => {
                debug!(name = %attack.name, "edge metadata has fewer than two points");
            }
        }
    }

    fn region_attack(&self, attack: &RegionAttack, map: &Placement, out: &mut Decompiled) {
        let region = map.bounds(&attack.region);
        if attack.owner_self
            && attack.kind == RegionKind::Outline
            && self.claim_region(&attack.shape, &region, &mut out.primitives)
        {
            return;
        }
        let label = tag_label(&attack.name);
        let marker = match attack.kind {
            RegionKind::Outline => ConstraintMarker::outline(attack.shape.clone(), region),
            RegionKind::Area => ConstraintMarker::area(attack.shape.clone(), region),
        };
        out.markers.push(marker.with_label(label));
    }

    /// Set the outline flag on the edge primitive with exactly these points
    fn claim_edge(&self, kind: EdgeKind, points: &[Point], primitives: &mut [PrimitiveShape]) -> bool {
        let tolerance = self.options.match_tolerance;
        let found = primitives.iter_mut().find(|shape| match shape.edge() {
            Some((k, geometry)) if k == kind => {
                let own = geometry.all_points();
                own.len() == points.len()
                    && own.iter().zip(points).all(|(a, b)| a.distance(*b) <= tolerance)
            }
            _ => false,
        });
        set_outline_flag(found)
    }

    /// Set the outline flag on the sub-stencil drawing `shape` over `region`
    fn claim_region(&self, shape: &ShapeRef, region: &Bounds, primitives: &mut [PrimitiveShape]) -> bool {
        let tolerance = self.options.match_tolerance;
        let found = primitives.iter_mut().find(|candidate| match candidate {
            PrimitiveShape::SubStencil(sub) => {
                &sub.shape == shape
                    && sub.geometry.origin().distance(region.origin()) <= tolerance
                    && sub.geometry.size().distance(region.size()) <= tolerance
            }
            _ => false,
        });
        set_outline_flag(found)
    }
}

fn set_outline_flag(shape: Option<&mut PrimitiveShape>) -> bool {
    match shape.and_then(PrimitiveShape::outline_flag_mut) {
        Some(flag) => {
            *flag = true;
            true
        }
        None => false,
    }
}

/// Marker label carried by a constraint tag (the whole name if untagged)
fn tag_label(name: &str) -> String {
    ConstraintTag::parse(name)
        .map(|tag| tag.label)
        .unwrap_or_else(|| name.to_string())
}

fn apply_style(node: &ForegroundNode, group: &mut [PrimitiveShape]) {
    for shape in group {
        let style = shape.style_mut();
        match node {
            ForegroundNode::Dashed(dashed) => style.dashed = *dashed,
            ForegroundNode::DashPattern(pattern) => style.dash_pattern = Some(pattern.clone()),
            ForegroundNode::StrokeWidth(width) => style.stroke_width = Some(*width),
            ForegroundNode::StrokeColor(color) => style.stroke_color = color.clone(),
            ForegroundNode::FillColor(color) => style.fill_color = Some(color.clone()),
            _ => {}
        }
    }
    if let ForegroundNode::Unknown(_tag) = node {
        debug!(tag = %_tag, "skipping unknown foreground node");
    }
}

/// Split a path into line and curve edges in diagram space
fn path_edges(path: &Path, map: &Placement, out: &mut Vec<PrimitiveShape>) {
    let commands = &path.commands;
    let mut current: Option<Point> = None;
    let mut subpath_start: Option<Point> = None;
    let mut i = 0;

    while i < commands.len() {
        match commands[i] {
            DrawCommand::Move(p) => {
                current = Some(p);
                subpath_start = Some(p);
                i += 1;
            }
            DrawCommand::Line(p) => {
                let Some(start) = current else {
                    // a line with no current point only positions the pen
                    current = Some(p);
                    subpath_start = Some(p);
                    i += 1;
                    continue;
                };
                let mut points = vec![start];
                while let Some(DrawCommand::Line(p)) = commands.get(i) {
                    points.push(*p);
                    i += 1;
                }
                current = points.last().copied();
                push_edge(EdgeKind::Line, &points, map, out);
            }
            DrawCommand::Quad { control, .. } => {
                let start = current.unwrap_or(control);
                let run_start = i;
                while let Some(DrawCommand::Quad { .. }) = commands.get(i) {
                    i += 1;
                }
                let points = curve_points(start, &commands[run_start..i]);
                current = points.last().copied();
                if current.is_some() && subpath_start.is_none() {
                    subpath_start = Some(start);
                }
                push_edge(EdgeKind::Curve, &points, map, out);
            }
            DrawCommand::Close => {
                if let (Some(end), Some(start)) = (current, subpath_start) {
                    if end != start {
                        push_edge(EdgeKind::Line, &[end, start], map, out);
                    }
                }
                current = subpath_start;
                i += 1;
            }
        }
    }
}

/// Control points of the curve drawn by a run of quads starting at `start`
fn curve_points(start: Point, quads: &[DrawCommand]) -> Vec<Point> {
    let quads: Vec<(Point, Point)> = quads
        .iter()
        .filter_map(|command| match command {
            DrawCommand::Quad { control, end } => Some((*control, *end)),
            _ => None,
        })
        .collect();
    let mut points = vec![start];
    let Some(&(last_control, last_end)) = quads.last() else {
        return points;
    };
    if let Some(&(first_control, _)) = quads.first() {
        points.push(first_control);
    }
    for j in 1..quads.len().saturating_sub(1) {
        let (control, end) = quads[j - 1];
        points.push(midpoint_decode(control, end));
    }
    if quads.len() > 1 {
        points.push(last_control);
    }
    points.push(last_end);
    points
}

fn push_edge(kind: EdgeKind, points: &[Point], map: &Placement, out: &mut Vec<PrimitiveShape>) {
    let mapped: Vec<Point> = points.iter().map(|p| map.point(*p)).collect();
    let Some(geometry) = EdgeGeometry::from_points(&mapped) else {
        return;
    };
    let shape = match kind {
        EdgeKind::Line => LineShape::new(geometry).into(),
        EdgeKind::Curve => CurveShape::new(geometry).into(),
    };
    out.push(shape);
}
