//! Primitive shape types fed into the compiler
//!
//! Each primitive is its own type that knows:
//! - its bounding box in diagram space
//! - its resolved style
//! - the constraint markers attached to it
//!
//! `PrimitiveShape` dispatches the `Shape` trait over the variants.

use std::fmt;

use enum_dispatch::enum_dispatch;
use glam::DVec2;

use crate::compile::defaults;
use crate::types::{Bounds, BoundsBuilder, Point};

// ============================================================================
// Style
// ============================================================================

/// Style of a primitive, resolved once when the primitive is built
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub stroke_color: String,
    pub fill_color: Option<String>,
    pub stroke_width: Option<f64>,
    pub dashed: bool,
    /// Explicit dash pattern such as `"3 3"`; only meaningful when dashed
    pub dash_pattern: Option<String>,
    /// Rounded corners on polylines
    pub rounded: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke_color: defaults::STROKE_COLOR.to_string(),
            fill_color: None,
            stroke_width: None,
            dashed: false,
            dash_pattern: None,
            rounded: false,
        }
    }
}

impl Style {
    pub fn with_stroke_color(mut self, color: impl Into<String>) -> Self {
        self.stroke_color = color.into();
        self
    }

    pub fn with_fill_color(mut self, color: impl Into<String>) -> Self {
        self.fill_color = Some(color.into());
        self
    }

    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }

    pub fn with_dashed(mut self, pattern: Option<String>) -> Self {
        self.dashed = true;
        self.dash_pattern = pattern;
        self
    }

    pub fn with_rounded(mut self, rounded: bool) -> Self {
        self.rounded = rounded;
        self
    }
}

// ============================================================================
// Shape references
// ============================================================================

/// Which stencil a box-like shape draws
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeRef {
    Rectangle,
    Ellipse,
    /// A stencil registered under a name
    Named(String),
    /// A compressed stencil definition carried inline
    Embedded(String),
}

impl ShapeRef {
    /// Interpret the value of a `shape=` style entry
    pub fn from_style_name(name: &str) -> Self {
        let name = name.trim();
        if name == defaults::RECTANGLE_SHAPE || name == "rectangle" {
            ShapeRef::Rectangle
        } else if name == defaults::ELLIPSE_SHAPE || name == "ellipse" {
            ShapeRef::Ellipse
        } else if let Some(token) = name
            .strip_prefix("stencil(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            ShapeRef::Embedded(token.to_string())
        } else {
            ShapeRef::Named(name.to_string())
        }
    }

    /// Extract the shape reference from a full style string (`a=b;shape=...;`)
    pub fn from_style(style: &str) -> Option<Self> {
        style
            .split(';')
            .filter_map(|entry| entry.split_once('='))
            .find(|(key, _)| key.trim() == "shape")
            .map(|(_, value)| Self::from_style_name(value))
    }

    /// Style string for an element drawing this shape
    pub fn to_style(&self) -> String {
        format!("shape={self};")
    }
}

impl fmt::Display for ShapeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeRef::Rectangle => f.write_str(defaults::RECTANGLE_SHAPE),
            ShapeRef::Ellipse => f.write_str(defaults::ELLIPSE_SHAPE),
            ShapeRef::Named(name) => f.write_str(name),
            ShapeRef::Embedded(token) => write!(f, "stencil({token})"),
        }
    }
}

// ============================================================================
// Geometry records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Line,
    Curve,
}

/// Source, ordered control points and target of an edge-like shape
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGeometry {
    pub source: Point,
    pub controls: Vec<Point>,
    pub target: Point,
}

impl EdgeGeometry {
    pub fn new(source: Point, controls: Vec<Point>, target: Point) -> Self {
        Self {
            source,
            controls,
            target,
        }
    }

    pub fn segment(source: Point, target: Point) -> Self {
        Self::new(source, Vec::new(), target)
    }

    /// Edge through `points`; `None` when fewer than two are given
    pub fn from_points(points: &[Point]) -> Option<Self> {
        match points {
            [source, controls @ .., target] => Some(Self::new(*source, controls.to_vec(), *target)),
            _ => None,
        }
    }

    /// `[source] ++ controls ++ [target]`
    pub fn all_points(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.controls.len() + 2);
        points.push(self.source);
        points.extend_from_slice(&self.controls);
        points.push(self.target);
        points
    }

    pub fn bounds(&self) -> Bounds {
        let mut builder = BoundsBuilder::new();
        builder.expand_point(self.source);
        for p in &self.controls {
            builder.expand_point(*p);
        }
        builder.expand_point(self.target);
        // source and target were added, so the builder is never empty
        builder.build().unwrap_or_default()
    }

    pub fn translate(&mut self, by: DVec2) {
        self.source += by;
        for p in &mut self.controls {
            *p += by;
        }
        self.target += by;
    }
}

// ============================================================================
// Constraint markers
// ============================================================================

/// What a constraint marker samples
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind {
    /// `isConstraint` on a box: one attachment point at the box center
    Point { geometry: Bounds },
    /// `isConstraint` on an edge: attachment points along the edge
    Edge { kind: EdgeKind, geometry: EdgeGeometry },
    /// `isOutlineConstraint`: attachment points on the region's boundary
    Outline { shape: ShapeRef, geometry: Bounds },
    /// `isAreaConstraint`: attachment points covering the region
    Area { shape: ShapeRef, geometry: Bounds },
}

/// A child shape that contributes attachment points to its owner.
///
/// Geometry is relative to the owner's marker origin (see
/// [`Shape::marker_origin`]).
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintMarker {
    pub label: String,
    pub kind: MarkerKind,
}

impl ConstraintMarker {
    pub fn point(geometry: Bounds) -> Self {
        Self::new(MarkerKind::Point { geometry })
    }

    pub fn edge(kind: EdgeKind, geometry: EdgeGeometry) -> Self {
        Self::new(MarkerKind::Edge { kind, geometry })
    }

    pub fn outline(shape: ShapeRef, geometry: Bounds) -> Self {
        Self::new(MarkerKind::Outline { shape, geometry })
    }

    pub fn area(shape: ShapeRef, geometry: Bounds) -> Self {
        Self::new(MarkerKind::Area { shape, geometry })
    }

    fn new(kind: MarkerKind) -> Self {
        Self {
            label: String::new(),
            kind,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn bounds(&self) -> Bounds {
        match &self.kind {
            MarkerKind::Point { geometry }
            | MarkerKind::Outline { geometry, .. }
            | MarkerKind::Area { geometry, .. } => *geometry,
            MarkerKind::Edge { geometry, .. } => geometry.bounds(),
        }
    }

    /// Copy of this marker moved by `by`
    pub fn translated(&self, by: DVec2) -> Self {
        let mut marker = self.clone();
        match &mut marker.kind {
            MarkerKind::Point { geometry }
            | MarkerKind::Outline { geometry, .. }
            | MarkerKind::Area { geometry, .. } => *geometry = geometry.translate(by),
            MarkerKind::Edge { geometry, .. } => geometry.translate(by),
        }
        marker
    }
}

// ============================================================================
// Shape trait
// ============================================================================

/// Common behavior for all primitives
#[enum_dispatch]
pub trait Shape {
    /// Axis-aligned bounding box in diagram space
    fn bounds(&self) -> Bounds;

    fn style(&self) -> &Style;

    /// Constraint markers attached to this primitive
    fn markers(&self) -> &[ConstraintMarker] {
        &[]
    }

    /// Origin that child marker geometry is relative to.
    /// Box shapes use their origin corner; edges live in diagram space.
    fn marker_origin(&self) -> Point {
        Point::ZERO
    }

    /// Whether the primitive's own boundary is an attachment outline
    fn is_outline_constraint(&self) -> bool {
        false
    }

    /// Edge geometry, for edge-like primitives
    fn edge(&self) -> Option<(EdgeKind, &EdgeGeometry)> {
        None
    }

    fn translate(&mut self, by: DVec2);
}

/// A line with optional intermediate waypoints
#[derive(Debug, Clone, PartialEq)]
pub struct LineShape {
    pub geometry: EdgeGeometry,
    pub style: Style,
    pub outline_constraint: bool,
    pub markers: Vec<ConstraintMarker>,
}

/// A smooth curve through its control points
#[derive(Debug, Clone, PartialEq)]
pub struct CurveShape {
    pub geometry: EdgeGeometry,
    pub style: Style,
    pub outline_constraint: bool,
    pub markers: Vec<ConstraintMarker>,
}

macro_rules! edge_shape {
    ($ty:ident, $kind:expr) => {
        impl $ty {
            pub fn new(geometry: EdgeGeometry) -> Self {
                Self {
                    geometry,
                    style: Style::default(),
                    outline_constraint: false,
                    markers: Vec::new(),
                }
            }

            pub fn with_style(mut self, style: Style) -> Self {
                self.style = style;
                self
            }

            pub fn with_outline_constraint(mut self, outline: bool) -> Self {
                self.outline_constraint = outline;
                self
            }

            pub fn with_marker(mut self, marker: ConstraintMarker) -> Self {
                self.markers.push(marker);
                self
            }
        }

        impl Shape for $ty {
            fn bounds(&self) -> Bounds {
                self.geometry.bounds()
            }

            fn style(&self) -> &Style {
                &self.style
            }

            fn markers(&self) -> &[ConstraintMarker] {
                &self.markers
            }

            fn is_outline_constraint(&self) -> bool {
                self.outline_constraint
            }

            fn edge(&self) -> Option<(EdgeKind, &EdgeGeometry)> {
                Some(($kind, &self.geometry))
            }

            fn translate(&mut self, by: DVec2) {
                self.geometry.translate(by);
                // marker geometry is in diagram space for edges
                for marker in &mut self.markers {
                    *marker = marker.translated(by);
                }
            }
        }
    };
}

edge_shape!(LineShape, EdgeKind::Line);
edge_shape!(CurveShape, EdgeKind::Curve);

/// A nested stencil (rectangle, ellipse, named or embedded shape)
#[derive(Debug, Clone, PartialEq)]
pub struct SubStencilShape {
    pub shape: ShapeRef,
    pub geometry: Bounds,
    pub style: Style,
    pub outline_constraint: bool,
    pub markers: Vec<ConstraintMarker>,
}

impl SubStencilShape {
    pub fn new(shape: ShapeRef, geometry: Bounds) -> Self {
        Self {
            shape,
            geometry,
            style: Style::default(),
            outline_constraint: false,
            markers: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_outline_constraint(mut self, outline: bool) -> Self {
        self.outline_constraint = outline;
        self
    }

    pub fn with_marker(mut self, marker: ConstraintMarker) -> Self {
        self.markers.push(marker);
        self
    }
}

impl Shape for SubStencilShape {
    fn bounds(&self) -> Bounds {
        self.geometry
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn markers(&self) -> &[ConstraintMarker] {
        &self.markers
    }

    fn marker_origin(&self) -> Point {
        self.geometry.origin()
    }

    fn is_outline_constraint(&self) -> bool {
        self.outline_constraint
    }

    fn translate(&mut self, by: DVec2) {
        self.geometry = self.geometry.translate(by);
    }
}

/// A raster image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageShape {
    pub src: String,
    pub geometry: Bounds,
    pub style: Style,
    pub markers: Vec<ConstraintMarker>,
}

impl ImageShape {
    pub fn new(src: impl Into<String>, geometry: Bounds) -> Self {
        Self {
            src: src.into(),
            geometry,
            style: Style::default(),
            markers: Vec::new(),
        }
    }

    pub fn with_marker(mut self, marker: ConstraintMarker) -> Self {
        self.markers.push(marker);
        self
    }
}

impl Shape for ImageShape {
    fn bounds(&self) -> Bounds {
        self.geometry
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn markers(&self) -> &[ConstraintMarker] {
        &self.markers
    }

    fn marker_origin(&self) -> Point {
        self.geometry.origin()
    }

    fn translate(&mut self, by: DVec2) {
        self.geometry = self.geometry.translate(by);
    }
}

/// A text label; never compiled into a stencil body
#[derive(Debug, Clone, PartialEq)]
pub struct TextShape {
    pub value: String,
    pub geometry: Bounds,
    pub style: Style,
}

impl TextShape {
    pub fn new(value: impl Into<String>, geometry: Bounds) -> Self {
        Self {
            value: value.into(),
            geometry,
            style: Style::default(),
        }
    }
}

impl Shape for TextShape {
    fn bounds(&self) -> Bounds {
        self.geometry
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn translate(&mut self, by: DVec2) {
        self.geometry = self.geometry.translate(by);
    }
}

/// Edges grouped to be drawn as one continuous path.
///
/// The edges are stitched end to end when compiled, in the same way a
/// single-path merge joins a whole selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PathGroupShape {
    pub edges: Vec<(EdgeKind, EdgeGeometry)>,
    pub style: Style,
}

impl PathGroupShape {
    pub fn new(edges: Vec<(EdgeKind, EdgeGeometry)>) -> Self {
        Self {
            edges,
            style: Style::default(),
        }
    }

    /// Group the edges of `members`; `None` if any member is not an edge
    pub fn from_members(members: &[PrimitiveShape]) -> Option<Self> {
        let edges = members
            .iter()
            .map(|member| member.edge().map(|(kind, geometry)| (kind, geometry.clone())))
            .collect::<Option<Vec<_>>>()?;
        let style = members.first().map(|m| m.style().clone()).unwrap_or_default();
        Some(Self { edges, style })
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

impl Shape for PathGroupShape {
    fn bounds(&self) -> Bounds {
        let mut builder = BoundsBuilder::new();
        for (_, geometry) in &self.edges {
            builder.expand_box(&geometry.bounds());
        }
        builder.build().unwrap_or_default()
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn translate(&mut self, by: DVec2) {
        for (_, geometry) in &mut self.edges {
            geometry.translate(by);
        }
    }
}

/// Any primitive that can be selected for merging
#[enum_dispatch(Shape)]
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveShape {
    Line(LineShape),
    Curve(CurveShape),
    SubStencil(SubStencilShape),
    Image(ImageShape),
    Text(TextShape),
    PathGroup(PathGroupShape),
}

impl PrimitiveShape {
    pub fn is_text(&self) -> bool {
        matches!(self, PrimitiveShape::Text(_))
    }

    /// Mutable access to the own-outline flag, for shapes that carry one
    pub(crate) fn outline_flag_mut(&mut self) -> Option<&mut bool> {
        match self {
            PrimitiveShape::Line(s) => Some(&mut s.outline_constraint),
            PrimitiveShape::Curve(s) => Some(&mut s.outline_constraint),
            PrimitiveShape::SubStencil(s) => Some(&mut s.outline_constraint),
            PrimitiveShape::Image(_) | PrimitiveShape::Text(_) | PrimitiveShape::PathGroup(_) => None,
        }
    }

    pub(crate) fn style_mut(&mut self) -> &mut Style {
        match self {
            PrimitiveShape::Line(s) => &mut s.style,
            PrimitiveShape::Curve(s) => &mut s.style,
            PrimitiveShape::SubStencil(s) => &mut s.style,
            PrimitiveShape::Image(s) => &mut s.style,
            PrimitiveShape::Text(s) => &mut s.style,
            PrimitiveShape::PathGroup(s) => &mut s.style,
        }
    }
}
