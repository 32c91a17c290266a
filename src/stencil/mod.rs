//! Stencil document tree
//!
//! This module is organized into submodules:
//! - `xml`: conversion between the typed tree and its XML text form
//! - `codec`: the string packing used to embed a stencil in a style
//! - `registry`: named stencils and reference resolution
//!
//! A stencil is a root `shape` owning a `connections` list (constraint
//! records plus the attack metadata that lets the decompiler rebuild markers)
//! and a `foreground` list (drawing and style nodes, in paint order).

pub mod codec;
pub mod registry;
pub mod xml;

use std::fmt;

pub use codec::{Base64Codec, Codec};
pub use registry::{MemoryRegistry, Resolver, StencilRegistry};

use crate::shapes::{EdgeKind, ShapeRef};
use crate::types::{Bounds, Point};

// ============================================================================
// Drawing commands
// ============================================================================

/// One step of a path, in stencil-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    Move(Point),
    Line(Point),
    Quad { control: Point, end: Point },
    Close,
}

impl DrawCommand {
    /// Where the pen is after this command (`None` for `Close`)
    pub fn end_point(&self) -> Option<Point> {
        match self {
            DrawCommand::Move(p) | DrawCommand::Line(p) => Some(*p),
            DrawCommand::Quad { end, .. } => Some(*end),
            DrawCommand::Close => None,
        }
    }
}

/// An ordered sequence of drawing commands
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    pub commands: Vec<DrawCommand>,
}

impl Path {
    pub fn new(commands: Vec<DrawCommand>) -> Self {
        Self { commands }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn first_point(&self) -> Option<Point> {
        self.commands.iter().find_map(DrawCommand::end_point)
    }

    pub fn end_point(&self) -> Option<Point> {
        self.commands.iter().rev().find_map(DrawCommand::end_point)
    }
}

// ============================================================================
// Constraint tags
// ============================================================================

/// What produced a constraint record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Point,
    Line,
    Curve,
    Outline,
    Area,
}

impl TagKind {
    fn as_str(self) -> &'static str {
        match self {
            TagKind::Point => "point",
            TagKind::Line => "line",
            TagKind::Curve => "curve",
            TagKind::Outline => "outline",
            TagKind::Area => "area",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "point" => Some(TagKind::Point),
            "line" => Some(TagKind::Line),
            "curve" => Some(TagKind::Curve),
            "outline" => Some(TagKind::Outline),
            "area" => Some(TagKind::Area),
            _ => None,
        }
    }
}

impl From<EdgeKind> for TagKind {
    fn from(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Line => TagKind::Line,
            EdgeKind::Curve => TagKind::Curve,
        }
    }
}

/// Name shared by every record sampled from one marker: `<kind>-<id>[/<label>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintTag {
    pub kind: TagKind,
    pub id: u32,
    pub label: String,
}

impl ConstraintTag {
    pub fn new(kind: TagKind, id: u32, label: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            label: label.into(),
        }
    }

    /// `None` for names this crate did not produce
    pub fn parse(name: &str) -> Option<Self> {
        let (head, label) = match name.split_once('/') {
            Some((head, label)) => (head, label),
            None => (name, ""),
        };
        let (kind, id) = head.split_once('-')?;
        Some(Self {
            kind: TagKind::parse(kind)?,
            id: id.parse().ok()?,
            label: label.to_string(),
        })
    }
}

impl fmt::Display for ConstraintTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.as_str(), self.id)?;
        if !self.label.is_empty() {
            write!(f, "/{}", self.label)?;
        }
        Ok(())
    }
}

// ============================================================================
// Connections
// ============================================================================

/// Normalized attachment point; `perimeter` is always written as 0
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintRecord {
    /// Fraction of the stencil width
    pub x: f64,
    /// Fraction of the stencil height
    pub y: f64,
    pub name: String,
}

/// Raw point list of a sampled line or curve (`lineattack` / `curveattack`)
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeAttack {
    pub name: String,
    pub kind: EdgeKind,
    /// Sampled from the primitive's own outline rather than a child marker
    pub owner_self: bool,
    /// Stencil-local points
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Outline,
    Area,
}

impl RegionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RegionKind::Outline => "outline",
            RegionKind::Area => "area",
        }
    }
}

/// Region shape and box of a sampled outline or area (`areaattack`)
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAttack {
    pub name: String,
    pub kind: RegionKind,
    pub owner_self: bool,
    pub shape: ShapeRef,
    /// Stencil-local box
    pub region: Bounds,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Connection {
    Constraint(ConstraintRecord),
    EdgeAttack(EdgeAttack),
    RegionAttack(RegionAttack),
    /// Tag this crate does not interpret, kept for forward compatibility
    Unknown(String),
}

// ============================================================================
// Foreground
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ForegroundNode {
    Path(Path),
    Rect(Bounds),
    Ellipse(Bounds),
    IncludeShape { name: String, bounds: Bounds },
    Image { src: String, bounds: Bounds },
    Dashed(bool),
    DashPattern(String),
    StrokeWidth(f64),
    StrokeColor(String),
    FillColor(String),
    Stroke,
    FillStroke,
    Unknown(String),
}

impl ForegroundNode {
    /// Nodes that draw something (as opposed to setting style or painting)
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            ForegroundNode::Path(_)
                | ForegroundNode::Rect(_)
                | ForegroundNode::Ellipse(_)
                | ForegroundNode::IncludeShape { .. }
                | ForegroundNode::Image { .. }
        )
    }
}

// ============================================================================
// Document
// ============================================================================

/// A complete stencil: size, connections and foreground
#[derive(Debug, Clone, PartialEq)]
pub struct StencilDocument {
    pub w: f64,
    pub h: f64,
    /// `aspect="fixed"`
    pub fixed_aspect: bool,
    /// Value of the root `strokewidth` attribute (`inherit` for compiled stencils)
    pub stroke_width: String,
    pub connections: Vec<Connection>,
    pub foreground: Vec<ForegroundNode>,
}

impl StencilDocument {
    pub fn new(w: f64, h: f64) -> Self {
        Self {
            w,
            h,
            fixed_aspect: true,
            stroke_width: "inherit".to_string(),
            connections: Vec::new(),
            foreground: Vec::new(),
        }
    }

    /// Unit-sized document drawing a single node
    pub fn single(node: ForegroundNode) -> Self {
        let mut doc = Self::new(1.0, 1.0);
        doc.foreground.push(node);
        doc
    }

    pub fn constraints(&self) -> impl Iterator<Item = &ConstraintRecord> {
        self.connections.iter().filter_map(|c| match c {
            Connection::Constraint(record) => Some(record),
            _ => None,
        })
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.foreground.iter().filter_map(|node| match node {
            ForegroundNode::Path(path) => Some(path),
            _ => None,
        })
    }
}
