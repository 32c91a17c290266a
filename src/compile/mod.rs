//! Compile a selection of primitives into one stencil
//!
//! This module is organized into submodules:
//! - `defaults`: named tunables
//! - `geometry`: bounds, curve math and stepping helpers
//! - `path_builder`: point lists to drawing commands
//! - `stitch`: joining edges into one path
//! - `hit_test`: point-in-shape queries for scans
//! - `sampling`: attachment geometry to constraint records
//!
//! `Compiler` drives them: it computes the group bounds, writes one drawing
//! and style block per primitive, and appends the constraint records and
//! attack metadata every marker produces.

pub mod defaults;
pub mod geometry;
pub mod path_builder;
pub mod sampling;
pub mod stitch;

use crate::config::CompileOptions;
use crate::errors::{Result, StencilError};
use crate::log::debug;
use crate::shapes::{EdgeKind, MarkerKind, PrimitiveShape, Shape, ShapeRef, Style};
use crate::stencil::{
    Codec, Connection, ConstraintTag, EdgeAttack, ForegroundNode, RegionAttack, RegionKind,
    Resolver, StencilDocument, TagKind,
};
use crate::types::{Bounds, Point};

use hit_test::HitTest;
use path_builder::{PathBuilder, build_curve_path};
use sampling::Sampler;
use stitch::StitchEdge;

/// How each primitive's style block paints it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundPolicy {
    /// `fillcolor` (when set) then `fillstroke`
    #[default]
    Filled,
    /// `stroke` only
    StrokeOnly,
}

/// How the foreground is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// One drawing node and style block per primitive
    #[default]
    Shapes,
    /// Every primitive is an edge; they are stitched into one filled path
    SinglePath,
}

/// Output of a compile run
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub document: StencilDocument,
    /// Group bounds; the merged element's geometry
    pub bounds: Bounds,
    /// Text primitives left out of the stencil, in selection order
    pub texts: Vec<PrimitiveShape>,
}

impl Compiled {
    /// `shape=stencil(<token>);` for the merged element
    pub fn style(&self, codec: &dyn Codec) -> Result<String> {
        let xml = self.document.to_xml()?;
        Ok(ShapeRef::Embedded(codec.compress(&xml)).to_style())
    }
}

/// Compiles primitives into stencil documents
pub struct Compiler<'a> {
    resolver: Resolver<'a>,
    hit_test: &'a dyn HitTest,
    options: CompileOptions,
}

impl<'a> Compiler<'a> {
    pub fn new(resolver: Resolver<'a>, hit_test: &'a dyn HitTest) -> Self {
        Self {
            resolver,
            hit_test,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn compile(
        &self,
        primitives: &[PrimitiveShape],
        policy: BackgroundPolicy,
        mode: MergeMode,
    ) -> Result<Compiled> {
        let (texts, body): (Vec<_>, Vec<_>) = primitives.iter().cloned().partition(PrimitiveShape::is_text);
        if body.is_empty() {
            return Err(StencilError::EmptySelection);
        }

        // texts are not drawn but still size the group
        let bounds = geometry::bounds_of(primitives)?;
        if bounds.is_degenerate() {
            return Err(StencilError::DegenerateBounds {
                w: bounds.w,
                h: bounds.h,
            });
        }
        debug!(
            primitives = body.len(),
            texts = texts.len(),
            %bounds,
            ?mode,
            "compiling stencil"
        );

        let mut serializer = Serializer {
            doc: StencilDocument::new(bounds.w, bounds.h),
            bounds,
            sampler: Sampler::new(bounds, self.options.sampling, self.hit_test, self.resolver)
                .with_flatten_segments(self.options.flatten_segments),
            options: &self.options,
            next_tag: 0,
        };
        serializer.doc.foreground.push(ForegroundNode::FillStroke);

        match mode {
            MergeMode::Shapes => {
                for shape in &body {
                    serializer.draw(shape)?;
                    serializer.style_block(shape.style(), policy);
                }
            }
            MergeMode::SinglePath => serializer.single_path(&body)?,
        }
        for shape in &body {
            serializer.constraints(shape)?;
        }

        Ok(Compiled {
            document: serializer.doc,
            bounds,
            texts,
        })
    }
}

/// State of one compile run
struct Serializer<'a, 'o> {
    doc: StencilDocument,
    bounds: Bounds,
    sampler: Sampler<'a>,
    options: &'o CompileOptions,
    next_tag: u32,
}

impl Serializer<'_, '_> {
    fn local_box(&self, b: &Bounds) -> Bounds {
        b.translate(-self.bounds.origin())
    }

    fn local_points(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.bounds.to_local(*p)).collect()
    }

    fn tag(&mut self, kind: TagKind, label: &str) -> String {
        let tag = ConstraintTag::new(kind, self.next_tag, label);
        self.next_tag += 1;
        tag.to_string()
    }

    fn draw(&mut self, shape: &PrimitiveShape) -> Result<()> {
        let node = match shape {
            PrimitiveShape::Line(line) => {
                let mut builder =
                    PathBuilder::new(self.bounds.origin()).with_rounding_blend(self.options.rounding_blend);
                let points = line.geometry.all_points();
                builder.move_to(points[0]);
                builder.line_through(&points, line.style.rounded);
                ForegroundNode::Path(builder.build())
            }
            PrimitiveShape::Curve(curve) => {
                ForegroundNode::Path(build_curve_path(&curve.geometry.all_points(), &self.bounds))
            }
            PrimitiveShape::SubStencil(sub) => {
                let bounds = self.local_box(&sub.geometry);
                match &sub.shape {
                    ShapeRef::Rectangle => ForegroundNode::Rect(bounds),
                    ShapeRef::Ellipse => ForegroundNode::Ellipse(bounds),
                    other => ForegroundNode::IncludeShape {
                        name: other.to_string(),
                        bounds,
                    },
                }
            }
            PrimitiveShape::Image(image) => ForegroundNode::Image {
                src: image.src.clone(),
                bounds: self.local_box(&image.geometry),
            },
            PrimitiveShape::PathGroup(group) => {
                let edges: Vec<_> = group
                    .edges
                    .iter()
                    .map(|(kind, geometry)| StitchEdge::new(*kind, geometry))
                    .collect();
                ForegroundNode::Path(stitch::stitch_with_tolerance(
                    &edges,
                    &self.bounds,
                    self.options.stitch_tolerance,
                )?)
            }
            PrimitiveShape::Text(_) => return Ok(()),
        };
        self.doc.foreground.push(node);
        Ok(())
    }

    fn style_block(&mut self, style: &Style, policy: BackgroundPolicy) {
        let foreground = &mut self.doc.foreground;
        if style.dashed {
            foreground.push(ForegroundNode::Dashed(true));
            if let Some(pattern) = &style.dash_pattern {
                foreground.push(ForegroundNode::DashPattern(pattern.clone()));
            }
        }
        if let Some(width) = style.stroke_width {
            foreground.push(ForegroundNode::StrokeWidth(width));
        }
        foreground.push(ForegroundNode::StrokeColor(style.stroke_color.clone()));
        match policy {
            BackgroundPolicy::Filled => {
                if let Some(fill) = &style.fill_color {
                    foreground.push(ForegroundNode::FillColor(fill.clone()));
                }
                foreground.push(ForegroundNode::FillStroke);
            }
            BackgroundPolicy::StrokeOnly => foreground.push(ForegroundNode::Stroke),
        }
    }

    fn single_path(&mut self, body: &[PrimitiveShape]) -> Result<()> {
        let mut edges = Vec::with_capacity(body.len());
        for (index, shape) in body.iter().enumerate() {
            if let PrimitiveShape::PathGroup(group) = shape {
                edges.extend(
                    group
                        .edges
                        .iter()
                        .map(|(kind, geometry)| StitchEdge::new(*kind, geometry)),
                );
                continue;
            }
            let (kind, geometry) = shape.edge().ok_or(StencilError::NotAnEdge { index })?;
            edges.push(StitchEdge::new(kind, geometry));
        }
        let path = stitch::stitch_with_tolerance(&edges, &self.bounds, self.options.stitch_tolerance)?;
        self.doc.foreground.push(ForegroundNode::Path(path));
        self.doc.foreground.push(ForegroundNode::FillStroke);
        Ok(())
    }

    /// Records and metadata for the shape's own outline and its markers
    fn constraints(&mut self, shape: &PrimitiveShape) -> Result<()> {
        if shape.is_outline_constraint() {
            match shape {
                PrimitiveShape::SubStencil(sub) => {
                    self.region(RegionKind::Outline, &sub.shape, &sub.geometry, "", true)?
                }
                _ => {
                    if let Some((kind, geometry)) = shape.edge() {
                        self.edge(kind, &geometry.all_points(), "", true);
                    }
                }
            }
        }

        let origin = shape.marker_origin();
        for marker in shape.markers() {
            let marker = marker.translated(origin);
            match &marker.kind {
                MarkerKind::Point { geometry } => {
                    let name = self.tag(TagKind::Point, &marker.label);
                    let record = self.sampler.point(geometry, &name);
                    self.doc.connections.push(Connection::Constraint(record));
                }
                MarkerKind::Edge { kind, geometry } => {
                    self.edge(*kind, &geometry.all_points(), &marker.label, false)
                }
                MarkerKind::Outline { shape, geometry } => {
                    self.region(RegionKind::Outline, shape, geometry, &marker.label, false)?
                }
                MarkerKind::Area { shape, geometry } => {
                    self.region(RegionKind::Area, shape, geometry, &marker.label, false)?
                }
            }
        }
        Ok(())
    }

    fn edge(&mut self, kind: EdgeKind, points: &[Point], label: &str, owner_self: bool) {
        let name = self.tag(kind.into(), label);
        let local = self.local_points(points);
        self.doc.connections.push(Connection::EdgeAttack(EdgeAttack {
            name: name.clone(),
            kind,
            owner_self,
            points: local,
        }));
        let records = self.sampler.edge(kind, points, &name);
        self.doc
            .connections
            .extend(records.into_iter().map(Connection::Constraint));
    }

    fn region(
        &mut self,
        kind: RegionKind,
        shape: &ShapeRef,
        region: &Bounds,
        label: &str,
        owner_self: bool,
    ) -> Result<()> {
        let tag_kind = match kind {
            RegionKind::Outline => TagKind::Outline,
            RegionKind::Area => TagKind::Area,
        };
        let name = self.tag(tag_kind, label);
        let records = match kind {
            RegionKind::Outline => self.sampler.outline(shape, region, &name)?,
            RegionKind::Area => self.sampler.area(shape, region, &name)?,
        };
        let local = self.local_box(region);
        self.doc.connections.push(Connection::RegionAttack(RegionAttack {
            name,
            kind,
            owner_self,
            shape: shape.clone(),
            region: local,
        }));
        self.doc
            .connections
            .extend(records.into_iter().map(Connection::Constraint));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{
        ConstraintMarker, CurveShape, EdgeGeometry, ImageShape, LineShape, PathGroupShape,
        SubStencilShape, TextShape,
    };
    use crate::stencil::{Base64Codec, DrawCommand, MemoryRegistry};
    use crate::types::pt;
    use hit_test::GeometricHitTester;

    fn compile(primitives: &[PrimitiveShape], policy: BackgroundPolicy, mode: MergeMode) -> Result<Compiled> {
        let registry = MemoryRegistry::new();
        let hit = GeometricHitTester::new();
        Compiler::new(Resolver::new(&Base64Codec, &registry), &hit).compile(primitives, policy, mode)
    }

    fn line(points: &[Point]) -> LineShape {
        LineShape::new(EdgeGeometry::from_points(points).unwrap())
    }

    #[test]
    fn single_line_document() {
        let shapes = [line(&[pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)]).into()];
        let compiled = compile(&shapes, BackgroundPolicy::Filled, MergeMode::Shapes).unwrap();
        assert_eq!(compiled.bounds, Bounds::new(0.0, 0.0, 10.0, 10.0));
        let doc = &compiled.document;
        assert_eq!((doc.w, doc.h), (10.0, 10.0));
        assert!(doc.connections.is_empty());
        assert_eq!(
            doc.foreground,
            vec![
                ForegroundNode::FillStroke,
                ForegroundNode::Path(crate::stencil::Path::new(vec![
                    DrawCommand::Move(pt(0.0, 0.0)),
                    DrawCommand::Line(pt(10.0, 0.0)),
                    DrawCommand::Line(pt(10.0, 10.0)),
                ])),
                ForegroundNode::StrokeColor("#000000".into()),
                ForegroundNode::FillStroke,
            ]
        );
    }

    #[test]
    fn style_block_order() {
        let style = Style::default()
            .with_dashed(Some("4 2".into()))
            .with_stroke_width(2.0)
            .with_stroke_color("#112233")
            .with_fill_color("#abcdef");
        let rect = SubStencilShape::new(ShapeRef::Rectangle, Bounds::new(5.0, 5.0, 10.0, 10.0)).with_style(style);
        let filled = compile(&[rect.clone().into()], BackgroundPolicy::Filled, MergeMode::Shapes).unwrap();
        assert_eq!(
            filled.document.foreground[1..],
            [
                ForegroundNode::Rect(Bounds::new(0.0, 0.0, 10.0, 10.0)),
                ForegroundNode::Dashed(true),
                ForegroundNode::DashPattern("4 2".into()),
                ForegroundNode::StrokeWidth(2.0),
                ForegroundNode::StrokeColor("#112233".into()),
                ForegroundNode::FillColor("#abcdef".into()),
                ForegroundNode::FillStroke,
            ]
        );
        let stroked = compile(&[rect.into()], BackgroundPolicy::StrokeOnly, MergeMode::Shapes).unwrap();
        assert_eq!(stroked.document.foreground.last(), Some(&ForegroundNode::Stroke));
        assert!(
            !stroked
                .document
                .foreground
                .iter()
                .any(|n| matches!(n, ForegroundNode::FillColor(_)))
        );
    }

    #[test]
    fn texts_are_set_aside() {
        let shapes = [
            TextShape::new("label", Bounds::new(100.0, 100.0, 50.0, 10.0)).into(),
            ImageShape::new("icon.png", Bounds::new(0.0, 0.0, 8.0, 8.0)).into(),
        ];
        let compiled = compile(&shapes, BackgroundPolicy::Filled, MergeMode::Shapes).unwrap();
        assert_eq!(compiled.texts, vec![shapes[0].clone()]);
        assert_eq!(compiled.bounds, Bounds::new(0.0, 0.0, 150.0, 110.0));
        assert_eq!(
            compiled.document.foreground[1],
            ForegroundNode::Image {
                src: "icon.png".into(),
                bounds: Bounds::new(0.0, 0.0, 8.0, 8.0)
            }
        );
    }

    #[test]
    fn only_text_is_empty_selection() {
        let shapes = [TextShape::new("label", Bounds::new(0.0, 0.0, 5.0, 5.0)).into()];
        let err = compile(&shapes, BackgroundPolicy::Filled, MergeMode::Shapes).unwrap_err();
        assert!(matches!(err, StencilError::EmptySelection));
    }

    #[test]
    fn flat_selection_is_degenerate() {
        let shapes = [line(&[pt(0.0, 0.0), pt(10.0, 0.0)]).into()];
        let err = compile(&shapes, BackgroundPolicy::Filled, MergeMode::Shapes).unwrap_err();
        assert!(matches!(err, StencilError::DegenerateBounds { h, .. } if h == 0.0));
    }

    #[test]
    fn single_path_stitches_edges() {
        let shapes = [
            line(&[pt(5.0, 0.0), pt(5.0, 5.0)]).into(),
            line(&[pt(0.0, 0.0), pt(5.0, 0.0)]).into(),
        ];
        let compiled = compile(&shapes, BackgroundPolicy::Filled, MergeMode::SinglePath).unwrap();
        assert_eq!(
            compiled.document.foreground,
            vec![
                ForegroundNode::FillStroke,
                ForegroundNode::Path(crate::stencil::Path::new(vec![
                    DrawCommand::Move(pt(0.0, 0.0)),
                    DrawCommand::Line(pt(5.0, 0.0)),
                    DrawCommand::Line(pt(5.0, 5.0)),
                ])),
                ForegroundNode::FillStroke,
            ]
        );
    }

    #[test]
    fn single_path_rejects_boxes() {
        let shapes = [
            line(&[pt(0.0, 0.0), pt(5.0, 5.0)]).into(),
            SubStencilShape::new(ShapeRef::Ellipse, Bounds::new(0.0, 0.0, 5.0, 5.0)).into(),
        ];
        let err = compile(&shapes, BackgroundPolicy::Filled, MergeMode::SinglePath).unwrap_err();
        assert!(matches!(err, StencilError::NotAnEdge { index: 1 }));
    }

    #[test]
    fn text_outside_the_drawing_widens_bounds() {
        let shapes = [
            line(&[pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)]).into(),
            TextShape::new("caption", Bounds::new(0.0, 20.0, 40.0, 10.0)).into(),
        ];
        let compiled = compile(&shapes, BackgroundPolicy::Filled, MergeMode::Shapes).unwrap();
        assert_eq!(compiled.bounds, Bounds::new(0.0, 0.0, 40.0, 30.0));
        assert_eq!((compiled.document.w, compiled.document.h), (40.0, 30.0));
        assert_eq!(compiled.texts.len(), 1);
        assert_eq!(
            compiled.document.foreground[1],
            ForegroundNode::Path(crate::stencil::Path::new(vec![
                DrawCommand::Move(pt(0.0, 0.0)),
                DrawCommand::Line(pt(10.0, 0.0)),
                DrawCommand::Line(pt(10.0, 10.0)),
            ]))
        );
    }

    fn edge_group(edges: &[&[Point]]) -> PrimitiveShape {
        let members: Vec<PrimitiveShape> = edges.iter().map(|points| line(points).into()).collect();
        PathGroupShape::from_members(&members).unwrap().into()
    }

    #[test]
    fn grouped_edges_draw_one_path() {
        let shapes = [
            edge_group(&[&[pt(0.0, 0.0), pt(10.0, 0.0)], &[pt(10.0, 10.0), pt(10.0, 0.0)]]),
            SubStencilShape::new(ShapeRef::Rectangle, Bounds::new(20.0, 0.0, 5.0, 5.0)).into(),
        ];
        let compiled = compile(&shapes, BackgroundPolicy::Filled, MergeMode::Shapes).unwrap();
        assert_eq!(compiled.bounds, Bounds::new(0.0, 0.0, 25.0, 10.0));
        assert_eq!(
            compiled.document.foreground,
            vec![
                ForegroundNode::FillStroke,
                ForegroundNode::Path(crate::stencil::Path::new(vec![
                    DrawCommand::Move(pt(0.0, 0.0)),
                    DrawCommand::Line(pt(10.0, 0.0)),
                    DrawCommand::Line(pt(10.0, 10.0)),
                ])),
                ForegroundNode::StrokeColor("#000000".into()),
                ForegroundNode::FillStroke,
                ForegroundNode::Rect(Bounds::new(20.0, 0.0, 5.0, 5.0)),
                ForegroundNode::StrokeColor("#000000".into()),
                ForegroundNode::FillStroke,
            ]
        );
    }

    #[test]
    fn disconnected_group_is_rejected() {
        let shapes = [edge_group(&[
            &[pt(0.0, 0.0), pt(10.0, 0.0)],
            &[pt(0.0, 10.0), pt(10.0, 10.0)],
        ])];
        let err = compile(&shapes, BackgroundPolicy::Filled, MergeMode::Shapes).unwrap_err();
        assert!(matches!(err, StencilError::DisconnectedEdges { stitched: 1, .. }));
    }

    #[test]
    fn single_path_joins_group_edges() {
        let shapes = [
            edge_group(&[&[pt(0.0, 0.0), pt(5.0, 0.0)]]),
            line(&[pt(5.0, 0.0), pt(5.0, 5.0)]).into(),
        ];
        let compiled = compile(&shapes, BackgroundPolicy::Filled, MergeMode::SinglePath).unwrap();
        assert_eq!(
            compiled.document.foreground[1],
            ForegroundNode::Path(crate::stencil::Path::new(vec![
                DrawCommand::Move(pt(0.0, 0.0)),
                DrawCommand::Line(pt(5.0, 0.0)),
                DrawCommand::Line(pt(5.0, 5.0)),
            ]))
        );
    }

    #[test]
    fn markers_produce_tagged_records() {
        let rect = SubStencilShape::new(ShapeRef::Rectangle, Bounds::new(10.0, 10.0, 20.0, 20.0))
            .with_marker(ConstraintMarker::point(Bounds::new(8.0, -2.0, 4.0, 4.0)).with_label("top"))
            .with_marker(ConstraintMarker::area(ShapeRef::Rectangle, Bounds::new(0.0, 0.0, 20.0, 20.0)));
        let compiled = compile(&[rect.into()], BackgroundPolicy::Filled, MergeMode::Shapes).unwrap();
        let doc = &compiled.document;

        let Connection::Constraint(top) = &doc.connections[0] else {
            panic!("expected point record first");
        };
        assert_eq!(top.name, "point-0/top");
        assert_eq!((top.x, top.y), (0.5, 0.0));

        let Connection::RegionAttack(attack) = &doc.connections[1] else {
            panic!("expected area metadata");
        };
        assert_eq!(attack.name, "area-1");
        assert_eq!(attack.region, Bounds::new(0.0, 0.0, 20.0, 20.0));
        assert!(!attack.owner_self);
        assert_eq!(doc.constraints().filter(|r| r.name == "area-1").count(), 25);
    }

    #[test]
    fn own_outline_is_marked_self() {
        let curve = CurveShape::new(EdgeGeometry::new(pt(0.0, 10.0), vec![pt(5.0, 0.0)], pt(10.0, 10.0)))
            .with_outline_constraint(true);
        let compiled = compile(&[curve.into()], BackgroundPolicy::Filled, MergeMode::Shapes).unwrap();
        let doc = &compiled.document;
        let Connection::EdgeAttack(attack) = &doc.connections[0] else {
            panic!("expected curve metadata");
        };
        assert_eq!(attack.kind, EdgeKind::Curve);
        assert!(attack.owner_self);
        assert_eq!(attack.name, "curve-0");
        assert_eq!(doc.constraints().count(), 50);
        assert!(
            doc.constraints()
                .all(|r| (0.0..=1.0).contains(&r.x) && (0.0..=1.0).contains(&r.y))
        );
    }

    #[test]
    fn embedded_style_round_trips() {
        let shapes = [line(&[pt(0.0, 0.0), pt(4.0, 4.0)]).into()];
        let compiled = compile(&shapes, BackgroundPolicy::Filled, MergeMode::Shapes).unwrap();
        let style = compiled.style(&Base64Codec).unwrap();
        let Some(ShapeRef::Embedded(token)) = ShapeRef::from_style(&style) else {
            panic!("expected embedded stencil in {style}");
        };
        let xml = Base64Codec.decompress(&token).unwrap();
        assert_eq!(StencilDocument::parse(&xml).unwrap(), compiled.document);
    }
}
