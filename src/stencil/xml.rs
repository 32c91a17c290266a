//! XML text form of a stencil
//!
//! Writing goes through facet-derived element types serialized by
//! facet-xml. Reading walks a roxmltree document into the typed tree, so
//! unknown tags can be kept or skipped instead of failing the whole parse.

use facet::Facet;
use facet_xml as xml;
use facet_xml::SerializeOptions;

use crate::errors::{ParseError, Result, StencilError};
use crate::log::{debug, trace};
use crate::shapes::{EdgeKind, ShapeRef};
use crate::types::{self, Bounds, Point, pt};

use super::{
    Connection, ConstraintRecord, DrawCommand, EdgeAttack, ForegroundNode, Path, RegionAttack,
    RegionKind, StencilDocument,
};

// ============================================================================
// Element types
// ============================================================================

/// Root `<shape>` element
#[derive(Facet, Debug, Clone, Default)]
#[facet(rename = "shape")]
pub struct ShapeElement {
    #[facet(xml::attribute)]
    pub h: Option<String>,
    #[facet(xml::attribute)]
    pub w: Option<String>,
    #[facet(xml::attribute)]
    pub aspect: Option<String>,
    #[facet(xml::attribute)]
    pub strokewidth: Option<String>,
    #[facet(xml::elements)]
    pub children: Vec<Section>,
}

#[derive(Facet, Debug, Clone)]
#[repr(u8)]
pub enum Section {
    #[facet(rename = "connections")]
    Connections(ConnectionsElement),
    #[facet(rename = "foreground")]
    Foreground(ForegroundElement),
}

#[derive(Facet, Debug, Clone, Default)]
pub struct ConnectionsElement {
    #[facet(xml::elements)]
    pub children: Vec<ConnectionNode>,
}

#[derive(Facet, Debug, Clone, Default)]
pub struct ForegroundElement {
    #[facet(xml::elements)]
    pub children: Vec<ForegroundItem>,
}

#[derive(Facet, Debug, Clone)]
#[repr(u8)]
pub enum ConnectionNode {
    #[facet(rename = "constraint")]
    Constraint(ConstraintElement),
    #[facet(rename = "lineattack")]
    LineAttack(EdgeAttackElement),
    #[facet(rename = "curveattack")]
    CurveAttack(EdgeAttackElement),
    #[facet(rename = "areaattack")]
    AreaAttack(AreaAttackElement),
}

#[derive(Facet, Debug, Clone, Default)]
pub struct ConstraintElement {
    #[facet(xml::attribute)]
    pub x: Option<String>,
    #[facet(xml::attribute)]
    pub y: Option<String>,
    #[facet(xml::attribute)]
    pub name: Option<String>,
    #[facet(xml::attribute)]
    pub perimeter: Option<String>,
}

#[derive(Facet, Debug, Clone, Default)]
pub struct EdgeAttackElement {
    #[facet(xml::attribute)]
    pub name: Option<String>,
    #[facet(xml::attribute)]
    pub owner: Option<String>,
    #[facet(xml::attribute)]
    pub points: Option<String>,
}

#[derive(Facet, Debug, Clone, Default)]
pub struct AreaAttackElement {
    #[facet(xml::attribute)]
    pub name: Option<String>,
    #[facet(xml::attribute)]
    pub kind: Option<String>,
    #[facet(xml::attribute)]
    pub owner: Option<String>,
    #[facet(xml::attribute)]
    pub shape: Option<String>,
    #[facet(xml::attribute)]
    pub x: Option<String>,
    #[facet(xml::attribute)]
    pub y: Option<String>,
    #[facet(xml::attribute)]
    pub w: Option<String>,
    #[facet(xml::attribute)]
    pub h: Option<String>,
}

#[derive(Facet, Debug, Clone)]
#[repr(u8)]
pub enum ForegroundItem {
    #[facet(rename = "path")]
    Path(PathElement),
    #[facet(rename = "rect")]
    Rect(BoxElement),
    #[facet(rename = "ellipse")]
    Ellipse(BoxElement),
    #[facet(rename = "include-shape")]
    IncludeShape(IncludeShapeElement),
    #[facet(rename = "image")]
    Image(ImageElement),
    #[facet(rename = "dashed")]
    Dashed(DashedElement),
    #[facet(rename = "dashpattern")]
    DashPattern(DashPatternElement),
    #[facet(rename = "strokewidth")]
    StrokeWidth(StrokeWidthElement),
    #[facet(rename = "strokecolor")]
    StrokeColor(ColorElement),
    #[facet(rename = "fillcolor")]
    FillColor(ColorElement),
    #[facet(rename = "stroke")]
    Stroke(EmptyElement),
    #[facet(rename = "fillstroke")]
    FillStroke(EmptyElement),
}

/// Element without attributes or children
#[derive(Facet, Debug, Clone, Default)]
pub struct EmptyElement {}

#[derive(Facet, Debug, Clone, Default)]
pub struct BoxElement {
    #[facet(xml::attribute)]
    pub x: Option<String>,
    #[facet(xml::attribute)]
    pub y: Option<String>,
    #[facet(xml::attribute)]
    pub w: Option<String>,
    #[facet(xml::attribute)]
    pub h: Option<String>,
}

impl BoxElement {
    fn new(bounds: &Bounds) -> Self {
        Self {
            x: Some(format_number(bounds.x)),
            y: Some(format_number(bounds.y)),
            w: Some(format_number(bounds.w)),
            h: Some(format_number(bounds.h)),
        }
    }
}

#[derive(Facet, Debug, Clone, Default)]
pub struct IncludeShapeElement {
    #[facet(xml::attribute)]
    pub name: Option<String>,
    #[facet(xml::attribute)]
    pub x: Option<String>,
    #[facet(xml::attribute)]
    pub y: Option<String>,
    #[facet(xml::attribute)]
    pub w: Option<String>,
    #[facet(xml::attribute)]
    pub h: Option<String>,
}

#[derive(Facet, Debug, Clone, Default)]
pub struct ImageElement {
    #[facet(xml::attribute)]
    pub src: Option<String>,
    #[facet(xml::attribute)]
    pub x: Option<String>,
    #[facet(xml::attribute)]
    pub y: Option<String>,
    #[facet(xml::attribute)]
    pub w: Option<String>,
    #[facet(xml::attribute)]
    pub h: Option<String>,
}

#[derive(Facet, Debug, Clone, Default)]
pub struct DashedElement {
    #[facet(xml::attribute)]
    pub dashed: Option<String>,
}

#[derive(Facet, Debug, Clone, Default)]
pub struct DashPatternElement {
    #[facet(xml::attribute)]
    pub pattern: Option<String>,
}

#[derive(Facet, Debug, Clone, Default)]
pub struct StrokeWidthElement {
    #[facet(xml::attribute)]
    pub width: Option<String>,
}

#[derive(Facet, Debug, Clone, Default)]
pub struct ColorElement {
    #[facet(xml::attribute)]
    pub color: Option<String>,
}

#[derive(Facet, Debug, Clone, Default)]
pub struct PathElement {
    #[facet(xml::elements)]
    pub commands: Vec<CommandNode>,
}

#[derive(Facet, Debug, Clone)]
#[repr(u8)]
pub enum CommandNode {
    #[facet(rename = "move")]
    Move(PointElement),
    #[facet(rename = "line")]
    Line(PointElement),
    #[facet(rename = "quad")]
    Quad(QuadElement),
    #[facet(rename = "close")]
    Close(EmptyElement),
}

#[derive(Facet, Debug, Clone, Default)]
pub struct PointElement {
    #[facet(xml::attribute)]
    pub x: Option<String>,
    #[facet(xml::attribute)]
    pub y: Option<String>,
}

impl PointElement {
    fn new(p: Point) -> Self {
        Self {
            x: Some(format_number(p.x)),
            y: Some(format_number(p.y)),
        }
    }
}

#[derive(Facet, Debug, Clone, Default)]
pub struct QuadElement {
    #[facet(xml::attribute)]
    pub x1: Option<String>,
    #[facet(xml::attribute)]
    pub y1: Option<String>,
    #[facet(xml::attribute)]
    pub x2: Option<String>,
    #[facet(xml::attribute)]
    pub y2: Option<String>,
}

/// Shortest round-tripping decimal form; `-0` is written as `0`
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{value}")
    }
}

fn format_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", format_number(p.x), format_number(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Typed tree -> elements
// ============================================================================

impl StencilDocument {
    pub fn to_element(&self) -> ShapeElement {
        let connections = ConnectionsElement {
            children: self.connections.iter().filter_map(connection_node).collect(),
        };
        let foreground = ForegroundElement {
            children: self.foreground.iter().filter_map(foreground_item).collect(),
        };
        ShapeElement {
            h: Some(format_number(self.h)),
            w: Some(format_number(self.w)),
            aspect: self.fixed_aspect.then(|| "fixed".to_string()),
            strokewidth: Some(self.stroke_width.clone()),
            children: vec![
                Section::Connections(connections),
                Section::Foreground(foreground),
            ],
        }
    }

    /// Serialize to the XML text form
    pub fn to_xml(&self) -> Result<String> {
        facet_xml::to_string_with_options(&self.to_element(), &SerializeOptions::default())
            .map_err(|e| StencilError::Serialize {
                reason: e.to_string(),
            })
    }

    /// Parse the XML text form
    pub fn parse(text: &str) -> Result<Self> {
        let document = roxmltree::Document::parse(text).map_err(|e| {
            let pos = e.pos();
            let offset = byte_offset(text, pos.row, pos.col);
            ParseError::new(text, offset, 0, e.to_string())
        })?;
        let root = Element(document.root_element());
        trace!(tag = root.tag(), "parsed stencil text");
        Self::from_root(root)
    }

    fn from_root(root: Element<'_, '_>) -> Result<Self> {
        if root.tag() != "shape" {
            return Err(StencilError::UnexpectedRoot {
                expected: "shape",
                found: root.tag().to_string(),
            });
        }
        let mut doc = StencilDocument::new(root.number("w")?, root.number("h")?);
        doc.fixed_aspect = root.get("aspect") == Some("fixed");
        doc.stroke_width = root.get("strokewidth").unwrap_or("1").to_string();

        for section in root.children() {
            match section.tag() {
                "connections" => {
                    for child in section.children() {
                        doc.connections.push(parse_connection(child)?);
                    }
                }
                "foreground" => {
                    for child in section.children() {
                        doc.foreground.push(parse_foreground(child)?);
                    }
                }
                _ => {
                    debug!(section = section.tag(), "ignoring stencil section");
                }
            }
        }
        Ok(doc)
    }
}

fn connection_node(connection: &Connection) -> Option<ConnectionNode> {
    let owner = |owner_self: bool| owner_self.then(|| "self".to_string());
    let node = match connection {
        Connection::Constraint(record) => ConnectionNode::Constraint(ConstraintElement {
            x: Some(format_number(record.x)),
            y: Some(format_number(record.y)),
            name: Some(record.name.clone()),
            perimeter: Some("0".to_string()),
        }),
        Connection::EdgeAttack(attack) => {
            let element = EdgeAttackElement {
                name: Some(attack.name.clone()),
                owner: owner(attack.owner_self),
                points: Some(format_points(&attack.points)),
            };
            match attack.kind {
                EdgeKind::Line => ConnectionNode::LineAttack(element),
                EdgeKind::Curve => ConnectionNode::CurveAttack(element),
            }
        }
        Connection::RegionAttack(attack) => {
            let region = BoxElement::new(&attack.region);
            ConnectionNode::AreaAttack(AreaAttackElement {
                name: Some(attack.name.clone()),
                kind: Some(attack.kind.as_str().to_string()),
                owner: owner(attack.owner_self),
                shape: Some(attack.shape.to_string()),
                x: region.x,
                y: region.y,
                w: region.w,
                h: region.h,
            })
        }
        Connection::Unknown(_) => return None,
    };
    Some(node)
}

fn foreground_item(node: &ForegroundNode) -> Option<ForegroundItem> {
    let item = match node {
        ForegroundNode::Path(path) => ForegroundItem::Path(PathElement {
            commands: path.commands.iter().map(command_node).collect(),
        }),
        ForegroundNode::Rect(bounds) => ForegroundItem::Rect(BoxElement::new(bounds)),
        ForegroundNode::Ellipse(bounds) => ForegroundItem::Ellipse(BoxElement::new(bounds)),
        ForegroundNode::IncludeShape { name, bounds } => {
            let b = BoxElement::new(bounds);
            ForegroundItem::IncludeShape(IncludeShapeElement {
                name: Some(name.clone()),
                x: b.x,
                y: b.y,
                w: b.w,
                h: b.h,
            })
        }
        ForegroundNode::Image { src, bounds } => {
            let b = BoxElement::new(bounds);
            ForegroundItem::Image(ImageElement {
                src: Some(src.clone()),
                x: b.x,
                y: b.y,
                w: b.w,
                h: b.h,
            })
        }
        ForegroundNode::Dashed(dashed) => ForegroundItem::Dashed(DashedElement {
            dashed: Some(if *dashed { "1" } else { "0" }.to_string()),
        }),
        ForegroundNode::DashPattern(pattern) => ForegroundItem::DashPattern(DashPatternElement {
            pattern: Some(pattern.clone()),
        }),
        ForegroundNode::StrokeWidth(width) => ForegroundItem::StrokeWidth(StrokeWidthElement {
            width: Some(format_number(*width)),
        }),
        ForegroundNode::StrokeColor(color) => ForegroundItem::StrokeColor(ColorElement {
            color: Some(color.clone()),
        }),
        ForegroundNode::FillColor(color) => ForegroundItem::FillColor(ColorElement {
            color: Some(color.clone()),
        }),
        ForegroundNode::Stroke => ForegroundItem::Stroke(EmptyElement {}),
        ForegroundNode::FillStroke => ForegroundItem::FillStroke(EmptyElement {}),
        ForegroundNode::Unknown(_) => return None,
    };
    Some(item)
}

fn command_node(command: &DrawCommand) -> CommandNode {
    match *command {
        DrawCommand::Move(p) => CommandNode::Move(PointElement::new(p)),
        DrawCommand::Line(p) => CommandNode::Line(PointElement::new(p)),
        DrawCommand::Quad { control, end } => CommandNode::Quad(QuadElement {
            x1: Some(format_number(control.x)),
            y1: Some(format_number(control.y)),
            x2: Some(format_number(end.x)),
            y2: Some(format_number(end.y)),
        }),
        DrawCommand::Close => CommandNode::Close(EmptyElement {}),
    }
}

// ============================================================================
// Parsed nodes -> typed tree
// ============================================================================

/// Byte offset of a 1-based row and column (columns count characters)
fn byte_offset(text: &str, row: u32, col: u32) -> usize {
    let mut offset = 0;
    for (index, line) in text.split_inclusive('\n').enumerate() {
        if index + 1 == row as usize {
            let column = line
                .char_indices()
                .nth(col.saturating_sub(1) as usize)
                .map_or(line.len(), |(i, _)| i);
            return offset + column;
        }
        offset += line.len();
    }
    text.len()
}

/// An element node with typed attribute accessors
#[derive(Clone, Copy)]
struct Element<'a, 'input>(roxmltree::Node<'a, 'input>);

impl<'a, 'input> Element<'a, 'input> {
    fn tag(&self) -> &'a str {
        self.0.tag_name().name()
    }

    fn children(&self) -> impl Iterator<Item = Element<'a, 'input>> + use<'a, 'input> {
        self.0.children().filter(|n| n.is_element()).map(Element)
    }

    fn get(&self, name: &str) -> Option<&'a str> {
        self.0.attribute(name)
    }

    fn require(&self, name: &'static str) -> Result<&'a str> {
        self.get(name).ok_or_else(|| StencilError::MissingAttribute {
            tag: self.tag().to_string(),
            attr: name,
        })
    }

    /// Required finite number
    fn number(&self, name: &'static str) -> Result<f64> {
        let raw = self.require(name)?;
        let invalid = |reason| StencilError::InvalidAttribute {
            tag: self.tag().to_string(),
            attr: name,
            value: raw.to_string(),
            reason,
        };
        let value: f64 = raw.trim().parse().map_err(|_| invalid(None))?;
        types::finite(value).map_err(|e| invalid(Some(e)))
    }

    fn point(&self, x: &'static str, y: &'static str) -> Result<Point> {
        Ok(pt(self.number(x)?, self.number(y)?))
    }

    /// `x`, `y`, `w`, `h` with a non-negative size
    fn bounds(&self) -> Result<Bounds> {
        let w = self.number("w")?;
        let h = self.number("h")?;
        let invalid = |attr: &'static str, value: f64, reason| StencilError::InvalidAttribute {
            tag: self.tag().to_string(),
            attr,
            value: format_number(value),
            reason: Some(reason),
        };
        types::non_negative(w).map_err(|e| invalid("w", w, e))?;
        types::non_negative(h).map_err(|e| invalid("h", h, e))?;
        Ok(Bounds::new(self.number("x")?, self.number("y")?, w, h))
    }

    /// `points="x,y x,y ..."`
    fn points(&self) -> Result<Vec<Point>> {
        let raw = self.require("points")?;
        let invalid = || StencilError::InvalidAttribute {
            tag: self.tag().to_string(),
            attr: "points",
            value: raw.to_string(),
            reason: None,
        };
        raw.split_whitespace()
            .map(|pair| {
                let (x, y) = pair.split_once(',').ok_or_else(invalid)?;
                let x: f64 = x.parse().map_err(|_| invalid())?;
                let y: f64 = y.parse().map_err(|_| invalid())?;
                if x.is_finite() && y.is_finite() {
                    Ok(pt(x, y))
                } else {
                    Err(invalid())
                }
            })
            .collect()
    }
}

fn parse_connection(element: Element<'_, '_>) -> Result<Connection> {
    let owner_self = element.get("owner") == Some("self");
    let name = element.get("name").unwrap_or_default().to_string();
    let connection = match element.tag() {
        "constraint" => Connection::Constraint(ConstraintRecord {
            x: element.number("x")?,
            y: element.number("y")?,
            name,
        }),
        tag @ ("lineattack" | "curveattack") => Connection::EdgeAttack(EdgeAttack {
            name,
            kind: if tag == "lineattack" {
                EdgeKind::Line
            } else {
                EdgeKind::Curve
            },
            owner_self,
            points: element.points()?,
        }),
        "areaattack" => {
            let kind = match element.get("kind") {
                None | Some("area") => RegionKind::Area,
                Some("outline") => RegionKind::Outline,
                Some(other) => {
                    return Err(StencilError::InvalidAttribute {
                        tag: element.tag().to_string(),
                        attr: "kind",
                        value: other.to_string(),
                        reason: None,
                    });
                }
            };
            Connection::RegionAttack(RegionAttack {
                name,
                kind,
                owner_self,
                shape: ShapeRef::from_style_name(element.require("shape")?),
                region: element.bounds()?,
            })
        }
        other => {
            debug!(tag = other, "keeping unknown connection");
            Connection::Unknown(other.to_string())
        }
    };
    Ok(connection)
}

fn parse_foreground(element: Element<'_, '_>) -> Result<ForegroundNode> {
    let node = match element.tag() {
        "path" => ForegroundNode::Path(parse_path(element)?),
        // corner radius is not modelled
        "rect" | "roundrect" => ForegroundNode::Rect(element.bounds()?),
        "ellipse" => ForegroundNode::Ellipse(element.bounds()?),
        "include-shape" => ForegroundNode::IncludeShape {
            name: element.require("name")?.to_string(),
            bounds: element.bounds()?,
        },
        "image" => ForegroundNode::Image {
            src: element.require("src")?.to_string(),
            bounds: element.bounds()?,
        },
        "dashed" => ForegroundNode::Dashed(element.get("dashed").is_some_and(|v| v != "0")),
        "dashpattern" => ForegroundNode::DashPattern(element.require("pattern")?.to_string()),
        "strokewidth" => ForegroundNode::StrokeWidth(element.number("width")?),
        "strokecolor" => ForegroundNode::StrokeColor(element.require("color")?.to_string()),
        "fillcolor" => ForegroundNode::FillColor(element.require("color")?.to_string()),
        "stroke" => ForegroundNode::Stroke,
        "fillstroke" => ForegroundNode::FillStroke,
        other => ForegroundNode::Unknown(other.to_string()),
    };
    Ok(node)
}

fn parse_path(element: Element<'_, '_>) -> Result<Path> {
    let mut commands = Vec::new();
    for child in element.children() {
        let command = match child.tag() {
            "move" => DrawCommand::Move(child.point("x", "y")?),
            "line" => DrawCommand::Line(child.point("x", "y")?),
            "quad" => DrawCommand::Quad {
                control: child.point("x1", "y1")?,
                end: child.point("x2", "y2")?,
            },
            "close" => DrawCommand::Close,
            _ => {
                debug!(tag = child.tag(), "skipping unsupported path command");
                continue;
            }
        };
        commands.push(command);
    }
    Ok(Path::new(commands))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn sample() -> StencilDocument {
        let mut doc = StencilDocument::new(10.0, 10.0);
        doc.connections.push(Connection::Constraint(ConstraintRecord {
            x: 0.5,
            y: 0.0,
            name: "line-0".into(),
        }));
        doc.connections.push(Connection::EdgeAttack(EdgeAttack {
            name: "line-0".into(),
            kind: EdgeKind::Line,
            owner_self: true,
            points: vec![pt(0.0, 0.0), pt(10.0, 0.0)],
        }));
        doc.connections.push(Connection::RegionAttack(RegionAttack {
            name: "area-1/dock".into(),
            kind: RegionKind::Area,
            owner_self: false,
            shape: ShapeRef::Ellipse,
            region: Bounds::new(1.0, 1.0, 4.0, 4.0),
        }));
        doc.foreground = vec![
            ForegroundNode::FillStroke,
            ForegroundNode::Path(Path::new(vec![
                DrawCommand::Move(pt(0.0, 0.0)),
                DrawCommand::Quad {
                    control: pt(5.0, 10.0),
                    end: pt(10.0, 0.0),
                },
                DrawCommand::Close,
            ])),
            ForegroundNode::Dashed(true),
            ForegroundNode::DashPattern("3 3".into()),
            ForegroundNode::StrokeColor("#ff0000".into()),
            ForegroundNode::FillColor("#00ff00".into()),
            ForegroundNode::FillStroke,
            ForegroundNode::Image {
                src: "data:image/png,a&b".into(),
                bounds: Bounds::new(0.0, 0.0, 2.0, 2.0),
            },
            ForegroundNode::Stroke,
        ];
        doc
    }

    #[test]
    fn text_form_round_trips() {
        let doc = sample();
        let text = doc.to_xml().unwrap();
        assert_eq!(StencilDocument::parse(&text).unwrap(), doc);
    }

    #[test]
    fn writer_emits_the_stencil_layout() {
        let mut doc = StencilDocument::new(4.0, 2.5);
        doc.foreground.push(ForegroundNode::Rect(Bounds::new(0.0, -0.0, 4.0, 2.5)));
        let text = doc.to_xml().unwrap();

        let parsed = roxmltree::Document::parse(&text).unwrap();
        let root = parsed.root_element();
        assert_eq!(root.tag_name().name(), "shape");
        assert_eq!(root.attribute("w"), Some("4"));
        assert_eq!(root.attribute("h"), Some("2.5"));
        assert_eq!(root.attribute("aspect"), Some("fixed"));
        assert_eq!(root.attribute("strokewidth"), Some("inherit"));

        let sections: Vec<_> = root
            .children()
            .filter(|n| n.is_element())
            .map(|n| n.tag_name().name())
            .collect();
        assert_eq!(sections, ["connections", "foreground"]);

        let rect = root.descendants().find(|n| n.has_tag_name("rect")).unwrap();
        let attrs: Vec<_> = rect.attributes().map(|a| (a.name(), a.value())).collect();
        assert_eq!(attrs, [("x", "0"), ("y", "0"), ("w", "4"), ("h", "2.5")]);
    }

    #[test]
    fn special_characters_survive_the_text_form() {
        let mut doc = StencilDocument::new(1.0, 1.0);
        doc.foreground.push(ForegroundNode::Image {
            src: r#"a<b & "c" 'd'>"#.into(),
            bounds: Bounds::new(0.0, 0.0, 1.0, 1.0),
        });
        let text = doc.to_xml().unwrap();
        assert_eq!(StencilDocument::parse(&text).unwrap(), doc);

        let doc = StencilDocument::parse(
            r#"<shape w="1" h="1"><foreground><strokecolor color="&#35;&#x41;B"/></foreground></shape>"#,
        )
        .unwrap();
        assert_eq!(doc.foreground, vec![ForegroundNode::StrokeColor("#AB".into())]);
    }

    #[test]
    fn syntax_errors_point_into_the_text() {
        let text = "<shape w=\"1\" h=\"1\">\n  <foreground>\n</shape>";
        let err = StencilDocument::parse(text).unwrap_err();
        let StencilError::Parse(parse) = &err else {
            panic!("expected a syntax error, got {err:?}");
        };
        assert!(parse.span.offset() > 0 && parse.span.offset() <= text.len());
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn byte_offsets_follow_rows_and_columns() {
        let text = "ab\ncdé\nf";
        assert_eq!(byte_offset(text, 1, 1), 0);
        assert_eq!(byte_offset(text, 2, 3), 5);
        assert_eq!(byte_offset(text, 3, 1), 8);
        assert_eq!(byte_offset(text, 9, 1), text.len());
    }

    #[test]
    fn wrong_root_is_malformed() {
        let err = StencilDocument::parse(r#"<stencil w="1" h="1"/>"#).unwrap_err();
        assert!(matches!(err, StencilError::UnexpectedRoot { .. }));
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn bad_numbers_are_reported() {
        let err = StencilDocument::parse(r#"<shape w="ten" h="1"/>"#).unwrap_err();
        assert!(matches!(
            err,
            StencilError::InvalidAttribute { attr: "w", .. }
        ));
        let err = StencilDocument::parse(r#"<shape w="NaN" h="1"/>"#).unwrap_err();
        assert!(matches!(err, StencilError::InvalidAttribute { attr: "w", reason: Some(_), .. }));
        let err = StencilDocument::parse(
            r#"<shape w="1" h="1"><foreground><rect x="0" y="0" w="-1" h="1"/></foreground></shape>"#,
        )
        .unwrap_err();
        assert!(matches!(err, StencilError::InvalidAttribute { attr: "w", reason: Some(_), .. }));
    }

    #[test]
    fn unknown_nodes_are_tolerated() {
        let doc = StencilDocument::parse(
            r#"<shape w="2" h="2"><connections><anchor/></connections>
               <foreground><shadow/><path><move x="0" y="0"/><arc rx="1"/><line x="2" y="2"/></path></foreground></shape>"#,
        )
        .unwrap();
        assert_eq!(doc.connections, vec![Connection::Unknown("anchor".into())]);
        assert_eq!(doc.foreground[0], ForegroundNode::Unknown("shadow".into()));
        let ForegroundNode::Path(path) = &doc.foreground[1] else {
            panic!("expected path");
        };
        assert_eq!(path.len(), 2);
        assert_eq!(doc.stroke_width, "1");
        assert!(!doc.fixed_aspect);
    }
}
