//! Compile diagram primitives into stencil shape definitions, and back.
//!
//! A selection of lines, curves, images and shape instances is compiled into
//! a [`StencilDocument`]: a normalized drawing plus sampled connection
//! metadata. The document serializes to XML, and a [`Codec`] packs that XML
//! into a style token. [`Decompiler`] reverses the process, producing
//! primitives and constraint markers placed inside a target rectangle.
//!
//! [`ShapeCreator`] runs both directions against a [`Host`] element
//! collection, wrapping every mutation in one update bracket.
//!
//! ```
//! use stencilforge::{
//!     Base64Codec, BackgroundPolicy, Compiler, EdgeGeometry, GeometricHitTester, LineShape,
//!     MemoryRegistry, MergeMode, PrimitiveShape, Resolver, pt,
//! };
//!
//! let registry = MemoryRegistry::new();
//! let hit_test = GeometricHitTester::new();
//! let resolver = Resolver::new(&Base64Codec, &registry);
//! let line: PrimitiveShape =
//!     LineShape::new(EdgeGeometry::segment(pt(0.0, 0.0), pt(10.0, 10.0))).into();
//!
//! let compiled = Compiler::new(resolver, &hit_test)
//!     .compile(&[line], BackgroundPolicy::Filled, MergeMode::Shapes)
//!     .unwrap();
//! let xml = compiled.document.to_xml().unwrap();
//! assert!(xml.contains("<shape"));
//! ```

pub mod compile;
pub mod config;
pub mod decompile;
pub mod diagram;
pub mod errors;
pub mod log;
pub mod shapes;
pub mod stencil;
pub mod types;

pub use compile::hit_test::{GeometricHitTester, Hit, HitTest, ShapeGeometry};
pub use compile::{BackgroundPolicy, Compiled, Compiler, MergeMode};
pub use config::{CompileOptions, DecompileOptions, SamplingConfig};
pub use decompile::{Decompiled, Decompiler};
pub use diagram::{Cell, CellId, Diagram, Host, Merged, ShapeCreator};
pub use errors::{ErrorKind, ParseError, Result, StencilError};
pub use shapes::{
    ConstraintMarker, CurveShape, EdgeGeometry, EdgeKind, ImageShape, LineShape, MarkerKind,
    PathGroupShape, PrimitiveShape, Shape, ShapeRef, Style, SubStencilShape, TextShape,
};
pub use stencil::{
    Base64Codec, Codec, ConstraintTag, MemoryRegistry, Resolver, StencilDocument,
    StencilRegistry,
};
pub use types::{Bounds, Point, pt};
