//! Error types with rich diagnostics using miette
//!
//! Every failure the compiler or decompiler can report is a `StencilError`.
//! `ErrorKind` groups them into the three classes callers act on.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::types::NumericError;

/// Broad classification of a `StencilError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller bug: the operation was invoked with inputs it never accepts
    PreconditionViolation,
    /// The data handed in (edges, stencil text) cannot be processed
    MalformedInput,
    /// A referenced stencil, token or element could not be resolved
    ResolutionFailure,
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Syntax error in the textual form of a stencil
#[derive(Error, Diagnostic, Debug)]
#[error("invalid stencil text: {message}")]
#[diagnostic(code(stencilforge::parse::syntax))]
pub struct ParseError {
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: SourceSpan,
}

impl ParseError {
    pub fn new(source: &str, offset: usize, len: usize, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            src: NamedSource::new("<stencil>", source.to_string()),
            span: (offset, len).into(),
        }
    }
}

// ============================================================================
// Stencil Errors
// ============================================================================

/// Errors raised while compiling, decompiling or resolving stencils
#[derive(Error, Diagnostic, Debug)]
pub enum StencilError {
    #[error("selection is empty")]
    #[diagnostic(
        code(stencilforge::precondition::empty_selection),
        help("select at least one non-text primitive before merging")
    )]
    EmptySelection,

    #[error("selection bounds are degenerate: {w}x{h}")]
    #[diagnostic(
        code(stencilforge::precondition::degenerate_bounds),
        help("a stencil needs a non-zero width and height to normalize against")
    )]
    DegenerateBounds { w: f64, h: f64 },

    #[error("primitive {index} is not an edge and cannot join a single path")]
    #[diagnostic(code(stencilforge::precondition::not_an_edge))]
    NotAnEdge { index: usize },

    #[error("{remaining} edge(s) do not connect to the path ending at ({x}, {y})")]
    #[diagnostic(
        code(stencilforge::malformed::disconnected_edges),
        help("every edge must share an endpoint with the path built so far")
    )]
    DisconnectedEdges {
        stitched: usize,
        remaining: usize,
        x: f64,
        y: f64,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error("<{tag}> is missing attribute `{attr}`")]
    #[diagnostic(code(stencilforge::malformed::missing_attribute))]
    MissingAttribute { tag: String, attr: &'static str },

    #[error("<{tag}> has invalid `{attr}` value {value:?}")]
    #[diagnostic(code(stencilforge::malformed::invalid_attribute))]
    InvalidAttribute {
        tag: String,
        attr: &'static str,
        value: String,
        #[source]
        reason: Option<NumericError>,
    },

    #[error("stencil cannot be written as XML: {reason}")]
    #[diagnostic(code(stencilforge::malformed::serialize))]
    Serialize { reason: String },

    #[error("expected <{expected}> root, found <{found}>")]
    #[diagnostic(code(stencilforge::malformed::unexpected_root))]
    UnexpectedRoot { expected: &'static str, found: String },

    #[error("no stencil registered under {name:?}")]
    #[diagnostic(code(stencilforge::resolution::unknown_stencil))]
    UnknownStencil { name: String },

    #[error("stencil token cannot be decompressed: {reason}")]
    #[diagnostic(code(stencilforge::resolution::decompress))]
    Decompress { reason: String },

    #[error("no element with id {id}")]
    #[diagnostic(code(stencilforge::resolution::unknown_cell))]
    UnknownCell { id: usize },

    #[error("element {id} cannot be merged into a stencil")]
    #[diagnostic(
        code(stencilforge::precondition::unsupported_cell),
        help("only primitives and stencil elements can be merged")
    )]
    UnsupportedCell { id: usize },

    #[error("element {id} does not carry a stencil")]
    #[diagnostic(code(stencilforge::resolution::not_a_stencil))]
    NotAStencil { id: usize },
}

impl StencilError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StencilError::EmptySelection
            | StencilError::DegenerateBounds { .. }
            | StencilError::NotAnEdge { .. }
            | StencilError::UnsupportedCell { .. } => ErrorKind::PreconditionViolation,
            StencilError::DisconnectedEdges { .. }
            | StencilError::Parse(_)
            | StencilError::MissingAttribute { .. }
            | StencilError::InvalidAttribute { .. }
            | StencilError::Serialize { .. }
            | StencilError::UnexpectedRoot { .. } => ErrorKind::MalformedInput,
            StencilError::UnknownStencil { .. }
            | StencilError::Decompress { .. }
            | StencilError::UnknownCell { .. }
            | StencilError::NotAStencil { .. } => ErrorKind::ResolutionFailure,
        }
    }
}

pub type Result<T, E = StencilError> = std::result::Result<T, E>;
