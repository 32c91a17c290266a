//! Default tunables for compiling and decompiling stencils (diagram units)

use std::f64::consts::PI;

/// Fraction of the way toward a vertex where a rounded corner starts
pub const ROUNDING_BLEND: f64 = 0.89;
/// Position of the implicit on-curve point between two quad controls.
/// Shared by the encoder and the decoder of the midpoint construction.
pub const MIDPOINT_BLEND: f64 = 0.5;

pub const LINE_SAMPLE_STEP: f64 = 2.0;
pub const CURVE_SAMPLE_STEP: f64 = 0.02;
pub const RECT_OUTLINE_STEP: f64 = 2.0;
pub const ELLIPSE_ANGLE_STEP: f64 = 0.05;
/// Two full turns; the second is redundant oversampling kept for parity
pub const ELLIPSE_SWEEP: f64 = 4.0 * PI;
pub const GRID_STEP: f64 = 5.0;

/// Endpoints closer than this are the same point when stitching
pub const STITCH_TOLERANCE: f64 = 1e-6;
/// Half of the 1-unit canvas line width used by the hit-test
pub const STROKE_TOLERANCE: f64 = 0.5;
/// Straight pieces per quadratic segment when flattening for hit-tests
pub const FLATTEN_SEGMENTS: usize = 16;

/// Side of the invisible box created for a decompiled point constraint
pub const POINT_MARKER_SIZE: f64 = 4.0;
/// Distance within which `owner="self"` metadata matches a decompiled primitive
pub const OWNER_MATCH_TOLERANCE: f64 = 1e-6;

pub const STROKE_COLOR: &str = "#000000";
pub const RECTANGLE_SHAPE: &str = "mxgraph.general.rectangle";
pub const ELLIPSE_SHAPE: &str = "mxgraph.general.circle";
