//! Runtime tunables for compiling and decompiling

use crate::compile::defaults;

/// Step sizes used when sampling attachment geometry (diagram units)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    /// Distance between samples along the major axis of a line segment
    pub line_step: f64,
    /// Bezier parameter step per quadratic segment
    pub curve_step: f64,
    /// Distance between samples along a rectangle outline
    pub rect_outline_step: f64,
    /// Angle step (radians) around an ellipse outline
    pub ellipse_angle_step: f64,
    /// Total angle swept around an ellipse outline
    pub ellipse_sweep: f64,
    /// Grid spacing for hit-tested outline and area scans
    pub grid_step: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            line_step: defaults::LINE_SAMPLE_STEP,
            curve_step: defaults::CURVE_SAMPLE_STEP,
            rect_outline_step: defaults::RECT_OUTLINE_STEP,
            ellipse_angle_step: defaults::ELLIPSE_ANGLE_STEP,
            ellipse_sweep: defaults::ELLIPSE_SWEEP,
            grid_step: defaults::GRID_STEP,
        }
    }
}

impl SamplingConfig {
    pub fn with_line_step(mut self, step: f64) -> Self {
        self.line_step = step;
        self
    }

    pub fn with_curve_step(mut self, step: f64) -> Self {
        self.curve_step = step;
        self
    }

    pub fn with_rect_outline_step(mut self, step: f64) -> Self {
        self.rect_outline_step = step;
        self
    }

    pub fn with_ellipse_angle_step(mut self, step: f64) -> Self {
        self.ellipse_angle_step = step;
        self
    }

    pub fn with_grid_step(mut self, step: f64) -> Self {
        self.grid_step = step;
        self
    }
}

/// Options for `Compiler`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompileOptions {
    pub sampling: SamplingConfig,
    /// Corner blend for rounded polylines
    pub rounding_blend: f64,
    /// Endpoint distance treated as a join when stitching
    pub stitch_tolerance: f64,
    /// Pieces per quad when resolving region stencils for hit-tests
    pub flatten_segments: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            rounding_blend: defaults::ROUNDING_BLEND,
            stitch_tolerance: defaults::STITCH_TOLERANCE,
            flatten_segments: defaults::FLATTEN_SEGMENTS,
        }
    }
}

impl CompileOptions {
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_rounding_blend(mut self, blend: f64) -> Self {
        self.rounding_blend = blend;
        self
    }

    pub fn with_stitch_tolerance(mut self, tolerance: f64) -> Self {
        self.stitch_tolerance = tolerance;
        self
    }

    pub fn with_flatten_segments(mut self, segments: usize) -> Self {
        self.flatten_segments = segments;
        self
    }
}

/// Options for `Decompiler`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecompileOptions {
    /// Side of the invisible box created for each point constraint
    pub point_marker_size: f64,
    /// Distance within which `owner="self"` metadata matches a primitive
    pub match_tolerance: f64,
}

impl Default for DecompileOptions {
    fn default() -> Self {
        Self {
            point_marker_size: defaults::POINT_MARKER_SIZE,
            match_tolerance: defaults::OWNER_MATCH_TOLERANCE,
        }
    }
}

impl DecompileOptions {
    pub fn with_point_marker_size(mut self, size: f64) -> Self {
        self.point_marker_size = size;
        self
    }

    pub fn with_match_tolerance(mut self, tolerance: f64) -> Self {
        self.match_tolerance = tolerance;
        self
    }
}
