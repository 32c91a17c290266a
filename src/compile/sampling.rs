//! Constraint sampling: attachment geometry to normalized records
//!
//! Every sampler works in diagram space and normalizes against the group
//! bounds at the end, so a record's `x` and `y` are fractions of the stencil
//! width and height.
//!
//! # Key Concepts
//!
//! - **Line**: per segment, step along the major axis from the smaller
//!   coordinate (inclusive) to the larger (exclusive), solving `y = m·x + c`
//!   for the other axis. Vertical segments hold `x`.
//! - **Curve**: the midpoint construction of the path builder, each
//!   quadratic sampled at `t = 0, step, ...` below 1.
//! - **Outline**: analytic for rectangles and ellipses, otherwise a grid
//!   scan keeping points on the stroke.
//! - **Area**: a grid scan keeping points on the fill or the stroke.

use crate::config::SamplingConfig;
use crate::errors::Result;
use crate::log::trace;
use crate::shapes::{EdgeKind, ShapeRef};
use crate::stencil::{ConstraintRecord, Resolver};
use crate::types::{Bounds, Point, pt};

use super::defaults;
use super::geometry::{ellipse_point, quad_point, quad_segments, steps, steps_inclusive};
use super::hit_test::{HitTest, ShapeGeometry};

/// Which hits a grid scan keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Points on the stroke
    Outline,
    /// Points on the fill or the stroke
    Area,
}

/// Points along a polyline
pub fn line_samples(points: &[Point], step: f64) -> Vec<Point> {
    let mut samples = Vec::new();
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        if dx.abs() < dy.abs() {
            let (y1, y2) = (a.y.min(b.y), a.y.max(b.y));
            for y in steps(y1, y2, step) {
                let x = if dx == 0.0 {
                    a.x
                } else {
                    let m = dy / dx;
                    let c = a.y - m * a.x;
                    (y - c) / m
                };
                samples.push(pt(x, y));
            }
        } else {
            // dx == 0 here only for a zero-length segment, which yields no steps
            let (x1, x2) = (a.x.min(b.x), a.x.max(b.x));
            for x in steps(x1, x2, step) {
                let m = dy / dx;
                let c = a.y - m * a.x;
                samples.push(pt(x, m * x + c));
            }
        }
    }
    samples
}

/// Points along the quadratic run of a curve; two points sample as a line
pub fn curve_samples(points: &[Point], config: &SamplingConfig) -> Vec<Point> {
    if points.len() < 3 {
        return line_samples(points, config.line_step);
    }
    let mut samples = Vec::new();
    for (p0, p1, p2) in quad_segments(points) {
        samples.extend(steps(0.0, 1.0, config.curve_step).map(|t| quad_point(t, p0, p1, p2)));
    }
    samples
}

/// Points along the four edges of a box
pub fn rectangle_outline(region: &Bounds, step: f64) -> Vec<Point> {
    let max = region.max();
    let mut samples = Vec::new();
    for x in steps(region.x, max.x, step) {
        samples.push(pt(x, region.y));
        samples.push(pt(x, max.y));
    }
    for y in steps(region.y, max.y, step) {
        samples.push(pt(region.x, y));
        samples.push(pt(max.x, y));
    }
    samples
}

/// Points around the ellipse inscribed in a box
pub fn ellipse_outline(region: &Bounds, config: &SamplingConfig) -> Vec<Point> {
    steps(0.0, config.ellipse_sweep, config.ellipse_angle_step)
        .map(|theta| ellipse_point(region, theta))
        .collect()
}

/// Samples attachment geometry relative to one group's bounds
pub struct Sampler<'a> {
    bounds: Bounds,
    config: SamplingConfig,
    flatten_segments: usize,
    hit_test: &'a dyn HitTest,
    resolver: Resolver<'a>,
}

impl<'a> Sampler<'a> {
    pub fn new(
        bounds: Bounds,
        config: SamplingConfig,
        hit_test: &'a dyn HitTest,
        resolver: Resolver<'a>,
    ) -> Self {
        Self {
            bounds,
            config,
            flatten_segments: defaults::FLATTEN_SEGMENTS,
            hit_test,
            resolver,
        }
    }

    pub fn with_flatten_segments(mut self, segments: usize) -> Self {
        self.flatten_segments = segments;
        self
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Normalized record for a diagram-space point
    pub fn record(&self, p: Point, name: &str) -> ConstraintRecord {
        let fraction = self.bounds.normalize(self.bounds.to_local(p));
        ConstraintRecord {
            x: fraction.x,
            y: fraction.y,
            name: name.to_string(),
        }
    }

    fn records(&self, points: impl IntoIterator<Item = Point>, name: &str) -> Vec<ConstraintRecord> {
        points.into_iter().map(|p| self.record(p, name)).collect()
    }

    /// One record at the center of a marker box
    pub fn point(&self, marker: &Bounds, name: &str) -> ConstraintRecord {
        self.record(marker.center(), name)
    }

    pub fn edge(&self, kind: EdgeKind, points: &[Point], name: &str) -> Vec<ConstraintRecord> {
        let samples = match kind {
            EdgeKind::Line => line_samples(points, self.config.line_step),
            EdgeKind::Curve => curve_samples(points, &self.config),
        };
        trace!(?kind, samples = samples.len(), name, "sampled edge");
        self.records(samples, name)
    }

    pub fn outline(&self, shape: &ShapeRef, region: &Bounds, name: &str) -> Result<Vec<ConstraintRecord>> {
        let samples = match shape {
            ShapeRef::Rectangle => rectangle_outline(region, self.config.rect_outline_step),
            ShapeRef::Ellipse => ellipse_outline(region, &self.config),
            _ => self.scan(shape, region, ScanMode::Outline)?,
        };
        trace!(samples = samples.len(), name, "sampled outline");
        Ok(self.records(samples, name))
    }

    pub fn area(&self, shape: &ShapeRef, region: &Bounds, name: &str) -> Result<Vec<ConstraintRecord>> {
        let samples = self.scan(shape, region, ScanMode::Area)?;
        trace!(samples = samples.len(), name, "sampled area");
        Ok(self.records(samples, name))
    }

    /// Resolve a region shape to geometry sized to `region`
    pub fn region_geometry(&self, shape: &ShapeRef, region: &Bounds) -> Result<ShapeGeometry> {
        Ok(match shape {
            ShapeRef::Rectangle => ShapeGeometry::rectangle(region.w, region.h),
            ShapeRef::Ellipse => ShapeGeometry::ellipse(region.w, region.h),
            _ => {
                let doc = self.resolver.resolve(shape)?;
                ShapeGeometry::from_document(&doc, region.size(), self.flatten_segments)
            }
        })
    }

    /// Grid scan over `region` (bounds inclusive), returning diagram points
    pub fn scan(&self, shape: &ShapeRef, region: &Bounds, mode: ScanMode) -> Result<Vec<Point>> {
        let geometry = self.region_geometry(shape, region)?;
        let step = self.config.grid_step;
        let mut samples = Vec::new();
        for x in steps_inclusive(0.0, region.w, step) {
            for y in steps_inclusive(0.0, region.h, step) {
                let hit = self.hit_test.hit_test(&geometry, pt(x, y));
                let keep = match mode {
                    ScanMode::Outline => hit.on_stroke,
                    ScanMode::Area => hit.on_fill || hit.on_stroke,
                };
                if keep {
                    samples.push(region.origin() + pt(x, y));
                }
            }
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::hit_test::GeometricHitTester;
    use crate::errors::{ErrorKind, StencilError};
    use crate::stencil::{Base64Codec, MemoryRegistry};

    #[test]
    fn line_samples_follow_major_axis() {
        let samples = line_samples(&[pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)], 2.0);
        assert_eq!(samples.len(), 10);
        assert_eq!(samples[..5], [pt(0.0, 0.0), pt(2.0, 0.0), pt(4.0, 0.0), pt(6.0, 0.0), pt(8.0, 0.0)]);
        assert!(samples[5..].iter().all(|p| p.x == 10.0));
        assert_eq!(samples[9], pt(10.0, 8.0));
    }

    #[test]
    fn steep_segment_solves_for_x() {
        let samples = line_samples(&[pt(0.0, 0.0), pt(2.0, 8.0)], 2.0);
        assert_eq!(samples, vec![pt(0.0, 0.0), pt(0.5, 2.0), pt(1.0, 4.0), pt(1.5, 6.0)]);
    }

    #[test]
    fn reversed_segment_starts_at_minimum() {
        let samples = line_samples(&[pt(6.0, 3.0), pt(0.0, 0.0)], 2.0);
        assert_eq!(samples, vec![pt(0.0, 0.0), pt(2.0, 1.0), pt(4.0, 2.0)]);
    }

    #[test]
    fn curve_samples_per_segment() {
        let config = SamplingConfig::default();
        let samples = curve_samples(&[pt(0.0, 0.0), pt(5.0, 10.0), pt(10.0, 0.0)], &config);
        assert_eq!(samples.len(), 50);
        assert_eq!(samples[0], pt(0.0, 0.0));
        let two_point = curve_samples(&[pt(0.0, 0.0), pt(4.0, 0.0)], &config);
        assert_eq!(two_point, line_samples(&[pt(0.0, 0.0), pt(4.0, 0.0)], config.line_step));
    }

    #[test]
    fn rectangle_outline_covers_edges() {
        let samples = rectangle_outline(&Bounds::new(0.0, 0.0, 4.0, 2.0), 2.0);
        assert_eq!(
            samples,
            vec![
                pt(0.0, 0.0),
                pt(0.0, 2.0),
                pt(2.0, 0.0),
                pt(2.0, 2.0),
                pt(0.0, 0.0),
                pt(4.0, 0.0)
            ]
        );
    }

    #[test]
    fn ellipse_outline_sweeps_twice() {
        let config = SamplingConfig::default();
        let samples = ellipse_outline(&Bounds::new(0.0, 0.0, 10.0, 10.0), &config);
        assert_eq!(samples.len(), 252);
        assert_eq!(samples[0], pt(10.0, 5.0));
    }

    fn sampler<'a>(hit: &'a GeometricHitTester, registry: &'a MemoryRegistry, bounds: Bounds) -> Sampler<'a> {
        Sampler::new(bounds, SamplingConfig::default(), hit, Resolver::new(&Base64Codec, registry))
    }

    #[test]
    fn area_scan_keeps_at_least_the_outline() {
        let hit = GeometricHitTester::new();
        let registry = MemoryRegistry::new();
        let region = Bounds::new(10.0, 10.0, 20.0, 20.0);
        let sampler = sampler(&hit, &registry, Bounds::new(0.0, 0.0, 40.0, 40.0));
        let outline = sampler.scan(&ShapeRef::Rectangle, &region, ScanMode::Outline).unwrap();
        let area = sampler.scan(&ShapeRef::Rectangle, &region, ScanMode::Area).unwrap();
        assert_eq!(outline.len(), 16);
        assert_eq!(area.len(), 25);
        assert!(outline.iter().all(|p| area.contains(p)));
        assert_eq!(area[0], pt(10.0, 10.0));
    }

    #[test]
    fn records_are_normalized() {
        let hit = GeometricHitTester::new();
        let registry = MemoryRegistry::new();
        let bounds = Bounds::new(10.0, 20.0, 40.0, 20.0);
        let sampler = sampler(&hit, &registry, bounds);
        let record = sampler.point(&Bounds::new(28.0, 28.0, 4.0, 4.0), "point-0");
        assert_eq!((record.x, record.y), (0.5, 0.5));
        let records = sampler
            .area(&ShapeRef::Ellipse, &Bounds::new(10.0, 20.0, 40.0, 20.0), "area-1")
            .unwrap();
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| (0.0..=1.0).contains(&r.x) && (0.0..=1.0).contains(&r.y)));
    }

    #[test]
    fn unresolvable_region_is_fatal() {
        let hit = GeometricHitTester::new();
        let registry = MemoryRegistry::new();
        let sampler = sampler(&hit, &registry, Bounds::new(0.0, 0.0, 10.0, 10.0));
        let err = sampler
            .outline(&ShapeRef::Named("missing".into()), &Bounds::new(0.0, 0.0, 10.0, 10.0), "outline-0")
            .unwrap_err();
        assert!(matches!(err, StencilError::UnknownStencil { .. }));
        assert_eq!(err.kind(), ErrorKind::ResolutionFailure);
    }

    #[test]
    fn named_region_scans_its_paths() {
        let hit = GeometricHitTester::new();
        let mut registry = MemoryRegistry::new();
        registry
            .register_xml(
                "triangle",
                r#"<shape w="2" h="2"><foreground><path>
                     <move x="0" y="2"/><line x="1" y="0"/><line x="2" y="2"/><close/>
                   </path></foreground></shape>"#,
            )
            .unwrap();
        let sampler = sampler(&hit, &registry, Bounds::new(0.0, 0.0, 20.0, 20.0));
        let shape = ShapeRef::Named("triangle".into());
        let region = Bounds::new(0.0, 0.0, 20.0, 20.0);
        let area = sampler.scan(&shape, &region, ScanMode::Area).unwrap();
        let outline = sampler.scan(&shape, &region, ScanMode::Outline).unwrap();
        assert!(area.len() > outline.len());
        assert!(area.contains(&pt(10.0, 10.0)));
        assert!(!area.contains(&pt(0.0, 0.0)));
        assert!(outline.contains(&pt(0.0, 20.0)));
    }
}
