//! Closed racecourse spline
//!
//! Centripetal Catmull-Rom through every control point, wrapping at the
//! start/finish line. Queries take a normalised arc-length parameter so equal
//! steps in `t` cover equal distance along the course.

use glam::Vec3;
use thiserror::Error;

use crate::consts::TRACK_COARSE_SAMPLES;
use crate::wrap_unit;

/// Arc-length table resolution per control point
const ARC_DIVISIONS_PER_POINT: usize = 100;

/// Default lateral half-width of the course
pub const DEFAULT_TRACK_WIDTH: f32 = 45.0;

/// Control points of the open-ocean circuit
pub const DEFAULT_CIRCUIT: [Vec3; 9] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(300.0, 0.0, 400.0),
    Vec3::new(800.0, 0.0, 500.0),
    Vec3::new(1200.0, 0.0, 0.0),
    Vec3::new(800.0, 0.0, -800.0),
    Vec3::new(0.0, 0.0, -1000.0),
    Vec3::new(-800.0, 0.0, -800.0),
    Vec3::new(-1200.0, 0.0, -200.0),
    Vec3::new(-600.0, 0.0, 300.0),
];

#[derive(Debug, Error, PartialEq)]
pub enum TrackError {
    #[error("a closed track needs at least 3 control points, got {count}")]
    TooFewPoints { count: usize },
    #[error("control point {index} is not finite")]
    NonFinitePoint { index: usize },
    #[error("track width {width} must be finite and > 0")]
    InvalidWidth { width: f32 },
    #[error("track has zero length")]
    DegenerateLength,
}

/// Cubic coefficients of one spline segment: c0 + c1 w + c2 w² + c3 w³
#[derive(Debug, Clone, Copy)]
struct Segment {
    c0: Vec3,
    c1: Vec3,
    c2: Vec3,
    c3: Vec3,
}

impl Segment {
    fn centripetal(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        let mut dt0 = p0.distance_squared(p1).powf(0.25);
        let mut dt1 = p1.distance_squared(p2).powf(0.25);
        let mut dt2 = p2.distance_squared(p3).powf(0.25);

        // Coincident points
        if dt1 < 1e-4 {
            dt1 = 1.0;
        }
        if dt0 < 1e-4 {
            dt0 = dt1;
        }
        if dt2 < 1e-4 {
            dt2 = dt1;
        }

        let t1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
        let t2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

        Self {
            c0: p1,
            c1: t1,
            c2: -3.0 * p1 + 3.0 * p2 - 2.0 * t1 - t2,
            c3: 2.0 * p1 - 2.0 * p2 + t1 + t2,
        }
    }

    #[inline]
    fn point(&self, w: f32) -> Vec3 {
        self.c0 + w * (self.c1 + w * (self.c2 + w * self.c3))
    }

    #[inline]
    fn derivative(&self, w: f32) -> Vec3 {
        self.c1 + w * (2.0 * self.c2 + w * 3.0 * self.c3)
    }
}

/// The racecourse centreline. Immutable after construction.
#[derive(Debug, Clone)]
pub struct TrackSpline {
    points: Vec<Vec3>,
    segments: Vec<Segment>,
    width: f32,
    /// Cumulative length at each table division (len = divisions + 1)
    arc_lengths: Vec<f32>,
    /// Evenly spaced samples for global nearest-point scans
    coarse: Vec<Vec3>,
}

impl TrackSpline {
    /// Build a closed spline through `points`
    pub fn new(points: Vec<Vec3>, width: f32) -> Result<Self, TrackError> {
        if points.len() < 3 {
            return Err(TrackError::TooFewPoints { count: points.len() });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(TrackError::NonFinitePoint { index });
        }
        if !width.is_finite() || width <= 0.0 {
            return Err(TrackError::InvalidWidth { width });
        }

        let n = points.len();
        let segments = (0..n)
            .map(|i| {
                Segment::centripetal(
                    points[(i + n - 1) % n],
                    points[i],
                    points[(i + 1) % n],
                    points[(i + 2) % n],
                )
            })
            .collect();

        let mut track = Self {
            points,
            segments,
            width,
            arc_lengths: Vec::new(),
            coarse: Vec::new(),
        };

        let divisions = n * ARC_DIVISIONS_PER_POINT;
        let mut lengths = Vec::with_capacity(divisions + 1);
        lengths.push(0.0);
        let mut prev = track.raw_point(0.0);
        let mut sum = 0.0;
        for i in 1..=divisions {
            let p = track.raw_point(i as f32 / divisions as f32);
            sum += prev.distance(p);
            lengths.push(sum);
            prev = p;
        }
        if !sum.is_finite() || sum <= 0.0 {
            return Err(TrackError::DegenerateLength);
        }
        track.arc_lengths = lengths;

        track.coarse = (0..TRACK_COARSE_SAMPLES)
            .map(|i| track.point_at(i as f32 / TRACK_COARSE_SAMPLES as f32))
            .collect();

        log::debug!(
            "Track built: {} control points, length {:.0}",
            track.points.len(),
            track.length()
        );

        Ok(track)
    }

    /// The default open-ocean circuit
    pub fn default_circuit() -> Result<Self, TrackError> {
        Self::new(DEFAULT_CIRCUIT.to_vec(), DEFAULT_TRACK_WIDTH)
    }

    /// Lateral half-width of the course
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Total centreline length
    pub fn length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Precomputed evenly spaced samples; entry i sits at t = i / len
    pub fn coarse_samples(&self) -> &[Vec3] {
        &self.coarse
    }

    /// Point at normalised arc-length parameter `t` (wraps)
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.raw_point(self.arc_to_raw(wrap_unit(t)))
    }

    /// Unit tangent at `t` (wraps)
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let raw = self.arc_to_raw(wrap_unit(t));
        let (segment, w) = self.locate(raw);
        let d = segment.derivative(w);
        if d.length_squared() > 1e-12 {
            return d.normalize();
        }
        // Stationary point: fall back to the chord across it
        let chord = self.raw_point(raw + 1e-4) - self.raw_point(raw - 1e-4);
        if chord.length_squared() > 1e-12 {
            chord.normalize()
        } else {
            Vec3::Z
        }
    }

    /// Horizontal unit vector pointing to the racer's right at `t`
    pub fn side_normal_at(&self, t: f32) -> Vec3 {
        let n = self.tangent_at(t).cross(Vec3::Y);
        if n.length_squared() > 1e-12 {
            n.normalize()
        } else {
            Vec3::X
        }
    }

    fn locate(&self, raw: f32) -> (&Segment, f32) {
        let n = self.segments.len();
        let p = wrap_unit(raw) * n as f32;
        let index = (p.floor() as usize).min(n - 1);
        (&self.segments[index], p - index as f32)
    }

    /// Point at the uniform (per-segment) parameter
    fn raw_point(&self, raw: f32) -> Vec3 {
        let (segment, w) = self.locate(raw);
        segment.point(w)
    }

    /// Map normalised arc length to the uniform parameter
    fn arc_to_raw(&self, u: f32) -> f32 {
        let lengths = &self.arc_lengths;
        let divisions = lengths.len() - 1;
        let target = u * self.length();

        // Last index whose cumulative length is <= target
        let i = lengths
            .partition_point(|&l| l <= target)
            .saturating_sub(1)
            .min(divisions - 1);
        let span = lengths[i + 1] - lengths[i];
        let frac = if span > 0.0 { (target - lengths[i]) / span } else { 0.0 };
        (i as f32 + frac) / divisions as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_endpoints() {
        let track = TrackSpline::default_circuit().unwrap();
        assert_eq!(track.point_at(0.0), track.point_at(1.0));
        assert_eq!(track.tangent_at(0.0), track.tangent_at(1.0));
        assert_eq!(track.point_at(0.0), DEFAULT_CIRCUIT[0]);
    }

    #[test]
    fn test_continuous_across_wrap() {
        let track = TrackSpline::default_circuit().unwrap();
        let before = track.point_at(0.9999);
        let after = track.point_at(0.0001);
        assert!(before.distance(after) < 2.0);
    }

    #[test]
    fn test_tangent_is_unit() {
        let track = TrackSpline::default_circuit().unwrap();
        for i in 0..500 {
            let t = i as f32 / 500.0;
            let len = track.tangent_at(t).length();
            assert!((len - 1.0).abs() < 1e-4, "t={t} len={len}");
        }
    }

    #[test]
    fn test_tangent_points_along_travel() {
        let track = TrackSpline::default_circuit().unwrap();
        for i in 0..100 {
            let t = i as f32 / 100.0;
            let step = track.point_at(t + 0.001) - track.point_at(t);
            assert!(step.normalize().dot(track.tangent_at(t)) > 0.95);
        }
    }

    #[test]
    fn test_arc_length_spacing_is_even() {
        let track = TrackSpline::default_circuit().unwrap();
        let n = 400;
        let expected = track.length() / n as f32;
        for i in 0..n {
            let a = track.point_at(i as f32 / n as f32);
            let b = track.point_at((i + 1) as f32 / n as f32);
            let d = a.distance(b);
            assert!((d - expected).abs() < expected * 0.05, "step {i}: {d} vs {expected}");
        }
    }

    #[test]
    fn test_side_normal_is_horizontal_and_perpendicular() {
        let track = TrackSpline::default_circuit().unwrap();
        let n = track.side_normal_at(0.3);
        assert!(n.y.abs() < 1e-6);
        assert!(n.dot(track.tangent_at(0.3)).abs() < 1e-4);
    }

    #[test]
    fn test_coarse_table() {
        let track = TrackSpline::default_circuit().unwrap();
        assert_eq!(track.coarse_samples().len(), TRACK_COARSE_SAMPLES);
        assert_eq!(track.coarse_samples()[50], track.point_at(0.25));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            TrackSpline::new(vec![Vec3::ZERO, Vec3::X], 45.0).unwrap_err(),
            TrackError::TooFewPoints { count: 2 }
        );
        assert_eq!(
            TrackSpline::new(vec![Vec3::ZERO, Vec3::X, Vec3::splat(f32::NAN)], 45.0).unwrap_err(),
            TrackError::NonFinitePoint { index: 2 }
        );
        assert_eq!(
            TrackSpline::new(vec![Vec3::ZERO; 4], 45.0).unwrap_err(),
            TrackError::DegenerateLength
        );
        assert!(matches!(
            TrackSpline::new(DEFAULT_CIRCUIT.to_vec(), 0.0),
            Err(TrackError::InvalidWidth { .. })
        ));
    }
}
