//! Elliptical arcs as produced by the SVG `A` path command
use crate::{
    curve::Cubic,
    geometry::{PI, Point, Scalar, Transform},
};
use std::fmt;

/// Elliptical arc in center parameterization
#[derive(Clone, Copy, PartialEq)]
pub struct EllipArc {
    center: Point,
    /// radius along x-axis before the rotation
    rx: Scalar,
    /// radius along y-axis before the rotation
    ry: Scalar,
    /// x-axis rotation
    phi: Scalar,
    /// angular start
    eta: Scalar,
    /// angular size
    eta_delta: Scalar,
}

impl fmt::Debug for EllipArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Arc center:{:?} radius:{:?} phi:{:.3?} eta:{:.3?} eta_delta:{:.3?}",
            self.center,
            Point([self.rx, self.ry]),
            self.phi,
            self.eta,
            self.eta_delta
        )
    }
}

impl EllipArc {
    /// Convert arc from SVG endpoint arguments to the center parameterization
    ///
    /// Follows the SVG arc implementation notes
    /// [Arc to Parametric](https://www.w3.org/TR/SVG/implnote.html#ArcImplementationNotes).
    /// Returns `None` for degenerate arcs (coincident endpoints or zero radii),
    /// which callers replace with a straight line per the same notes.
    pub fn new_param(
        src: Point,
        dst: Point,
        rx: Scalar,
        ry: Scalar,
        x_axis_rot: Scalar,
        large_flag: bool,
        sweep_flag: bool,
    ) -> Option<Self> {
        let rx = rx.abs();
        let ry = ry.abs();
        if rx < 1e-12 || ry < 1e-12 || src.is_close_to(dst) {
            return None;
        }
        let phi = x_axis_rot * PI / 180.0;

        // Eq 5.1
        let Point([x1, y1]) = Transform::identity().rotate(-phi).apply(0.5 * (src - dst));
        // scale up radii that cannot reach between the endpoints
        let s = (x1 / rx).powi(2) + (y1 / ry).powi(2);
        let (rx, ry) = if s > 1.0 {
            let s = s.sqrt();
            (rx * s, ry * s)
        } else {
            (rx, ry)
        };
        // Eq 5.2
        let sq = ((rx * ry).powi(2) / ((rx * y1).powi(2) + (ry * x1).powi(2)) - 1.0)
            .max(0.0)
            .sqrt();
        let sq = if large_flag == sweep_flag { -sq } else { sq };
        let center = sq * Point([rx * y1 / ry, -ry * x1 / rx]);
        let Point([cx, cy]) = center;
        // Eq 5.3 convert center back to the initial coordinates
        let center = Transform::identity().rotate(phi).apply(center) + 0.5 * (dst + src);
        // Eq 5.5-6
        let v0 = Point([1.0, 0.0]);
        let v1 = Point([(x1 - cx) / rx, (y1 - cy) / ry]);
        let v2 = Point([(-x1 - cx) / rx, (-y1 - cy) / ry]);
        // initial angle
        let eta = v0.angle_between(v1)?;
        // delta angle to be covered when t changes from 0..1
        let eta_delta = v1.angle_between(v2)?.rem_euclid(2.0 * PI);
        let eta_delta = if !sweep_flag && eta_delta > 0.0 {
            eta_delta - 2.0 * PI
        } else if sweep_flag && eta_delta < 0.0 {
            eta_delta + 2.0 * PI
        } else {
            eta_delta
        };

        Some(Self {
            center,
            rx,
            ry,
            phi,
            eta,
            eta_delta,
        })
    }

    pub fn at(&self, t: Scalar) -> Point {
        let (angle_sin, angle_cos) = (self.eta + t * self.eta_delta).sin_cos();
        let point = Point([self.rx * angle_cos, self.ry * angle_sin]);
        Transform::identity().rotate(self.phi).apply(point) + self.center
    }

    /// Convert elliptical arc to an iterator over cubic bezier segments
    pub fn to_cubics(&self) -> EllipArcCubicIter {
        EllipArcCubicIter::new(*self)
    }
}

/// Approximate arc with a sequence of cubic bezier curves
///
/// [Drawing an elliptical arc using polylines, quadratic or cubic Bezier curves]
/// (http://www.spaceroots.org/documents/ellipse/elliptical-arc.pdf)
///
/// The arc is split in segments smaller than `pi / 2`, each segment from
/// `eta_1` to `eta_2` becomes:
///     P0 = A(eta_1)
///     P1 = P0 + alpha * A'(eta_1)
///     P2 = P3 - alpha * A'(eta_2)
///     P3 = A(eta_2)
/// where
///     alpha = sin(eta_2 - eta_1) * (sqrt(4 + 3 * tan((eta_2 - eta_1) / 2) ** 2) - 1) / 3
pub struct EllipArcCubicIter {
    arc: EllipArc,
    phi_tr: Transform,
    segment_delta: Scalar,
    segment_index: Scalar,
    segment_count: Scalar,
}

impl EllipArcCubicIter {
    fn new(arc: EllipArc) -> Self {
        let phi_tr = Transform::identity().rotate(arc.phi);
        let segment_max_angle = PI / 2.0;
        let segment_count = (arc.eta_delta.abs() / segment_max_angle).ceil().max(1.0);
        let segment_delta = arc.eta_delta / segment_count;
        Self {
            arc,
            phi_tr,
            segment_delta,
            segment_index: 0.0,
            segment_count: segment_count - 1.0,
        }
    }

    fn at(&self, alpha: Scalar) -> (Point, Point) {
        let (sin, cos) = alpha.sin_cos();
        let at = self
            .phi_tr
            .apply(Point([self.arc.rx * cos, self.arc.ry * sin]))
            + self.arc.center;
        let at_deriv = self
            .phi_tr
            .apply(Point([-self.arc.rx * sin, self.arc.ry * cos]));
        (at, at_deriv)
    }
}

impl Iterator for EllipArcCubicIter {
    type Item = Cubic;

    fn next(&mut self) -> Option<Self::Item> {
        if self.segment_index > self.segment_count {
            return None;
        }
        let eta_1 = self.arc.eta + self.segment_delta * self.segment_index;
        let eta_2 = eta_1 + self.segment_delta;
        self.segment_index += 1.0;

        let sq = (4.0 + 3.0 * ((eta_2 - eta_1) / 2.0).tan().powi(2)).sqrt();
        let alpha = (eta_2 - eta_1).sin() * (sq - 1.0) / 3.0;
        let (p0, d0) = self.at(eta_1);
        let (p3, d3) = self.at(eta_2);
        let p1 = p0 + alpha * d0;
        let p2 = p3 - alpha * d3;
        Some(Cubic([p0, p1, p2, p3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_arc_endpoints() {
        let src = Point::new(0.0, 0.0);
        let dst = Point::new(10.0, 0.0);
        let arc = EllipArc::new_param(src, dst, 5.0, 5.0, 0.0, false, true).unwrap();
        assert!(arc.at(0.0).is_close_to(src));
        assert!(arc.at(1.0).is_close_to(dst));
        // half circle above the x-axis for this sweep
        assert_approx_eq!(arc.at(0.5).x(), 5.0, 1e-9);
        assert_approx_eq!(arc.at(0.5).y(), -5.0, 1e-9);

        // coincident endpoints make the arc degenerate
        assert!(EllipArc::new_param(src, src, 5.0, 5.0, 0.0, true, true).is_none());
    }

    #[test]
    fn test_arc_to_cubics() {
        let arc =
            EllipArc::new_param(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 5.0, 5.0, 0.0, true, false)
                .unwrap();
        let cubics: Vec<_> = arc.to_cubics().collect();
        assert!(!cubics.is_empty());
        assert!(cubics.first().unwrap().start().is_close_to(arc.at(0.0)));
        assert!(cubics.last().unwrap().end().is_close_to(arc.at(1.0)));
        // segments are contiguous
        for pair in cubics.windows(2) {
            assert!(pair[0].end().is_close_to(pair[1].start()));
        }
        // a pi/2 slice at radius 5 deviates from the circle by ~1e-2
        for cubic in &cubics {
            let mid = cubic.at(0.5);
            assert_approx_eq!(mid.dist(arc.center), 5.0, 2e-2);
        }
    }
}
