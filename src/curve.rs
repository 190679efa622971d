//! Cubic bezier curves and their flattening into polylines
//!
//! The scene graph stores cubics exclusively. Quadratics only exist
//! transiently in the path builder and are elevated to cubics on the spot.
use crate::{
    geometry::{BBox, Point, Scalar, Transform},
    utils::quadratic_solve,
};
use std::fmt;

/// Quadratic bezier curve
///
/// Transient representation for `Q`/`T` path commands, always elevated
/// to a [`Cubic`] before storage.
#[derive(Clone, Copy, PartialEq)]
pub struct Quad(pub [Point; 3]);

impl Quad {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into(), p2.into()])
    }
}

impl From<Quad> for Cubic {
    /// Degree elevation, exact
    fn from(quad: Quad) -> Self {
        let Quad([p0, p1, p2]) = quad;
        let c1 = (1.0 / 3.0) * p0 + (2.0 / 3.0) * p1;
        let c2 = (2.0 / 3.0) * p1 + (1.0 / 3.0) * p2;
        Self([p0, c1, c2, p2])
    }
}

/// Cubic bezier curve defined by four control points
#[derive(Clone, Copy, PartialEq)]
pub struct Cubic(pub [Point; 4]);

impl Cubic {
    pub fn new(
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> Self {
        Self([p0.into(), p1.into(), p2.into(), p3.into()])
    }

    #[inline]
    pub fn points(&self) -> [Point; 4] {
        self.0
    }

    #[inline]
    pub fn start(&self) -> Point {
        self.0[0]
    }

    #[inline]
    pub fn end(&self) -> Point {
        self.0[3]
    }

    /// Point on the curve at parameter `t`
    pub fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2, p3]) = *self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        let (t3, t_3) = (t2 * t1, t_2 * t_1);
        t_3 * p0 + 3.0 * t1 * t_2 * p1 + 3.0 * t2 * t_1 * p2 + t3 * p3
    }

    pub fn transform(&self, tr: Transform) -> Self {
        let Self([p0, p1, p2, p3]) = *self;
        Self([tr.apply(p0), tr.apply(p1), tr.apply(p2), tr.apply(p3)])
    }

    /// Reflection of the second control point around the end point
    ///
    /// This is the first control point implied by the SVG smooth
    /// commands (`S`/`T` after conversion).
    pub fn smooth(&self) -> Point {
        let Self([_p0, _p1, p2, p3]) = *self;
        2.0 * p3 - p2
    }

    /// Flatness criteria for the cubic curve
    ///
    /// This function actually returns `16 * flatness^2`. It bounds the
    /// maximum distance between the curve and the chord `l(t) = (1 - t) * p0 + t * p3`:
    ///     f^2 <= 1/16 (max{u_x^2, v_x^2} + max{u_y^2, v_y^2})
    /// where:
    ///     u = 3 * p1 - 2 * p0 - p3
    ///     v = 3 * p2 - p0 - 2 * p3
    ///
    /// [Linear Approximation of Bezier Curve](https://hcklbrrfnn.files.wordpress.com/2012/08/bez.pdf)
    pub fn flatness(&self) -> Scalar {
        let Self([p0, p1, p2, p3]) = *self;
        let u = 3.0 * p1 - 2.0 * p0 - p3;
        let v = 3.0 * p2 - p0 - 2.0 * p3;
        (u.x() * u.x()).max(v.x() * v.x()) + (u.y() * u.y()).max(v.y() * v.y())
    }

    /// Optimized version of splitting at `t = 0.5`
    pub fn split(&self) -> (Self, Self) {
        let Self([p0, p1, p2, p3]) = *self;
        let mid = 0.125 * p0 + 0.375 * p1 + 0.375 * p2 + 0.125 * p3;
        let c0 = Self([p0, 0.5 * p0 + 0.5 * p1, 0.25 * p0 + 0.5 * p1 + 0.25 * p2, mid]);
        let c1 = Self([mid, 0.25 * p1 + 0.5 * p2 + 0.25 * p3, 0.5 * p2 + 0.5 * p3, p3]);
        (c0, c1)
    }

    /// Tight bounding box of the curve
    ///
    /// Evaluates the curve at the roots of its derivative instead of
    /// taking the control point hull, which over-estimates.
    pub fn bbox(&self, init: Option<BBox>) -> BBox {
        let Self([p0, p1, p2, p3]) = *self;
        let mut bbox = match init {
            Some(init) => init.extend(p0).extend(p3),
            None => BBox::new(p0, p3),
        };
        // derivative is a quadratic in t per axis
        let a = 3.0 * (p3 - p0) + 9.0 * (p1 - p2);
        let b = 6.0 * (p0 + p2) - 12.0 * p1;
        let c = 3.0 * (p1 - p0);
        for (ca, cb, cc) in [(a.x(), b.x(), c.x()), (a.y(), b.y(), c.y())] {
            let (roots, count) = quadratic_solve(ca, cb, cc);
            for root in &roots[..count] {
                if *root > 0.0 && *root < 1.0 {
                    bbox = bbox.extend(self.at(*root));
                }
            }
        }
        bbox
    }

    /// Append a polyline approximation of the curve to `out`
    ///
    /// Recursively subdivides until the chord deviation drops below
    /// `tolerance`. The start point is not pushed, matching the contour
    /// convention where each segment continues from the previous end.
    pub fn flatten_into(&self, tolerance: Scalar, out: &mut Vec<Point>) {
        self.flatten_rec(tolerance, 16, out);
    }

    fn flatten_rec(&self, tolerance: Scalar, depth: u8, out: &mut Vec<Point>) {
        // the depth cap keeps subdivision finite for curves whose
        // flatness never converges, such as non-finite control points
        let flatness = self.flatness();
        if depth == 0 || !flatness.is_finite() || flatness < 16.0 * tolerance * tolerance {
            out.push(self.end());
        } else {
            let (c0, c1) = self.split();
            c0.flatten_rec(tolerance, depth - 1, out);
            c1.flatten_rec(tolerance, depth - 1, out);
        }
    }
}

impl fmt::Debug for Cubic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self([p0, p1, p2, p3]) = self;
        write!(f, "Cubic {p0:?} {p1:?} {p2:?} {p3:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_elevation() {
        let quad = Quad::new((0.0, 0.0), (1.0, 2.0), (2.0, 0.0));
        let cubic: Cubic = quad.into();
        // elevation is exact, endpoints and midpoint must agree
        assert!(cubic.start().is_close_to(Point::new(0.0, 0.0)));
        assert!(cubic.end().is_close_to(Point::new(2.0, 0.0)));
        assert_approx_eq!(cubic.at(0.5).y(), 1.0);
    }

    #[test]
    fn test_bbox() {
        let cubic = Cubic::new((106.0, 0.0), (0.0, 100.0), (382.0, 216.0), (324.0, 14.0));
        let bbox = cubic.bbox(None);
        assert_approx_eq!(bbox.x(), 87.308, 0.001);
        assert_approx_eq!(bbox.y(), 0.0, 0.001);
        assert_approx_eq!(bbox.width(), 242.724, 0.001);
        assert_approx_eq!(bbox.height(), 125.140, 0.001);
    }

    #[test]
    fn test_flatten() {
        let cubic = Cubic::new((0.0, 0.0), (10.0, 20.0), (30.0, 20.0), (40.0, 0.0));
        let mut line = vec![cubic.start()];
        cubic.flatten_into(0.05, &mut line);
        assert!(line.len() > 4);
        assert!(line.last().unwrap().is_close_to(cubic.end()));
        // every vertex stays close to the curve
        for pair in line.windows(2) {
            assert!(pair[0].dist(pair[1]) < 10.0);
        }
        // flat curve needs no subdivision
        let flat = Cubic::new((0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0));
        let mut line = Vec::new();
        flat.flatten_into(0.05, &mut line);
        assert_eq!(line.len(), 1);
    }

    #[test]
    fn test_flatten_non_finite() {
        // flatness of a NaN curve never converges, subdivision must stop
        let cubic = Cubic::new((0.0, 0.0), (Scalar::NAN, 0.0), (1.0, 1.0), (2.0, 0.0));
        let mut line = Vec::new();
        cubic.flatten_into(0.05, &mut line);
        assert_eq!(line.len(), 1);
    }

    #[test]
    fn test_split() {
        let cubic = Cubic::new((158.0, 70.0), (210.0, 250.0), (25.0, 190.0), (219.0, 89.0));
        let (c0, c1) = cubic.split();
        assert!(c0.start().is_close_to(cubic.start()));
        assert!(c0.end().is_close_to(cubic.at(0.5)));
        assert!(c1.start().is_close_to(cubic.at(0.5)));
        assert!(c1.end().is_close_to(cubic.end()));
        assert!(c0.at(0.5).is_close_to(cubic.at(0.25)));
        assert!(c1.at(0.5).is_close_to(cubic.at(0.75)));
    }
}
