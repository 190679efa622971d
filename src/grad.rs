//! Gradient paints and their evaluation
use crate::{
    color::{ColorF, RGBA},
    geometry::{Point, Scalar, Transform},
    utils::quadratic_solve,
};
use std::cmp::Ordering;

/// Fill or stroke color source of a shape
#[derive(Debug, Clone)]
pub enum Paint {
    Color(RGBA),
    LinGrad(GradLinear),
    RadGrad(GradRadial),
}

impl Paint {
    /// Evaluate paint at a document-space point
    pub fn at(&self, point: Point) -> ColorF {
        match self {
            Paint::Color(color) => (*color).into(),
            Paint::LinGrad(grad) => grad.at(point),
            Paint::RadGrad(grad) => grad.at(point),
        }
    }

    /// Solid paints can skip per-pixel evaluation
    pub fn to_solid(&self) -> Option<RGBA> {
        match self {
            Paint::Color(color) => Some(*color),
            _ => None,
        }
    }
}

impl From<RGBA> for Paint {
    fn from(color: RGBA) -> Self {
        Self::Color(color)
    }
}

/// Gradient spread logic for the parameter smaller than 0 and greater than 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GradSpread {
    /// Use the same colors as the edge of the gradient
    #[default]
    Pad,
    /// Repeat gradient
    Repeat,
    /// Repeat gradient alternating reflected and non-reflected versions
    Reflect,
}

impl GradSpread {
    /// Map gradient parameter value to the range of [0, 1]
    pub fn at(&self, t: Scalar) -> Scalar {
        match self {
            GradSpread::Pad => t,
            GradSpread::Repeat => t.rem_euclid(1.0),
            GradSpread::Reflect => ((t + 1.0).rem_euclid(2.0) - 1.0).abs(),
        }
    }
}

/// Color at a particular parameter offset of the gradient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradStop {
    pub offset: Scalar,
    pub color: ColorF,
}

impl GradStop {
    pub fn new(offset: Scalar, color: ColorF) -> Self {
        Self { offset, color }
    }
}

/// Ordered list of all stops in the gradient
///
/// Offsets are clamped to [0, 1] and forced non-decreasing on
/// construction so evaluation can binary search.
#[derive(Debug, Clone)]
pub struct GradStops {
    stops: Vec<GradStop>,
}

impl GradStops {
    pub fn new(mut stops: Vec<GradStop>) -> Self {
        stops.sort_by(|s0, s1| {
            s0.offset
                .partial_cmp(&s1.offset)
                .unwrap_or(Ordering::Greater)
        });
        let mut previous: Scalar = 0.0;
        for stop in stops.iter_mut() {
            stop.offset = stop.offset.clamp(previous, 1.0);
            previous = stop.offset;
        }
        if stops.is_empty() {
            stops.push(GradStop::new(0.0, ColorF::new(0.0, 0.0, 0.0, 1.0)));
        }
        Self { stops }
    }

    /// Interpolate between bracketing stops, clamped outside [0, 1]
    pub fn at(&self, t: Scalar) -> ColorF {
        let index = self.stops.binary_search_by(|stop| {
            if stop.offset < t {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        });
        let index = match index {
            Ok(index) => index,
            Err(index) => index,
        };
        let size = self.stops.len();
        if index == 0 {
            self.stops[index].color
        } else if index == size {
            self.stops[size - 1].color
        } else {
            let s0 = &self.stops[index - 1];
            let s1 = &self.stops[index];
            if (s1.offset - s0.offset).abs() < 1e-12 {
                s1.color
            } else {
                let ratio = (t - s0.offset) / (s1.offset - s0.offset);
                s0.color.lerp(s1.color, ratio as f32)
            }
        }
    }
}

impl From<Vec<GradStop>> for GradStops {
    fn from(stops: Vec<GradStop>) -> Self {
        Self::new(stops)
    }
}

/// Linear gradient
///
/// `tr` maps document space into gradient space, it is the inverse of
/// the combined units and `gradientTransform` matrix resolved at parse
/// time.
#[derive(Debug, Clone)]
pub struct GradLinear {
    stops: GradStops,
    spread: GradSpread,
    tr: Transform,
    start: Point,
    // precomputed value equal to `(end - start) / |end - start| ^ 2`
    dir: Point,
}

impl GradLinear {
    pub fn new(
        stops: impl Into<GradStops>,
        spread: GradSpread,
        tr: Transform,
        start: impl Into<Point>,
        end: impl Into<Point>,
    ) -> Self {
        let start = start.into();
        let end = end.into();
        let dir = end - start;
        let dot = dir.dot(dir);
        Self {
            stops: stops.into(),
            spread,
            tr,
            start,
            dir: if dot < 1e-12 { Point::new(0.0, 0.0) } else { dir / dot },
        }
    }

    pub fn at(&self, point: Point) -> ColorF {
        // t = (point - start).dot(end - start) / |end - start| ^ 2
        let t = (self.tr.apply(point) - self.start).dot(self.dir);
        self.stops.at(self.spread.at(t))
    }
}

/// Radial gradient
///
/// Two-circle evaluation between the focal circle `(fcenter, fradius)`
/// and the edge circle `(center, radius)`.
#[derive(Debug, Clone)]
pub struct GradRadial {
    stops: GradStops,
    spread: GradSpread,
    tr: Transform,
    center: Point,
    radius: Scalar,
    fcenter: Point,
    fradius: Scalar,
}

impl GradRadial {
    pub fn new(
        stops: impl Into<GradStops>,
        spread: GradSpread,
        tr: Transform,
        center: impl Into<Point>,
        radius: Scalar,
        fcenter: impl Into<Point>,
        fradius: Scalar,
    ) -> Self {
        Self {
            stops: stops.into(),
            spread,
            tr,
            center: center.into(),
            radius,
            fcenter: fcenter.into(),
            fradius,
        }
    }

    pub fn at(&self, point: Point) -> ColorF {
        match self.offset(self.tr.apply(point)) {
            None => ColorF::new(0.0, 0.0, 0.0, 0.0),
            Some(offset) => self.stops.at(self.spread.at(offset)),
        }
    }

    /// Calculate gradient offset at a given gradient-space point
    ///
    /// The gradient interpolates between circles `c(t) = (1 - t) * fc + t * c`
    /// with radius `r(t) = (1 - t) * fr + t * r`; solving `|| c(t) - p || = r(t)`
    /// for `t` gives a quadratic, the root with the bigger radius wins.
    ///
    /// [reference]: https://cgit.freedesktop.org/pixman/tree/pixman/pixman-radial-gradient.c
    fn offset(&self, point: Point) -> Option<Scalar> {
        let cd = self.center - self.fcenter;
        let pd = point - self.fcenter;
        let rd = self.radius - self.fradius;

        let a = cd.dot(cd) - rd * rd;
        let b = -2.0 * (cd.dot(pd) + self.fradius * rd);
        let c = pd.dot(pd) - self.fradius * self.fradius;

        let (roots, count) = quadratic_solve(a, b, c);
        match count {
            0 => None,
            1 => Some(roots[0]),
            _ => Some(roots[0].max(roots[1])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    fn opaque(r: f32, g: f32, b: f32) -> ColorF {
        ColorF::new(r, g, b, 1.0)
    }

    #[test]
    fn test_spread() {
        use GradSpread::*;
        assert_approx_eq!(Reflect.at(0.3), 0.3, 1e-6);
        assert_approx_eq!(Reflect.at(-0.3), 0.3, 1e-6);
        assert_approx_eq!(Reflect.at(1.3), 0.7, 1e-6);
        assert_approx_eq!(Reflect.at(-1.3), 0.7, 1e-6);

        assert_approx_eq!(Repeat.at(0.3), 0.3);
        assert_approx_eq!(Repeat.at(-0.3), 0.7);
    }

    #[test]
    fn test_grad_stops() {
        let stops = GradStops::new(vec![
            GradStop::new(0.0, opaque(1.0, 0.0, 0.0)),
            GradStop::new(0.5, opaque(0.0, 1.0, 0.0)),
            GradStop::new(1.0, opaque(0.0, 0.0, 1.0)),
        ]);
        assert_eq!(stops.at(-1.0), opaque(1.0, 0.0, 0.0));
        assert_eq!(stops.at(0.25), opaque(0.5, 0.5, 0.0));
        assert_eq!(stops.at(0.75), opaque(0.0, 0.5, 0.5));
        assert_eq!(stops.at(2.0), opaque(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_grad_stops_order() {
        // offsets are forced non-decreasing
        let stops = GradStops::new(vec![
            GradStop::new(0.7, opaque(1.0, 0.0, 0.0)),
            GradStop::new(0.3, opaque(0.0, 1.0, 0.0)),
        ]);
        assert_eq!(stops.at(0.0), opaque(0.0, 1.0, 0.0));
        assert_eq!(stops.at(1.0), opaque(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_linear_grad() {
        let c0 = opaque(1.0, 0.0, 0.0);
        let c1 = opaque(0.0, 0.0, 1.0);
        let grad = GradLinear::new(
            vec![GradStop::new(0.0, c0), GradStop::new(1.0, c1)],
            GradSpread::default(),
            Transform::identity(),
            (0.0, 0.0),
            (1.0, 1.0),
        );
        assert_eq!(grad.at(Point::new(-0.5, -0.5)), c0);
        assert_eq!(grad.at(Point::new(1.5, 1.5)), c1);
        // projection onto the axis at the midpoint
        let mid = grad.at(Point::new(1.0, 0.0));
        assert_approx_eq!(mid.alpha() as f64, 1.0, 1e-6);
        assert_eq!(mid, c0.lerp(c1, 0.5));
    }

    #[test]
    fn test_radial_grad() {
        let fcenter = Point::new(0.25, 0.0);
        let center = Point::new(0.5, 0.0);
        let grad = GradRadial::new(
            vec![],
            GradSpread::Pad,
            Transform::identity(),
            center,
            0.5,
            fcenter,
            0.1,
        );
        assert!(grad.offset(fcenter).unwrap() < 0.0);
        assert_approx_eq!(grad.offset(Point::new(0.675, 0.0)).unwrap(), 0.5);
        assert_approx_eq!(grad.offset(Point::new(1.0, 0.0)).unwrap(), 1.0);
    }
}
