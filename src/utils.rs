//! Utility functions used across the library
use crate::geometry::{EPSILON, Scalar};

/// Solve quadratic equation `a * t ^ 2 + b * t + c = 0`
///
/// Returns up to two real roots together with the root count. Uses the
/// numerically stable form that avoids catastrophic cancellation.
pub(crate) fn quadratic_solve(a: Scalar, b: Scalar, c: Scalar) -> ([Scalar; 2], usize) {
    if a.abs() < EPSILON {
        if b.abs() < EPSILON {
            return ([0.0; 2], 0);
        }
        return ([-c / b, 0.0], 1);
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return ([0.0; 2], 0);
    }
    if disc.abs() < EPSILON {
        return ([-b / (2.0 * a), 0.0], 1);
    }
    let sq = disc.sqrt();
    // the sign of `b` picks the addition that does not cancel
    let q = if b >= 0.0 {
        -(b + sq) / 2.0
    } else {
        -(b - sq) / 2.0
    };
    ([q / a, c / q], 2)
}

/// Asserts that two scalar expressions are approximately equal
#[macro_export]
macro_rules! assert_approx_eq {
    ( $v0:expr, $v1: expr ) => {{
        let (v0, v1) = ($v0, $v1);
        assert!((v0 - v1).abs() < 1e-9, "{} != {}", v0, v1);
    }};
    ( $v0:expr, $v1: expr, $e: expr ) => {{
        let (v0, v1) = ($v0, $v1);
        assert!((v0 - v1).abs() < $e, "{} != {}", v0, v1);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_solve() {
        let (roots, count) = quadratic_solve(1.0, -3.0, 2.0);
        assert_eq!(count, 2);
        let (r0, r1) = (roots[0].min(roots[1]), roots[0].max(roots[1]));
        assert_approx_eq!(r0, 1.0);
        assert_approx_eq!(r1, 2.0);

        let (roots, count) = quadratic_solve(0.0, 2.0, -4.0);
        assert_eq!(count, 1);
        assert_approx_eq!(roots[0], 2.0);

        let (_, count) = quadratic_solve(1.0, 0.0, 1.0);
        assert_eq!(count, 0);
    }
}
