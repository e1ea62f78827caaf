//! Utility functions and types used across the library
use crate::{EPSILON, Scalar};

/// Restrict value to a certain interval
#[inline]
pub fn clamp<T>(val: T, min: T, max: T) -> T
where
    T: PartialOrd,
{
    if val < min {
        min
    } else if val > max {
        max
    } else {
        val
    }
}

/// Solve quadratic equation `a * t ^ 2 + b * t + c = 0` for `t`
pub(crate) fn quadratic_solve(a: Scalar, b: Scalar, c: Scalar) -> impl Iterator<Item = Scalar> {
    let mut result = [None; 2];
    if a.abs() < EPSILON {
        if b.abs() > EPSILON {
            result[0] = Some(-c / b);
        }
        return result.into_iter().flatten();
    }
    let disc = b * b - 4.0 * a * c;
    if disc.abs() < EPSILON {
        result[0] = Some(-b / (2.0 * a));
    } else if disc > 0.0 {
        let sq = disc.sqrt();
        // More stable solution than generic formula:
        // https://people.csail.mit.edu/bkph/articles/Quadratics.pdf
        let mul = if b >= 0.0 { -b - sq } else { -b + sq };
        result = [Some(mul / (2.0 * a)), Some(2.0 * c / mul)];
    }
    result.into_iter().flatten()
}

/// Check whether byte is an SVG whitespace
#[inline]
pub(crate) fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c')
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[macro_export]
    macro_rules! assert_approx_eq {
        ( $v0:expr, $v1: expr ) => {{
            assert!(($v0 - $v1).abs() < $crate::EPSILON, "{} != {}", $v0, $v1);
        }};
        ( $v0:expr, $v1: expr, $e: expr ) => {{
            assert!(($v0 - $v1).abs() < $e, "{} != {}", $v0, $v1);
        }};
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-0.5, 0.0, 1.0), 0.0);
        assert_eq!(clamp(3, 1, 5), 3);
        assert!(is_space(b'\n'));
        assert!(!is_space(b','));
    }

    #[test]
    fn test_quadratic_solve() {
        let mut roots: Vec<_> = quadratic_solve(1.0, -3.0, 2.0).collect();
        roots.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(roots.len(), 2);
        assert_approx_eq!(roots[0], 1.0);
        assert_approx_eq!(roots[1], 2.0);

        let roots: Vec<_> = quadratic_solve(0.0, 2.0, -1.0).collect();
        assert_eq!(roots, vec![0.5]);
        assert_eq!(quadratic_solve(1.0, 0.0, 1.0).count(), 0);
    }
}
