//! Unsigned angle at a vertex between two pixel directions.

use std::f64::consts::PI;

use tracing::warn;

use crate::types::Pixel;

/// Norm substituted for a zero-length direction.
///
/// With a zero vector the dot product is also zero, so the fallback
/// always yields a right angle.
pub const DEGENERATE_NORM: f64 = 1e-4;

/// Angle in radians between `u - v` and `w - v`, in `[0, π]`.
///
/// The dot product and squared norms are accumulated exactly in integer
/// arithmetic; only the final cosine is formed in floating point. If
/// either direction has zero length its norm is replaced by
/// [`DEGENERATE_NORM`] instead of failing.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn angle(u: Pixel, v: Pixel, w: Pixel) -> f64 {
    let (a_row, a_col) = u.delta_from(v);
    let (b_row, b_col) = w.delta_from(v);

    let dot = i128::from(a_row) * i128::from(b_row) + i128::from(a_col) * i128::from(b_col);
    let norm_a = i128::from(a_row).pow(2) + i128::from(a_col).pow(2);
    let norm_b = i128::from(b_row).pow(2) + i128::from(b_col).pow(2);

    let denominator = if norm_a == 0 || norm_b == 0 {
        warn!(u = %u, v = %v, w = %w, "zero-length direction; substituting epsilon norm");
        let length = |n: i128| {
            if n == 0 {
                DEGENERATE_NORM
            } else {
                (n as f64).sqrt()
            }
        };
        length(norm_a) * length(norm_b)
    } else {
        ((norm_a * norm_b) as f64).sqrt()
    };

    let cosine = (dot as f64 / denominator).clamp(-1.0, 1.0);
    cosine.acos().clamp(0.0, PI)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    fn p(row: usize, col: usize) -> Pixel {
        Pixel::new(row, col)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn straight_through_is_pi() {
        assert!(close(angle(p(5, 0), p(5, 5), p(5, 10)), PI));
    }

    #[test]
    fn perpendicular_is_half_pi() {
        assert!(close(angle(p(0, 5), p(5, 5), p(5, 10)), FRAC_PI_2));
    }

    #[test]
    fn same_direction_is_zero() {
        assert!(close(angle(p(5, 9), p(5, 5), p(5, 100)), 0.0));
    }

    #[test]
    fn degenerate_directions_fall_back_to_a_right_angle() {
        let v = p(3, 3);
        assert!(close(angle(v, v, p(3, 9)), FRAC_PI_2));
        assert!(close(angle(p(0, 0), v, v), FRAC_PI_2));
        assert!(close(angle(v, v, v), FRAC_PI_2));
    }

    #[test]
    fn long_nearly_collinear_vectors_stay_in_range() {
        let v = p(0, 0);
        let a = angle(p(1_000_000, 999_999), v, p(999_999, 1_000_000));
        assert!(a.is_finite());
        assert!((0.0..=PI).contains(&a));
        assert!(a > 0.0);
    }

    #[test]
    fn results_are_always_bounded() {
        let v = p(10, 10);
        for r in 0..21 {
            for c in 0..21 {
                let a = angle(p(r, c), v, p(20 - c, r));
                assert!(a.is_finite());
                assert!((0.0..=PI).contains(&a));
            }
        }
    }
}
