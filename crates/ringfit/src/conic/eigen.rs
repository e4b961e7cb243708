//! Reduced 3×3 eigenproblem behind the direct ellipse fit.

use nalgebra::{Matrix3, Vector3};

/// Ellipse-constrained solution of `M a = λ C1 a`, given `system = C1⁻¹ M`.
///
/// Every real eigenvalue of `system` is found from its characteristic cubic
/// and paired with a null vector of `system − λI`. Only vectors with
/// `4 a₀ a₂ − a₁² > 0` describe ellipses; among those the smallest |λ|
/// (smallest algebraic residual) is returned.
pub(crate) fn solve_gep_3x3(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let [c2, c1, c0] = characteristic_coeffs(system)?;

    solve_cubic_real(1.0, c2, c1, c0)
        .into_iter()
        .filter_map(|lambda| {
            // A repeated root leaves a rank-1 shift without a unique direction.
            let v = null_vector_3x3(&(system - Matrix3::identity() * lambda))?;
            let ellipse_constraint = 4.0 * v[0] * v[2] - v[1] * v[1];
            (ellipse_constraint > 0.0).then_some((lambda.abs(), v))
        })
        .min_by(|(l, _), (r, _)| l.total_cmp(r))
        .map(|(_, v)| v)
}

/// Coefficients `[c2, c1, c0]` of `λ³ + c2 λ² + c1 λ + c0`, the
/// characteristic polynomial of `m`.
fn characteristic_coeffs(m: &Matrix3<f64>) -> Option<[f64; 3]> {
    let principal_minor = |i: usize, j: usize| m[(i, i)] * m[(j, j)] - m[(i, j)] * m[(j, i)];
    let trace = m.trace();
    let minors = principal_minor(0, 1) + principal_minor(0, 2) + principal_minor(1, 2);
    let det = m.determinant();
    let coeffs = [-trace, minors, -det];
    coeffs.iter().all(|c| c.is_finite()).then_some(coeffs)
}

/// Unit null vector of a rank-2 matrix, or `None` when the rank is lower.
///
/// The cross product of two independent rows is orthogonal to both, and so
/// to the whole row space; the largest of the three pairwise products is the
/// best conditioned.
fn null_vector_3x3(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        m.row(0).transpose(),
        m.row(1).transpose(),
        m.row(2).transpose(),
    ];
    let (v, norm_sq) = [(1, 2), (2, 0), (0, 1)]
        .into_iter()
        .map(|(i, j)| {
            let c = rows[i].cross(&rows[j]);
            let n = c.norm_squared();
            (c, n)
        })
        .max_by(|(_, l), (_, r)| l.total_cmp(r))?;

    if !norm_sq.is_finite() || norm_sq < 1e-30 {
        return None;
    }
    Some(v / norm_sq.sqrt())
}

/// Real roots of `a x³ + b x² + c x + d = 0` (one or three of them).
fn solve_cubic_real(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    let (b, c, d) = (b / a, c / a, d / a);

    // x = t − b/3 gives t³ + p t + q = 0
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;

    let disc = -4.0 * p * p * p - 27.0 * q * q;
    if disc >= 0.0 {
        // Trigonometric form; repeated roots land here too.
        let r = (-p / 3.0).max(0.0).sqrt();
        let cos_arg = if r < 1e-15 {
            0.0
        } else {
            (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0)
        };
        let theta = cos_arg.acos();
        (0..3)
            .map(|k| {
                let phase = (theta + std::f64::consts::TAU * k as f64) / 3.0;
                2.0 * r * phase.cos() + shift
            })
            .collect()
    } else {
        // Cardano. Near a double root the two discriminant forms can
        // disagree in sign by rounding.
        let s = (q * q / 4.0 + p * p * p / 27.0).max(0.0).sqrt();
        vec![(-q / 2.0 + s).cbrt() + (-q / 2.0 - s).cbrt() + shift]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cubic_with_three_real_roots() {
        // (x - 1)(x - 2)(x + 3) = x³ - 7x + 6
        let mut roots = solve_cubic_real(1.0, 0.0, -7.0, 6.0);
        roots.sort_by(f64::total_cmp);
        assert_eq!(roots.len(), 3);
        assert_relative_eq!(roots[0], -3.0, epsilon = 1e-12);
        assert_relative_eq!(roots[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(roots[2], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn cubic_with_one_real_root() {
        // (x - 2)(x² + 1) = x³ - 2x² + x - 2
        let roots = solve_cubic_real(1.0, -2.0, 1.0, -2.0);
        assert_eq!(roots.len(), 1);
        assert_relative_eq!(roots[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn cubic_with_double_root() {
        // λ (λ + 4)², the spectrum of the reduced system for an exact circle
        let roots = solve_cubic_real(1.0, 8.0, 16.0, 0.0);
        assert!(roots.iter().all(|r| r.is_finite()));
        assert!(roots.iter().any(|r| r.abs() < 1e-9));
    }

    #[test]
    fn circle_system_selects_the_circle() {
        let system = Matrix3::new(-2.0, 0.0, 2.0, 0.0, -4.0, 0.0, 2.0, 0.0, -2.0);
        let v = solve_gep_3x3(&system).expect("constraint-satisfying eigenvector");
        assert_relative_eq!(v[0] / v[2], 1.0, epsilon = 1e-9);
        assert!(v[1].abs() < 1e-9);
    }

    #[test]
    fn null_vector_of_rank_two_matrix() {
        let m = Matrix3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        let v = null_vector_3x3(&m).expect("rank-2 matrix has a null vector");
        assert!((m * v).norm() < 1e-12);
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_matrix_has_no_unique_null_vector() {
        assert!(null_vector_3x3(&Matrix3::zeros()).is_none());
    }
}
