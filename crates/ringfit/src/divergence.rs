//! Angular-spread probe over gradient directions.
//!
//! A cluster whose gradients all point the same way comes from a short,
//! nearly straight arc and cannot support a reliable ellipse fit. The probe
//! finds the pair of points whose normalized directions have the smallest
//! inner product.

use crate::conic::FitError;
use crate::point::GradientDirection;

/// Outcome of [`find_most_divergent_pair`].
#[derive(Debug, Clone, Copy)]
pub struct DivergentPair<'a, P> {
    /// Earlier point of the pair in input order.
    pub first: &'a P,
    /// Later point of the pair in input order.
    pub second: &'a P,
    pub first_index: usize,
    pub second_index: usize,
    /// Cosine of the angle between the two directions, in [−1, 1].
    pub min_inner_product: f64,
    /// `min_inner_product < max_cos` for the threshold passed in.
    pub below_threshold: bool,
}

/// Scan all pairs and return the most divergent one.
///
/// Points whose direction is zero or non-finite are skipped. Ties keep the
/// first pair encountered in `(i, j)` lexicographic order, so the result is
/// deterministic for a given input order.
///
/// Fails with `InsufficientData` when fewer than two points have a usable
/// direction.
pub fn find_most_divergent_pair<P: GradientDirection>(
    points: &[P],
    max_cos: f64,
) -> Result<DivergentPair<'_, P>, FitError> {
    let dirs: Vec<(usize, [f64; 2])> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| unit_direction(p.direction()).map(|d| (i, d)))
        .collect();

    if dirs.len() < 2 {
        tracing::debug!(
            "divergence probe: {} of {} points have a usable direction",
            dirs.len(),
            points.len()
        );
        return Err(FitError::InsufficientData {
            needed: 2,
            got: dirs.len(),
        });
    }

    let mut best = (dirs[0].0, dirs[1].0, f64::INFINITY);
    for (k, &(i, di)) in dirs.iter().enumerate() {
        for &(j, dj) in &dirs[k + 1..] {
            let dot = (di[0] * dj[0] + di[1] * dj[1]).clamp(-1.0, 1.0);
            if dot < best.2 {
                best = (i, j, dot);
            }
        }
    }

    let (first_index, second_index, min_inner_product) = best;
    Ok(DivergentPair {
        first: &points[first_index],
        second: &points[second_index],
        first_index,
        second_index,
        min_inner_product,
        below_threshold: min_inner_product < max_cos,
    })
}

fn unit_direction([dx, dy]: [f64; 2]) -> Option<[f64; 2]> {
    let n = dx.hypot(dy);
    if !n.is_finite() || n <= f64::MIN_POSITIVE {
        return None;
    }
    Some([dx / n, dy / n])
}
