//! Algebraic least-squares circle fit.
//!
//! Linearizes `(x − cx)² + (y − cy)² = r²` into
//! `2·cx·x + 2·cy·y + c = x² + y²` with `c = r² − cx² − cy²` and solves the
//! normal equations in normalized coordinates.

use nalgebra::Vector3;

use crate::config::FitConfig;
use crate::conic::{Ellipse, FitError};
use crate::normalize::NormalizedCluster;
use crate::point::PlanarPoint;

/// Minimum number of distinct points determining a circle.
pub const MIN_CIRCLE_POINTS: usize = 3;

/// Fit a circle and return it as an ellipse with `a = b = r`, angle 0.
///
/// Fails with `InsufficientData` for fewer than 3 distinct points and with
/// `DegenerateGeometry` when the points are (nearly) collinear.
pub fn fit_circle_with<P: PlanarPoint>(
    points: &[P],
    config: &FitConfig,
) -> Result<Ellipse, FitError> {
    let result = NormalizedCluster::prepare(points, MIN_CIRCLE_POINTS)
        .and_then(|cluster| solve_normalized(&cluster, config));
    if let Err(err) = &result {
        tracing::debug!("circle fit rejected ({} points): {}", points.len(), err);
    }
    result
}

/// [`fit_circle_with`] using the default [`FitConfig`].
pub fn fit_circle<P: PlanarPoint>(points: &[P]) -> Result<Ellipse, FitError> {
    fit_circle_with(points, &FitConfig::default())
}

fn solve_normalized(cluster: &NormalizedCluster, config: &FitConfig) -> Result<Ellipse, FitError> {
    if cluster.linear_reciprocal_condition() < config.min_reciprocal_condition {
        return Err(FitError::DegenerateGeometry);
    }

    // Normal equations AᵀA u = Aᵀb with rows [x, y, 1] and b = x² + y².
    let ata = cluster.linear_scatter();
    let atb = cluster
        .points
        .iter()
        .fold(Vector3::zeros(), |acc, &[x, y]| {
            acc + Vector3::new(x, y, 1.0) * (x * x + y * y)
        });

    let u = ata
        .cholesky()
        .ok_or(FitError::DegenerateGeometry)?
        .solve(&atb);

    let cx = 0.5 * u[0];
    let cy = 0.5 * u[1];
    let r_sq = u[2] + cx * cx + cy * cy;
    if !r_sq.is_finite() || r_sq <= 0.0 {
        return Err(FitError::NumericalFailure);
    }

    let [cx, cy] = cluster.denormalize_point([cx, cy]);
    let r = cluster.denormalize_length(r_sq.sqrt());
    Ellipse::circle(cx, cy, r)
}
