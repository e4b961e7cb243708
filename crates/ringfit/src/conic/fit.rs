//! Direct least-squares ellipse fitting (Fitzgibbon et al., 1999).

use nalgebra::{DMatrix, Matrix3};

use super::eigen::solve_gep_3x3;
use super::types::{conic_to_ellipse, ConicCoeffs, Ellipse, FitError};
use crate::config::FitConfig;
use crate::normalize::NormalizedCluster;
use crate::point::{collect_positions, EdgePoint, PlanarPoint};

/// Minimum number of distinct points determining a conic.
pub const MIN_ELLIPSE_POINTS: usize = 5;

/// Fit an ellipse to a set of 2D points using the direct least-squares method
/// of Fitzgibbon et al. (1999).
///
/// Points are normalized (centroid, mean distance √2) before building the
/// design matrix; the conic is converted to geometric form in normalized
/// coordinates and the resulting center and semi-axes are mapped back.
///
/// The constraint `4AC − B² = 1` makes every solution an ellipse, so points
/// from a hyperbola or parabola still yield the closest ellipse. Judge such
/// fits by their residual ([`rms_sampson_distance`]) relative to `b`.
///
/// Fails with
/// - `InsufficientData` for fewer than 5 distinct points,
/// - `DegenerateGeometry` when the points are (nearly) collinear,
/// - `NonEllipticConic` only when rounding leaves no eigenvector satisfying
///   the constraint or the discriminant check,
/// - `NumericalFailure` when a solve or the geometric conversion breaks down.
pub fn fit_ellipse_with<P: PlanarPoint>(
    points: &[P],
    config: &FitConfig,
) -> Result<Ellipse, FitError> {
    let result = NormalizedCluster::prepare(points, MIN_ELLIPSE_POINTS).and_then(|cluster| {
        let coeffs = fit_normalized_conic(&cluster, config)?;
        let local = conic_to_ellipse(&coeffs, config)?;
        let [cx, cy] = cluster.denormalize_point(local.center());
        Ellipse::new(
            cx,
            cy,
            cluster.denormalize_length(local.a()),
            cluster.denormalize_length(local.b()),
            local.angle(),
        )
    });
    if let Err(err) = &result {
        tracing::debug!("ellipse fit rejected ({} points): {}", points.len(), err);
    }
    result
}

/// [`fit_ellipse_with`] using the default [`FitConfig`].
pub fn fit_ellipse<P: PlanarPoint>(points: &[P]) -> Result<Ellipse, FitError> {
    fit_ellipse_with(points, &FitConfig::default())
}

/// Fit an ellipse to a borrowed view of edge points.
///
/// Only positions take part in the fit; gradients are ignored.
pub fn fit_ellipse_edges(points: &[&EdgePoint], config: &FitConfig) -> Result<Ellipse, FitError> {
    fit_ellipse_with(&collect_positions(points), config)
}

/// Fit conic coefficients in the cluster's normalized frame.
fn fit_normalized_conic(
    cluster: &NormalizedCluster,
    config: &FitConfig,
) -> Result<ConicCoeffs, FitError> {
    if cluster.linear_reciprocal_condition() < config.min_reciprocal_condition {
        return Err(FitError::DegenerateGeometry);
    }

    let n = cluster.points.len();

    // Build the design matrix D = [x², xy, y², x, y, 1]
    let mut d = DMatrix::<f64>::zeros(n, 6);
    for (i, &[x, y]) in cluster.points.iter().enumerate() {
        d[(i, 0)] = x * x;
        d[(i, 1)] = x * y;
        d[(i, 2)] = y * y;
        d[(i, 3)] = x;
        d[(i, 4)] = y;
        d[(i, 5)] = 1.0;
    }

    // Scatter matrix S = Dᵀ D
    let s = d.transpose() * &d;

    // Partition S into 3x3 blocks:
    //   S = [S11  S12]
    //       [S21  S22]
    let s11 = s.fixed_view::<3, 3>(0, 0).into_owned();
    let s12 = s.fixed_view::<3, 3>(0, 3).into_owned();
    let s22 = s.fixed_view::<3, 3>(3, 3).into_owned();

    // Constraint matrix for the ellipse condition: 4AC − B² > 0
    //   C1 = [[0, 0, 2], [0, -1, 0], [2, 0, 0]]
    let c1 = Matrix3::new(0.0, 0.0, 2.0, 0.0, -1.0, 0.0, 2.0, 0.0, 0.0);

    // Solve the reduced eigensystem:
    //   (S11 − S12 S22⁻¹ S21) a1 = λ C1 a1
    // which becomes: C1⁻¹ M a1 = λ a1
    let s22_inv = s22.try_inverse().ok_or(FitError::DegenerateGeometry)?;
    let m = s11 - s12 * s22_inv * s12.transpose();
    let c1_inv = c1.try_inverse().ok_or(FitError::NumericalFailure)?;
    let system = c1_inv * m;

    let a1 = solve_gep_3x3(&system).ok_or(FitError::NonEllipticConic)?;
    let a2 = -s22_inv * s12.transpose() * a1;

    let coeffs = ConicCoeffs([a1[0], a1[1], a1[2], a2[0], a2[1], a2[2]]);
    if coeffs.0.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NumericalFailure);
    }
    if !coeffs.is_ellipse() {
        return Err(FitError::NonEllipticConic);
    }
    tracing::trace!("normalized conic {:?}", coeffs.0);
    Ok(coeffs)
}

/// Compute RMS Sampson distance of points to an ellipse.
pub fn rms_sampson_distance<P: PlanarPoint>(ellipse: &Ellipse, points: &[P]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = points
        .iter()
        .map(|p| {
            let [x, y] = p.xy();
            let d = ellipse.sampson_distance(x, y);
            d * d
        })
        .sum();
    (sum_sq / points.len() as f64).sqrt()
}
