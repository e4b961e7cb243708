//! Input validation and similarity normalization of point clusters.

use nalgebra::{Matrix3, Vector3};

use crate::conic::FitError;
use crate::point::PlanarPoint;

/// A point cluster translated to its centroid and scaled so the mean
/// distance from the centroid is √2.
#[derive(Debug, Clone)]
pub(crate) struct NormalizedCluster {
    /// Normalized coordinates, in input order.
    pub points: Vec<[f64; 2]>,
    /// Centroid of the input points.
    pub mean: [f64; 2],
    /// Multiplier applied after centering.
    pub scale: f64,
}

impl NormalizedCluster {
    /// Validate and normalize a cluster.
    ///
    /// Fails with `NonFinitePoint` on the first non-finite position and with
    /// `InsufficientData` when fewer than `min_distinct` distinct positions
    /// are present.
    pub fn prepare<P: PlanarPoint>(points: &[P], min_distinct: usize) -> Result<Self, FitError> {
        let mut raw = Vec::with_capacity(points.len());
        for (index, p) in points.iter().enumerate() {
            let [x, y] = p.xy();
            if !x.is_finite() || !y.is_finite() {
                return Err(FitError::NonFinitePoint { index });
            }
            raw.push([x, y]);
        }

        let distinct = count_distinct(&raw);
        if distinct < min_distinct {
            return Err(FitError::InsufficientData {
                needed: min_distinct,
                got: distinct,
            });
        }

        let (mean, scale) = normalization_params(&raw);
        let normalized = raw
            .iter()
            .map(|&[x, y]| [(x - mean[0]) * scale, (y - mean[1]) * scale])
            .collect();

        Ok(Self {
            points: normalized,
            mean,
            scale,
        })
    }

    /// Map a normalized position back to input coordinates.
    pub fn denormalize_point(&self, [x, y]: [f64; 2]) -> [f64; 2] {
        [x / self.scale + self.mean[0], y / self.scale + self.mean[1]]
    }

    /// Map a normalized length back to input units.
    pub fn denormalize_length(&self, len: f64) -> f64 {
        len / self.scale
    }

    /// Scatter matrix `Σ [x y 1]ᵀ[x y 1]` of the normalized points.
    pub fn linear_scatter(&self) -> Matrix3<f64> {
        self.points
            .iter()
            .fold(Matrix3::zeros(), |acc, &[x, y]| {
                let row = Vector3::new(x, y, 1.0);
                acc + row * row.transpose()
            })
    }

    /// Ratio of smallest to largest eigenvalue of [`Self::linear_scatter`].
    ///
    /// Zero for exactly collinear clusters.
    pub fn linear_reciprocal_condition(&self) -> f64 {
        let eig = self.linear_scatter().symmetric_eigen();
        let max = eig.eigenvalues.max();
        let min = eig.eigenvalues.min().max(0.0);
        if !max.is_finite() || max <= 0.0 {
            return 0.0;
        }
        min / max
    }
}

/// Compute normalization parameters for a point set.
/// Returns (mean, scale).
fn normalization_params(points: &[[f64; 2]]) -> ([f64; 2], f64) {
    let n = points.len() as f64;
    let mean_x: f64 = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y: f64 = points.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist: f64 = points
        .iter()
        .map(|p| (p[0] - mean_x).hypot(p[1] - mean_y))
        .sum::<f64>()
        / n;

    let scale = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    ([mean_x, mean_y], scale)
}

fn count_distinct(points: &[[f64; 2]]) -> usize {
    let mut sorted = points.to_vec();
    sorted.sort_by(|p, q| p[0].total_cmp(&q[0]).then(p[1].total_cmp(&q[1])));
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalized_cluster_has_unit_scale() {
        let pts: Vec<[f64; 2]> = (0..8)
            .map(|i| {
                let t = i as f64 * std::f64::consts::FRAC_PI_4;
                [500.0 + 40.0 * t.cos(), 300.0 + 40.0 * t.sin()]
            })
            .collect();
        let cluster = NormalizedCluster::prepare(&pts, 3).unwrap();

        assert_relative_eq!(cluster.mean[0], 500.0, epsilon = 1e-9);
        assert_relative_eq!(cluster.mean[1], 300.0, epsilon = 1e-9);
        let mean_dist: f64 =
            cluster.points.iter().map(|p| p[0].hypot(p[1])).sum::<f64>() / pts.len() as f64;
        assert_relative_eq!(mean_dist, std::f64::consts::SQRT_2, epsilon = 1e-12);

        let back = cluster.denormalize_point(cluster.points[3]);
        assert_relative_eq!(back[0], pts[3][0], epsilon = 1e-9);
        assert_relative_eq!(back[1], pts[3][1], epsilon = 1e-9);
    }

    #[test]
    fn duplicates_do_not_count_towards_minimum() {
        let pts = vec![[1.0, 1.0], [1.0, 1.0], [2.0, 3.0], [2.0, 3.0], [5.0, 0.0]];
        let err = NormalizedCluster::prepare(&pts, 5).unwrap_err();
        assert_eq!(err, FitError::InsufficientData { needed: 5, got: 3 });
    }

    #[test]
    fn non_finite_point_is_reported_by_index() {
        let pts = vec![[0.0, 0.0], [1.0, f64::NAN], [2.0, 2.0]];
        let err = NormalizedCluster::prepare(&pts, 2).unwrap_err();
        assert_eq!(err, FitError::NonFinitePoint { index: 1 });
    }

    #[test]
    fn collinear_cluster_has_zero_condition() {
        let pts: Vec<[f64; 2]> = (0..10).map(|i| [i as f64 * 3.0, 7.0 - i as f64]).collect();
        let cluster = NormalizedCluster::prepare(&pts, 3).unwrap();
        assert!(cluster.linear_reciprocal_condition() < 1e-12);

        let spread = vec![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]];
        let cluster = NormalizedCluster::prepare(&spread, 3).unwrap();
        assert!(cluster.linear_reciprocal_condition() > 0.1);
    }
}
