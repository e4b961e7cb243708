//! Tunable numeric thresholds for the fitters.

/// Acceptance thresholds shared by the circle and ellipse fitters.
///
/// All values act on normalized coordinates (centroid at the origin, mean
/// distance √2), so they do not depend on the pixel scale of the input.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Minimum ratio between the smallest and largest eigenvalue of the
    /// linear scatter matrix `Σ [x y 1]ᵀ[x y 1]`. Clusters below it are
    /// treated as collinear. The ratio is roughly `(spread across / spread
    /// along)²`, so the default rejects clusters thinner than about 1:100,
    /// including noisy straight segments.
    pub min_reciprocal_condition: f64,
    /// The quadratic-part normalized discriminant `(B² − 4AC)` must be below
    /// `-discriminant_tolerance` for the conic to count as an ellipse.
    pub discriminant_tolerance: f64,
    /// Maximum accepted `a / b`.
    pub max_axis_ratio: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_reciprocal_condition: 1e-4,
            discriminant_tolerance: 1e-9,
            max_axis_ratio: 1e4,
        }
    }
}
