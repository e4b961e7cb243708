//! ringfit: circle and ellipse fitting for ring-marker boundary clusters.
//!
//! Consumes clusters of boundary points produced by edge detection and
//! returns the best-fit conic, or rejects clusters that are too small,
//! collinear or otherwise unfit:
//!
//! 1. **Divergence probe** – checks the angular spread of gradient
//!    directions before committing to a fit.
//! 2. **Circle** – algebraic least-squares circle (3 parameters).
//! 3. **Conic** – direct least-squares ellipse fit with the conversion from
//!    conic coefficients to center / semi-axes / angle.
//!
//! All routines are pure functions over borrowed input; concurrent calls on
//! independent clusters do not interact.

mod circle;
mod config;
mod conic;
mod divergence;
mod normalize;
mod point;

pub use circle::{fit_circle, fit_circle_with, MIN_CIRCLE_POINTS};
pub use config::FitConfig;
pub use conic::{
    conic_to_ellipse, ellipse_to_conic, fit_ellipse, fit_ellipse_edges, fit_ellipse_with,
    rms_sampson_distance, Conic2D, ConicCoeffs, Ellipse, FitError, MIN_ELLIPSE_POINTS,
};
pub use divergence::{find_most_divergent_pair, DivergentPair};
pub use point::{collect_positions, Coordinate, EdgePoint, GradientDirection, PlanarPoint, Point2d};

/// Ellipse parameters for serialization (center + geometry).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EllipseParams {
    /// Center (x, y) in working pixel coordinates.
    pub center_xy: [f64; 2],
    /// Semi-axes [a, b], a >= b.
    pub semi_axes: [f64; 2],
    /// Rotation angle of the major axis in radians.
    pub angle: f64,
}

impl From<Ellipse> for EllipseParams {
    fn from(e: Ellipse) -> Self {
        Self::from(&e)
    }
}

impl From<&Ellipse> for EllipseParams {
    fn from(e: &Ellipse) -> Self {
        Self {
            center_xy: e.center(),
            semi_axes: [e.a(), e.b()],
            angle: e.angle(),
        }
    }
}

impl TryFrom<EllipseParams> for Ellipse {
    type Error = FitError;

    fn try_from(p: EllipseParams) -> Result<Self, Self::Error> {
        Self::try_from(&p)
    }
}

impl TryFrom<&EllipseParams> for Ellipse {
    type Error = FitError;

    fn try_from(p: &EllipseParams) -> Result<Self, Self::Error> {
        Ellipse::new(
            p.center_xy[0],
            p.center_xy[1],
            p.semi_axes[0].abs(),
            p.semi_axes[1].abs(),
            p.angle,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ellipse_params_json_roundtrip() {
        let e = Ellipse::new(10.0, -4.0, 3.0, 7.0, 0.25).unwrap();
        let json = serde_json::to_string(&EllipseParams::from(&e)).unwrap();
        let params: EllipseParams = serde_json::from_str(&json).unwrap();
        let back = Ellipse::try_from(params).unwrap();

        // canonicalized on construction: axes swapped, angle rotated
        assert_eq!(back.a(), 7.0);
        assert_eq!(back.b(), 3.0);
        assert_relative_eq!(back.angle(), 0.25 - std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(back.angle(), e.angle(), epsilon = 1e-15);
        assert_eq!(back.center(), e.center());
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = EllipseParams {
            center_xy: [0.0, 0.0],
            semi_axes: [5.0, 0.0],
            angle: 0.0,
        };
        assert_eq!(Ellipse::try_from(params), Err(FitError::NumericalFailure));
    }
}
