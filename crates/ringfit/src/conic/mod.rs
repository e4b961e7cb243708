//! Ellipse / conic fitting primitives.
//!
//! Implements:
//! - Direct least-squares conic fit (Fitzgibbon et al., "Direct Least Square Fitting of Ellipses", 1999).
//! - Conversion between general conic coefficients and geometric ellipse parameters.
//! - Algebraic and Sampson residual computation.

mod eigen;
mod fit;
mod types;

pub use fit::{
    fit_ellipse, fit_ellipse_edges, fit_ellipse_with, rms_sampson_distance, MIN_ELLIPSE_POINTS,
};
pub use types::{conic_to_ellipse, ellipse_to_conic, Conic2D, ConicCoeffs, Ellipse, FitError};
