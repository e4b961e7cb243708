//! Core conic and ellipse types with conversions.

use nalgebra::{Matrix2, Matrix3, Vector3};

use crate::config::FitConfig;

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors that can occur during circle/ellipse fitting.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// Too few (distinct) points for the requested operation.
    InsufficientData {
        /// Required minimum number of points.
        needed: usize,
        /// Provided number of usable points.
        got: usize,
    },
    /// Points are collinear or coincident; the linear system is singular.
    DegenerateGeometry,
    /// The fitted conic is a hyperbola or parabola.
    NonEllipticConic,
    /// A solve or decomposition produced no usable / finite result.
    NumericalFailure,
    /// An input point has a non-finite position (e.g. homogeneous w = 0).
    NonFinitePoint {
        /// Index of the offending point in the input slice.
        index: usize,
    },
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientData { needed, got } => {
                write!(f, "insufficient data: need {} points, got {}", needed, got)
            }
            Self::DegenerateGeometry => write!(f, "degenerate geometry: points are collinear"),
            Self::NonEllipticConic => write!(f, "fitted conic is not an ellipse"),
            Self::NumericalFailure => write!(f, "numerical failure during fit"),
            Self::NonFinitePoint { index } => {
                write!(f, "point {} has a non-finite position", index)
            }
        }
    }
}

impl std::error::Error for FitError {}

// ── Types ──────────────────────────────────────────────────────────────────

/// General conic: A x² + B xy + C y² + D x + E y + F = 0
/// Stored as [A, B, C, D, E, F].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConicCoeffs(pub [f64; 6]);

/// 2D conic in homogeneous image coordinates: `x^T Q x = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conic2D {
    /// Symmetric conic matrix `Q` such that `x^T Q x = 0`.
    pub mat: Matrix3<f64>,
}

impl Conic2D {
    /// Build from general quadratic coefficients:
    /// `A x^2 + B xy + C y^2 + D x + E y + F = 0`.
    pub fn from_quadratic_coeffs(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            mat: Matrix3::new(
                a,
                b * 0.5,
                d * 0.5,
                b * 0.5,
                c,
                e * 0.5,
                d * 0.5,
                e * 0.5,
                f,
            ),
        }
    }

    /// Build from conic coefficients.
    pub fn from_coeffs(c: &ConicCoeffs) -> Self {
        let [a, b, cc, d, e, f] = c.0;
        Self::from_quadratic_coeffs(a, b, cc, d, e, f)
    }

    /// Read back the six coefficients.
    pub fn coeffs(&self) -> ConicCoeffs {
        let m = &self.mat;
        ConicCoeffs([
            m[(0, 0)],
            m[(0, 1)] * 2.0,
            m[(1, 1)],
            m[(0, 2)] * 2.0,
            m[(1, 2)] * 2.0,
            m[(2, 2)],
        ])
    }

    /// Evaluate `xᵀ Q x` at the Euclidean point (x, y).
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let p = Vector3::new(x, y, 1.0);
        p.dot(&(self.mat * p))
    }
}

// ── Conic normalization ────────────────────────────────────────────────────

impl ConicCoeffs {
    /// Normalize conic coefficients so that A + C = 1 (trace of quadratic part).
    /// This makes the algebraic distance comparable across different conics.
    /// Returns `None` if A + C ≈ 0 (degenerate / hyperbola-like).
    pub fn normalized(&self) -> Option<Self> {
        let [a, b, c, d, e, f] = self.0;
        let trace = a + c;
        if trace.abs() < 1e-15 {
            return None;
        }
        let s = 1.0 / trace;
        Some(Self([a * s, b * s, c * s, d * s, e * s, f * s]))
    }

    /// Scale so the largest quadratic coefficient (A, B, C) has magnitude 1.
    /// Returns `None` when the quadratic part vanishes (a line, not a conic).
    fn unit_quadratic(&self) -> Option<Self> {
        let m = self.0[..3].iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        if !m.is_finite() || m <= f64::MIN_POSITIVE {
            return None;
        }
        Some(Self(self.0.map(|v| v / m)))
    }

    /// Algebraic distance of a point (x, y) to this conic.
    pub fn algebraic_distance(&self, x: f64, y: f64) -> f64 {
        let [a, b, c, d, e, f] = self.0;
        a * x * x + b * x * y + c * y * y + d * x + e * y + f
    }

    /// Check whether the conic represents an ellipse (discriminant B²−4AC < 0).
    pub fn is_ellipse(&self) -> bool {
        let [a, b, c, ..] = self.0;
        b * b - 4.0 * a * c < 0.0
    }

    /// Convert to geometric ellipse parameters with default tolerances.
    pub fn to_ellipse(self) -> Result<Ellipse, FitError> {
        conic_to_ellipse(&self, &FitConfig::default())
    }
}

// ── Ellipse ────────────────────────────────────────────────────────────────

/// Geometric ellipse with its matrix form kept in sync.
///
/// Always canonical: `a >= b > 0`, all values finite, `angle` is the
/// orientation of the major axis from +x in (−π/2, π/2]. Construct through
/// [`Ellipse::new`] or [`Ellipse::circle`], which enforce this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    cx: f64,
    cy: f64,
    a: f64,
    b: f64,
    angle: f64,
    conic: Conic2D,
}

impl Ellipse {
    /// Build from center, semi-axes and rotation.
    ///
    /// Axes may be passed in either order; they are swapped (and the angle
    /// rotated by π/2) so that `a >= b`.
    pub fn new(cx: f64, cy: f64, a: f64, b: f64, angle: f64) -> Result<Self, FitError> {
        let finite = [cx, cy, a, b, angle].iter().all(|v| v.is_finite());
        if !finite || a <= 0.0 || b <= 0.0 {
            return Err(FitError::NumericalFailure);
        }
        let (a, b, angle) = if a >= b {
            (a, b, angle)
        } else {
            (b, a, angle + std::f64::consts::FRAC_PI_2)
        };
        let angle = normalize_angle(angle);
        let conic = Conic2D::from_coeffs(&ellipse_coeffs(cx, cy, a, b, angle));
        Ok(Self {
            cx,
            cy,
            a,
            b,
            angle,
            conic,
        })
    }

    /// Circle of radius `r` as a degenerate ellipse (`a = b = r`, angle 0).
    pub fn circle(cx: f64, cy: f64, r: f64) -> Result<Self, FitError> {
        Self::new(cx, cy, r, r, 0.0)
    }

    /// Center x.
    pub fn cx(&self) -> f64 {
        self.cx
    }

    /// Center y.
    pub fn cy(&self) -> f64 {
        self.cy
    }

    pub fn center(&self) -> [f64; 2] {
        [self.cx, self.cy]
    }

    /// Semi-major axis length.
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Semi-minor axis length.
    pub fn b(&self) -> f64 {
        self.b
    }

    /// Major-axis angle from +x, radians in (−π/2, π/2].
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Symmetric matrix form. Negative inside, zero on the boundary.
    pub fn conic(&self) -> &Conic2D {
        &self.conic
    }

    /// Conic coefficients of the boundary.
    pub fn to_conic(&self) -> ConicCoeffs {
        self.conic.coeffs()
    }

    /// Aspect ratio a/b (>= 1).
    pub fn aspect_ratio(&self) -> f64 {
        self.a / self.b
    }

    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.a * self.b
    }

    /// Whether (x, y) lies inside or on the ellipse.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.conic.eval(x, y) <= 0.0
    }

    /// Axis-aligned bounding box `[x_min, y_min, x_max, y_max]`.
    pub fn bounding_box(&self) -> [f64; 4] {
        let (s, c) = self.angle.sin_cos();
        let hw = ((self.a * c).powi(2) + (self.b * s).powi(2)).sqrt();
        let hh = ((self.a * s).powi(2) + (self.b * c).powi(2)).sqrt();
        [self.cx - hw, self.cy - hh, self.cx + hw, self.cy + hh]
    }

    /// Sample `n` points on the ellipse boundary.
    pub fn sample_points(&self, n: usize) -> Vec<[f64; 2]> {
        let cos_a = self.angle.cos();
        let sin_a = self.angle.sin();
        (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * (i as f64) / (n as f64);
                let px = self.a * t.cos();
                let py = self.b * t.sin();
                let x = self.cx + cos_a * px - sin_a * py;
                let y = self.cy + sin_a * px + cos_a * py;
                [x, y]
            })
            .collect()
    }

    /// Algebraic residual of (x, y) against the stored conic.
    pub fn algebraic_distance(&self, x: f64, y: f64) -> f64 {
        self.conic.eval(x, y)
    }

    /// Approximate geometric distance from a point to the ellipse boundary.
    /// Uses the algebraic distance divided by the gradient magnitude as a
    /// first-order approximation (Sampson distance).
    pub fn sampson_distance(&self, x: f64, y: f64) -> f64 {
        let [ca, cb, cc, cd, ce, _cf] = self.to_conic().0;
        let alg = self.conic.eval(x, y);
        let gx = 2.0 * ca * x + cb * y + cd;
        let gy = cb * x + 2.0 * cc * y + ce;
        let grad_mag_sq = gx * gx + gy * gy;
        if grad_mag_sq < 1e-30 {
            return alg.abs();
        }
        alg.abs() / grad_mag_sq.sqrt()
    }

    /// Map through `p ↦ s·R(θ)·p + t`.
    pub fn similarity_transformed(
        &self,
        scale: f64,
        rotation: f64,
        translation: [f64; 2],
    ) -> Result<Self, FitError> {
        let (s, c) = rotation.sin_cos();
        let cx = scale * (c * self.cx - s * self.cy) + translation[0];
        let cy = scale * (s * self.cx + c * self.cy) + translation[1];
        Self::new(
            cx,
            cy,
            self.a * scale.abs(),
            self.b * scale.abs(),
            self.angle + rotation,
        )
    }
}

// ── Conversion: conic ↔ ellipse ────────────────────────────────────────────

/// Convert general conic coefficients to geometric ellipse parameters.
///
/// The general conic is A x² + B xy + C y² + D x + E y + F = 0. The center
/// solves ∇ = 0, the semi-axes come from the eigenvalues of the quadratic
/// part and the value of the conic at the center.
///
/// Coefficients are first scaled so the quadratic part has unit max
/// magnitude, which makes the discriminant tolerance in `config` independent
/// of the conic's arbitrary scale and of where it sits in the image.
pub fn conic_to_ellipse(coeffs: &ConicCoeffs, config: &FitConfig) -> Result<Ellipse, FitError> {
    if coeffs.0.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NumericalFailure);
    }
    let unit = coeffs.unit_quadratic().ok_or(FitError::NonEllipticConic)?;
    let [a, b, c, d, e, f] = unit.0;

    // Discriminant check: must be an ellipse
    let disc = b * b - 4.0 * a * c;
    if disc >= -config.discriminant_tolerance {
        return Err(FitError::NonEllipticConic);
    }

    // Center by solving the 2x2 system:
    //   2A·cx + B·cy + D = 0
    //   B·cx + 2C·cy + E = 0
    let denom = 4.0 * a * c - b * b; // = -disc > 0
    let cx = (b * e - 2.0 * c * d) / denom;
    let cy = (b * d - 2.0 * a * e) / denom;

    // Eigen-decomposition of the quadratic part [[A, B/2], [B/2, C]].
    let quad = Matrix2::new(a, b * 0.5, b * 0.5, c);
    let eig = quad.symmetric_eigen();
    let (i_major_dir, i_other) = if eig.eigenvalues[0] >= eig.eigenvalues[1] {
        (0, 1)
    } else {
        (1, 0)
    };
    let lambda1 = eig.eigenvalues[i_major_dir];
    let lambda2 = eig.eigenvalues[i_other];
    let v1 = eig.eigenvectors.column(i_major_dir);

    // F' = value of the conic at the center
    let f_prime = a * cx * cx + b * cx * cy + c * cy * cy + d * cx + e * cy + f;
    if !f_prime.is_finite() || f_prime.abs() < 1e-15 {
        return Err(FitError::NumericalFailure);
    }

    // lambda1 is the larger eigenvalue; its axis gets semi-length
    // sqrt(-F'/lambda1). Both squares are positive only for a real ellipse.
    let a_sq = -f_prime / lambda1;
    let b_sq = -f_prime / lambda2;
    if !(a_sq > 0.0 && b_sq > 0.0) {
        return Err(FitError::NumericalFailure);
    }

    let angle = v1[1].atan2(v1[0]);
    let ellipse = Ellipse::new(cx, cy, a_sq.sqrt(), b_sq.sqrt(), angle)?;
    if ellipse.aspect_ratio() > config.max_axis_ratio {
        return Err(FitError::NumericalFailure);
    }
    Ok(ellipse)
}

/// Convert geometric ellipse parameters to general conic coefficients.
///
/// The result is scaled so that it evaluates to −1 at the center.
pub fn ellipse_to_conic(e: &Ellipse) -> ConicCoeffs {
    ellipse_coeffs(e.cx, e.cy, e.a, e.b, e.angle)
}

fn ellipse_coeffs(cx: f64, cy: f64, a: f64, b: f64, angle: f64) -> ConicCoeffs {
    let cos_a = angle.cos();
    let sin_a = angle.sin();
    let a2 = a * a;
    let b2 = b * b;

    let ca = cos_a * cos_a / a2 + sin_a * sin_a / b2;
    let cb = 2.0 * cos_a * sin_a * (1.0 / a2 - 1.0 / b2);
    let cc = sin_a * sin_a / a2 + cos_a * cos_a / b2;
    let cd = -2.0 * ca * cx - cb * cy;
    let ce = -cb * cx - 2.0 * cc * cy;
    let cf = ca * cx * cx + cb * cx * cy + cc * cy * cy - 1.0;

    ConicCoeffs([ca, cb, cc, cd, ce, cf])
}

/// Normalize angle to (−π/2, π/2].
pub(crate) fn normalize_angle(angle: f64) -> f64 {
    let r = angle.rem_euclid(std::f64::consts::PI);
    if r > std::f64::consts::FRAC_PI_2 {
        r - std::f64::consts::PI
    } else {
        r
    }
}
