//! Point representations consumed by the fitters.
//!
//! Upstream stages hand over boundary samples in several backings (integer
//! pixel positions, float homogeneous vectors). The fitters only need a 2D
//! position, and the divergence probe additionally needs a direction, so both
//! are exposed through small access traits instead of concrete types.

use nalgebra::{Scalar, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Scalar usable as the backing storage of a homogeneous point.
pub trait Coordinate: Scalar + Copy {
    /// Multiplicative identity, used as the default homogeneous weight.
    const ONE: Self;

    /// Widen to `f64` for the numeric core.
    fn to_f64(self) -> f64;
}

macro_rules! impl_coordinate {
    ($($t:ty => $one:expr),* $(,)?) => {
        $(
            impl Coordinate for $t {
                const ONE: Self = $one;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_coordinate!(i16 => 1, i32 => 1, f32 => 1.0, f64 => 1.0);

/// Anything with a planar position in working pixel coordinates.
pub trait PlanarPoint {
    /// Position `[x, y]`.
    fn xy(&self) -> [f64; 2];
}

/// Anything carrying a local direction (typically the image gradient).
pub trait GradientDirection {
    /// Direction `[dx, dy]`; not required to be unit length.
    fn direction(&self) -> [f64; 2];
}

impl PlanarPoint for [f64; 2] {
    #[inline]
    fn xy(&self) -> [f64; 2] {
        *self
    }
}

impl<P: PlanarPoint + ?Sized> PlanarPoint for &P {
    #[inline]
    fn xy(&self) -> [f64; 2] {
        (**self).xy()
    }
}

impl<P: GradientDirection + ?Sized> GradientDirection for &P {
    #[inline]
    fn direction(&self) -> [f64; 2] {
        (**self).direction()
    }
}

/// 2D point stored as a homogeneous 3-vector `(x, y, w)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2d<T: Coordinate> {
    coords: Vector3<T>,
}

impl<T: Coordinate> Point2d<T> {
    /// Point `(x, y)` with unit weight.
    pub fn new(x: T, y: T) -> Self {
        Self {
            coords: Vector3::new(x, y, T::ONE),
        }
    }

    /// Wrap an existing homogeneous vector.
    pub fn from_homogeneous(coords: Vector3<T>) -> Self {
        Self { coords }
    }

    /// Dehomogenized x. Infinite or NaN for points at infinity.
    pub fn x(&self) -> f64 {
        self.coords[0].to_f64() / self.coords[2].to_f64()
    }

    /// Dehomogenized y. Infinite or NaN for points at infinity.
    pub fn y(&self) -> f64 {
        self.coords[1].to_f64() / self.coords[2].to_f64()
    }
}

impl<T: Coordinate> PlanarPoint for Point2d<T> {
    #[inline]
    fn xy(&self) -> [f64; 2] {
        [self.x(), self.y()]
    }
}

impl<T: Coordinate> From<[T; 2]> for Point2d<T> {
    fn from([x, y]: [T; 2]) -> Self {
        Self::new(x, y)
    }
}

/// Boundary sample produced by edge detection: integer pixel position plus
/// the local image gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgePoint {
    /// Pixel column.
    pub x: i32,
    /// Pixel row.
    pub y: i32,
    /// Gradient x component.
    pub dx: f32,
    /// Gradient y component.
    pub dy: f32,
}

impl EdgePoint {
    pub fn new(x: i32, y: i32, dx: f32, dy: f32) -> Self {
        Self { x, y, dx, dy }
    }

    /// Position as a homogeneous integer point.
    pub fn position(&self) -> Point2d<i32> {
        Point2d::new(self.x, self.y)
    }

    /// Gradient vector.
    pub fn gradient(&self) -> Vector2<f32> {
        Vector2::new(self.dx, self.dy)
    }

    /// Gradient magnitude.
    pub fn gradient_norm(&self) -> f32 {
        self.dx.hypot(self.dy)
    }
}

impl PlanarPoint for EdgePoint {
    #[inline]
    fn xy(&self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }
}

impl GradientDirection for EdgePoint {
    #[inline]
    fn direction(&self) -> [f64; 2] {
        let g = self.gradient();
        [g.x as f64, g.y as f64]
    }
}

/// Copy positions out of any point collection.
pub fn collect_positions<P: PlanarPoint>(points: &[P]) -> Vec<[f64; 2]> {
    points.iter().map(|p| p.xy()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homogeneous_point_dehomogenizes() {
        let p = Point2d::from_homogeneous(Vector3::new(6.0f32, -4.0, 2.0));
        assert_eq!(p.xy(), [3.0, -2.0]);

        let q = Point2d::<i16>::new(12, 7);
        assert_eq!(q.xy(), [12.0, 7.0]);
    }

    #[test]
    fn point_at_infinity_is_not_finite() {
        let p = Point2d::from_homogeneous(Vector3::new(1.0f64, 1.0, 0.0));
        assert!(!p.x().is_finite());
    }

    #[test]
    fn edge_point_exposes_position_and_direction() {
        let e = EdgePoint::new(10, 20, 3.0, 4.0);
        assert_eq!(e.xy(), [10.0, 20.0]);
        assert_eq!(e.direction(), [3.0, 4.0]);
        assert_eq!(e.gradient_norm(), 5.0);
        assert_eq!(e.position().xy(), [10.0, 20.0]);

        let view: Vec<&EdgePoint> = vec![&e];
        assert_eq!(collect_positions(&view), vec![[10.0, 20.0]]);
    }
}
