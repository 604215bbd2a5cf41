//! Small numeric helpers shared by the mesh and the analysis passes.
//!
//! Vectors and points come from `nalgebra`. The helpers here pin down the
//! tolerance conventions: "zero" means within [`EPSILON`], normalizing a
//! near-zero vector yields the zero vector instead of NaNs, and angles are
//! computed with a clamped `acos`.

use nalgebra::{Point3, Vector3};

/// Tolerance used by every near-zero test.
pub const EPSILON: f64 = 1e-6;

/// Whether `value` is zero within [`EPSILON`].
#[inline]
pub fn is_zero(value: f64) -> bool {
    value.abs() <= EPSILON
}

/// Whether every component of `v` is zero within [`EPSILON`].
#[inline]
pub fn is_zero_vector(v: &Vector3<f64>) -> bool {
    is_zero(v.x) && is_zero(v.y) && is_zero(v.z)
}

/// Normalize `v`, returning the zero vector when its length is near zero.
#[inline]
pub fn normalize_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(EPSILON).unwrap_or_else(Vector3::zeros)
}

/// Angle between two vectors in radians, in `[0, π]`.
///
/// A zero-length input is treated as perpendicular to everything.
#[inline]
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let dot = normalize_or_zero(a).dot(&normalize_or_zero(b));
    dot.clamp(-1.0, 1.0).acos()
}

/// Unit normal of the triangle `(a, b, c)` with counter-clockwise winding.
///
/// Degenerate triangles yield the zero vector.
#[inline]
pub fn triangle_normal(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Vector3<f64> {
    normalize_or_zero(&(b - a).cross(&(c - a)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_normalize_or_zero() {
        let n = normalize_or_zero(&Vector3::new(3.0, 0.0, 4.0));
        assert!((n.norm() - 1.0).abs() < 1e-12);
        assert_eq!(normalize_or_zero(&Vector3::new(1e-9, 0.0, 0.0)), Vector3::zeros());
    }

    #[test]
    fn test_angle_between() {
        let x = Vector3::x();
        let y = Vector3::y();
        assert!((angle_between(&x, &y) - FRAC_PI_2).abs() < 1e-12);
        assert!((angle_between(&x, &-x) - PI).abs() < 1e-12);
        assert!(angle_between(&x, &(x * 5.0)).abs() < 1e-6);
        assert!((angle_between(&x, &Vector3::zeros()) - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_triangle_normal() {
        let n = triangle_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        );
        assert!((n - Vector3::z()).norm() < 1e-12);

        let collinear = triangle_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
        );
        assert!(is_zero_vector(&collinear));
    }
}
