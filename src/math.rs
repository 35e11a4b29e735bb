//! Math type aliases.
//!
//! Vector/matrix/quaternion algebra is an external collaborator of this kernel, not
//! something it reimplements: everything here is a thin alias over `nalgebra`, mirroring
//! the `math.rs` convention used throughout the `rapier3d`/`parry3d` stack this crate is
//! descended from.

use nalgebra::{Isometry3, Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};

/// The scalar type used throughout the kernel. A single-precision kernel is the
/// common case for interactive (30-240 Hz) simulation; swapping to `f64` only requires
/// changing this alias, exactly as `rapier3d-f64` is a near-identical crate to `rapier3d`.
pub type Real = f32;

pub type Vector = Vector3<Real>;
pub type Point = Point3<Real>;
pub type Matrix3x3 = Matrix3<Real>;
pub type Rotation = UnitQuaternion<Real>;
pub type Isometry = Isometry3<Real>;
pub type RawQuaternion = Quaternion<Real>;

/// Concatenates two isometries the way the spec's external interface defines it:
/// `concat(a, b)` applies `a` first, then `b`, i.e. `result = b * a`.
#[inline]
pub fn concat(a: &Isometry, b: &Isometry) -> Isometry {
    b * a
}

/// `v x` as the 3x3 skew-symmetric cross-product matrix, used to build the angular
/// part of contact and bone Jacobians (`J_ang = skew(r)` for a lever arm `r`).
#[inline]
pub fn skew(v: Vector) -> Matrix3x3 {
    Matrix3x3::new(
        0.0, -v.z, v.y, //
        v.z, 0.0, -v.x, //
        -v.y, v.x, 0.0,
    )
}

/// Inverts a symmetric 3x3 matrix, returning `None` if it is (numerically) singular.
/// Used by `SingleBoneConstraint::compute_effective_mass` and by the contact normal
/// effective-mass computation.
#[inline]
pub fn try_invert3(m: &Matrix3x3) -> Option<Matrix3x3> {
    m.try_inverse()
}

/// Builds an arbitrary orthonormal basis whose first axis is `normal` (must be unit
/// length). Used to derive the two friction tangent directions from a contact normal.
#[inline]
pub fn orthonormal_basis(normal: Vector) -> (Vector, Vector) {
    // Pick whichever world axis is least aligned with `normal` to avoid a degenerate
    // cross product, the same trick used by rapier's `orthonormal_vector`.
    let axis = if normal.x.abs() < 0.9 {
        Vector::x()
    } else {
        Vector::y()
    };
    let tangent1 = normal.cross(&axis).normalize();
    let tangent2 = normal.cross(&tangent1);
    (tangent1, tangent2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn orthonormal_basis_is_orthonormal() {
        let n = Vector::new(0.2, 0.9, 0.1).normalize();
        let (t1, t2) = orthonormal_basis(n);
        assert_relative_eq!(t1.dot(&n), 0.0, epsilon = 1e-5);
        assert_relative_eq!(t2.dot(&n), 0.0, epsilon = 1e-5);
        assert_relative_eq!(t1.dot(&t2), 0.0, epsilon = 1e-5);
        assert_relative_eq!(t1.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(t2.norm(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn concat_order() {
        let a = Isometry::translation(1.0, 0.0, 0.0);
        let b = Isometry::translation(0.0, 2.0, 0.0);
        let c = concat(&a, &b);
        // a then b: point at origin -> (1,0,0) -> (1,2,0).
        assert_relative_eq!(c.translation.vector, Vector::new(1.0, 2.0, 0.0), epsilon = 1e-6);
    }
}
