//! `SingleBoneConstraint`: one articulated/IK bone pinned toward a target position
//! and orientation (spec §3, §4.E). The sole non-contact constraint variant in the
//! tagged union.

use crate::body::RigidBodyHandle;
use crate::math::{try_invert3, Matrix3x3, Real, Vector};

/// Linear + angular jacobians, effective mass, softness/error-correction knobs, and
/// the accumulated impulse a single bone constraint carries across steps.
pub struct SingleBoneConstraint {
    pub bone: RigidBodyHandle,
    pub linear_jacobian: Matrix3x3,
    pub angular_jacobian: Matrix3x3,
    pub linear_error: Vector,
    pub angular_error: Vector,
    pub softness: Real,
    pub error_correction_factor: Real,
    pub max_impulse: Real,
    pub accumulated_impulse: Vector,
    effective_mass: Matrix3x3,
    velocity_bias: Vector,
}

impl SingleBoneConstraint {
    pub fn new(bone: RigidBodyHandle, linear_jacobian: Matrix3x3, angular_jacobian: Matrix3x3, softness: Real, error_correction_factor: Real, max_impulse: Real) -> Self {
        Self {
            bone,
            linear_jacobian,
            angular_jacobian,
            linear_error: Vector::zeros(),
            angular_error: Vector::zeros(),
            softness,
            error_correction_factor,
            max_impulse,
            accumulated_impulse: Vector::zeros(),
            effective_mass: Matrix3x3::identity(),
            velocity_bias: Vector::zeros(),
        }
    }

    /// `E = (Jl * m^-1 * Jl^T) + (Ja * I^-1 * Ja^T) + softness * I`, then `E <- E^-1`
    /// (spec §4.E). Also computes the Baumgarte velocity bias from the current
    /// position errors.
    pub fn prepare(&mut self, inv_mass: Real, inv_inertia: &Matrix3x3) {
        let linear_term = self.linear_jacobian * (self.linear_jacobian.transpose() * inv_mass);
        let angular_term = self.angular_jacobian * inv_inertia * self.angular_jacobian.transpose();
        let raw = linear_term + angular_term + Matrix3x3::identity() * self.softness;
        self.effective_mass = try_invert3(&raw).unwrap_or(Matrix3x3::zeros());

        self.velocity_bias = self.linear_jacobian * (self.linear_error * self.error_correction_factor)
            + self.angular_jacobian * (self.angular_error * self.error_correction_factor);
    }

    pub fn warm_start(&self, linvel: &mut Vector, angvel: &mut Vector, inv_mass: Real, inv_inertia: &Matrix3x3) {
        *linvel += self.linear_jacobian.transpose() * self.accumulated_impulse * inv_mass;
        *angvel += inv_inertia * (self.angular_jacobian.transpose() * self.accumulated_impulse);
    }

    /// One Gauss-Seidel sweep. The clamp uses the algebraically correct rescale
    /// `lambda' * (maxImpulse / |lambda'|)` rather than the source's inconsistent
    /// `sqrt(|lambda|^2) * maxImpulse` expression (spec §9 Open Question — treated as
    /// an engine bug, not intended behavior).
    pub fn solve_velocity(&mut self, linvel: &mut Vector, angvel: &mut Vector, inv_mass: Real, inv_inertia: &Matrix3x3) {
        let v_err = self.linear_jacobian * *linvel + self.angular_jacobian * *angvel - self.velocity_bias + self.accumulated_impulse * self.softness;
        let delta = -(self.effective_mass * v_err);

        let mut tentative = self.accumulated_impulse + delta;
        let mag_sq = tentative.norm_squared();
        if mag_sq > self.max_impulse * self.max_impulse && mag_sq > Real::EPSILON {
            tentative *= self.max_impulse / mag_sq.sqrt();
        }
        let applied = tentative - self.accumulated_impulse;
        self.accumulated_impulse = tentative;

        *linvel += self.linear_jacobian.transpose() * applied * inv_mass;
        *angvel += inv_inertia * (self.angular_jacobian.transpose() * applied);
    }

    pub fn clear_accumulated_impulse(&mut self) {
        self.accumulated_impulse = Vector::zeros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_never_exceeds_max_impulse() {
        let mut c = SingleBoneConstraint::new(
            RigidBodyHandle::default(),
            Matrix3x3::identity(),
            Matrix3x3::identity(),
            0.0,
            0.2,
            1.0,
        );
        c.linear_error = Vector::new(10.0, 0.0, 0.0);
        let inv_mass = 1.0;
        let inv_inertia = Matrix3x3::identity();
        let mut linvel = Vector::zeros();
        let mut angvel = Vector::zeros();
        c.prepare(inv_mass, &inv_inertia);
        for _ in 0..20 {
            c.solve_velocity(&mut linvel, &mut angvel, inv_mass, &inv_inertia);
        }
        assert!(c.accumulated_impulse.norm() <= 1.0 + 1e-4);
    }
}
