//! Per-manifold contact constraint: one normal (unilateral, non-penetration) plus two
//! friction sub-constraints per point (spec §4.E). Built fresh from the manifold each
//! step — the manifold's `ContactPoint` already carries the warm-start impulses, so
//! there is no separate persistent constraint object to keep in sync with it.

use arrayvec::ArrayVec;

use crate::body::{Material, RigidBody};
use crate::math::{orthonormal_basis, Real, Vector};
use crate::narrow_phase::ContactManifold;

struct PointConstraint {
    r1: Vector,
    r2: Vector,
    normal_mass: Real,
    tangent_mass: [Real; 2],
    velocity_bias: Real,
    restitution_bias: Real,
    point_index: usize,
}

/// A prepared contact constraint, ready for warm-starting and velocity iterations.
/// Indices back into the originating manifold's `points` so impulses can be written
/// back for next frame's warm start.
pub struct ContactConstraint {
    normal: Vector,
    tangents: [Vector; 2],
    friction: Real,
    restitution: Real,
    inv_mass1: Real,
    inv_mass2: Real,
    points: ArrayVec<PointConstraint, 4>,
}

const RESTITUTION_VELOCITY_THRESHOLD: Real = 1.0;

impl ContactConstraint {
    /// Builds effective masses and velocity biases from the current manifold and body
    /// state (`ComputeEffectiveMass` in spec §4.E terms).
    pub fn prepare(manifold: &ContactManifold, body1: &RigidBody, body2: &RigidBody, erp_inv_dt: Real, allowed_penetration: Real) -> Self {
        let normal = manifold.normal;
        let (t1, t2) = orthonormal_basis(normal);
        let material1 = body1.material;
        let material2 = body2.material;

        let mut points = ArrayVec::new();
        for (i, contact) in manifold.points.iter().enumerate() {
            let r1 = contact.point_a.coords - body1.position;
            let r2 = contact.point_b.coords - body2.position;

            let normal_mass = effective_mass_scalar(body1, body2, &r1, &r2, &normal);
            let tangent_mass = [
                effective_mass_scalar(body1, body2, &r1, &r2, &t1),
                effective_mass_scalar(body1, body2, &r1, &r2, &t2),
            ];

            let penetration_error = contact.penetration - allowed_penetration;
            let velocity_bias = if penetration_error > 0.0 { erp_inv_dt * penetration_error } else { 0.0 };

            let rel_vel = relative_velocity(body1, body2, &r1, &r2).dot(&normal);
            let restitution = Material::combine_restitution(material1, material2);
            let restitution_bias = if -rel_vel > RESTITUTION_VELOCITY_THRESHOLD { restitution * -rel_vel } else { 0.0 };

            points.push(PointConstraint {
                r1,
                r2,
                normal_mass,
                tangent_mass,
                velocity_bias,
                restitution_bias,
                point_index: i,
            });
        }

        Self {
            normal,
            tangents: [t1, t2],
            friction: Material::combine_friction(material1, material2),
            restitution: Material::combine_restitution(material1, material2),
            inv_mass1: body1.inv_mass,
            inv_mass2: body2.inv_mass,
            points,
        }
    }

    /// Applies each point's previous-frame accumulated impulse before the iteration
    /// loop starts (`WarmStart()`).
    pub fn warm_start(&self, manifold: &mut ContactManifold, body1: &mut RigidBody, body2: &mut RigidBody) {
        for pc in &self.points {
            let contact = &manifold.points[pc.point_index];
            let impulse = self.normal * contact.normal_impulse
                + self.tangents[0] * contact.tangent_impulse[0]
                + self.tangents[1] * contact.tangent_impulse[1];
            apply_impulse_pair(body1, body2, &pc.r1, &pc.r2, impulse);
        }
    }

    /// One Gauss-Seidel sweep over every point: normal impulse first (clamped
    /// `>= 0`), then the two friction impulses (clamped inside the friction cone
    /// scaled by the just-updated normal impulse).
    pub fn solve_velocity(&self, manifold: &mut ContactManifold, body1: &mut RigidBody, body2: &mut RigidBody) {
        for pc in &self.points {
            let rel_vel = relative_velocity(body1, body2, &pc.r1, &pc.r2);
            let vn = rel_vel.dot(&self.normal);
            let bias = pc.velocity_bias.max(pc.restitution_bias);
            let mut delta = -pc.normal_mass * (vn - bias);

            let contact = &mut manifold.points[pc.point_index];
            let old_impulse = contact.normal_impulse;
            contact.normal_impulse = (old_impulse + delta).max(0.0);
            delta = contact.normal_impulse - old_impulse;

            apply_impulse_pair(body1, body2, &pc.r1, &pc.r2, self.normal * delta);
        }

        for pc in &self.points {
            let max_friction = self.friction * manifold.points[pc.point_index].normal_impulse;
            for axis in 0..2 {
                let rel_vel = relative_velocity(body1, body2, &pc.r1, &pc.r2);
                let vt = rel_vel.dot(&self.tangents[axis]);
                let mut delta = -pc.tangent_mass[axis] * vt;

                let contact = &mut manifold.points[pc.point_index];
                let old_impulse = contact.tangent_impulse[axis];
                contact.tangent_impulse[axis] = (old_impulse + delta).clamp(-max_friction, max_friction);
                delta = contact.tangent_impulse[axis] - old_impulse;

                apply_impulse_pair(body1, body2, &pc.r1, &pc.r2, self.tangents[axis] * delta);
            }
        }
    }

    /// Split-impulse position correction pass: pushes bodies apart along the normal
    /// using a throwaway pseudo-velocity that never feeds back into the main
    /// velocity state (spec §4.F: "position error is NOT fed back into velocity bias
    /// in that variant").
    pub fn solve_position(&self, manifold: &ContactManifold, body1: &mut RigidBody, body2: &mut RigidBody, erp: Real, allowed_penetration: Real) {
        for pc in &self.points {
            let contact = &manifold.points[pc.point_index];
            let penetration = contact.penetration - allowed_penetration;
            if penetration <= 0.0 {
                continue;
            }
            let correction = (erp * penetration * pc.normal_mass).min(penetration);
            if body1.can_move() {
                body1.position -= self.normal * (correction * self.inv_mass1);
            }
            if body2.can_move() {
                body2.position += self.normal * (correction * self.inv_mass2);
            }
        }
    }
}

fn relative_velocity(body1: &RigidBody, body2: &RigidBody, r1: &Vector, r2: &Vector) -> Vector {
    let v1 = body1.linvel + body1.angvel.cross(r1);
    let v2 = body2.linvel + body2.angvel.cross(r2);
    v2 - v1
}

fn effective_mass_scalar(body1: &RigidBody, body2: &RigidBody, r1: &Vector, r2: &Vector, axis: &Vector) -> Real {
    let r1_cross_n = r1.cross(axis);
    let r2_cross_n = r2.cross(axis);
    let ang1 = (body1.world_inv_inertia() * r1_cross_n).dot(&r1_cross_n);
    let ang2 = (body2.world_inv_inertia() * r2_cross_n).dot(&r2_cross_n);
    let denom = body1.inv_mass + body2.inv_mass + ang1 + ang2;
    if denom > Real::EPSILON {
        1.0 / denom
    } else {
        0.0
    }
}

fn apply_impulse_pair(body1: &mut RigidBody, body2: &mut RigidBody, r1: &Vector, r2: &Vector, impulse: Vector) {
    body1.apply_impulse(-impulse, body1.position + r1);
    body2.apply_impulse(impulse, body2.position + r2);
}
