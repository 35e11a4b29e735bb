//! Resolves short up/down steps by probing vertically and teleporting the character
//! when a probe lands on solid, walkable ground (spec §4.H step 7). Grounded on the
//! TOI shape-cast sweep-and-slide pattern of
//! `examples/other_examples/045d2aba_onx2-av__shared-src-collision-kinematic.rs.rs`'s
//! `move_capsule_kinematic`, adapted from a continuous sweep to a bounded discrete
//! probe since this crate's narrow phase has no continuous shape-cast of its own.

use crate::body::{BodyType, RigidBodySet};
use crate::collider::{ColliderSet, Shape};
use crate::math::{Isometry, Real, Vector};
use crate::narrow_phase::contacts;

pub struct Stepper {
    pub maximum_step_height: Real,
    /// Number of vertical samples probed within `[0, maximum_step_height]` per
    /// direction — a coarse but bounded search rather than an exact TOI solve.
    pub probe_samples: u32,
}

impl Stepper {
    pub fn new(maximum_step_height: Real) -> Self {
        Self {
            maximum_step_height,
            probe_samples: 6,
        }
    }

    /// Attempts a down-step, then an up-step, of `shape`/`current_pose` moving
    /// horizontally by `desired_horizontal`. Returns the new world position of the
    /// character's origin if either probe lands on walkable ground.
    pub fn try_step(
        &self,
        shape: &Shape,
        current_pose: &Isometry,
        desired_horizontal: Vector,
        up: Vector,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
    ) -> Option<Vector> {
        self.try_down_step(shape, current_pose, desired_horizontal, up, bodies, colliders)
            .or_else(|| self.try_up_step(shape, current_pose, desired_horizontal, up, bodies, colliders))
    }

    fn try_down_step(
        &self,
        shape: &Shape,
        current_pose: &Isometry,
        desired_horizontal: Vector,
        up: Vector,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
    ) -> Option<Vector> {
        let base = current_pose.translation.vector + desired_horizontal;
        for i in 1..=self.probe_samples {
            let drop = self.maximum_step_height * (i as Real / self.probe_samples as Real);
            let candidate = base - up * drop;
            if let Some(normal) = self.ground_normal_at(shape, current_pose, candidate, bodies, colliders) {
                if normal.dot(&up) > 0.1 {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn try_up_step(
        &self,
        shape: &Shape,
        current_pose: &Isometry,
        desired_horizontal: Vector,
        up: Vector,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
    ) -> Option<Vector> {
        for i in 1..=self.probe_samples {
            let rise = self.maximum_step_height * (i as Real / self.probe_samples as Real);
            let candidate = current_pose.translation.vector + desired_horizontal + up * rise;
            if !self.is_clear(shape, current_pose, candidate, bodies, colliders) {
                continue;
            }
            if let Some(normal) = self.ground_normal_at(shape, current_pose, candidate - up * 0.05, bodies, colliders) {
                if normal.dot(&up) > 0.1 {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// The contact normal (pointing toward the character) of whichever static
    /// collider `shape` at `position` touches first, or `None` if it touches
    /// nothing.
    fn ground_normal_at(
        &self,
        shape: &Shape,
        current_pose: &Isometry,
        position: Vector,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
    ) -> Option<Vector> {
        let pose = Isometry::from_parts(position.into(), current_pose.rotation);
        for (_, collider) in colliders.iter() {
            let Some(body) = bodies.get(collider.parent) else { continue };
            if body.body_type != BodyType::Static {
                continue;
            }
            let other_pose = collider.world_pose(&body.pose());
            if let Some((normal, raw)) = contacts::generate(shape, &pose, &collider.shape, &other_pose, 0.05) {
                if !raw.is_empty() {
                    return Some(-normal);
                }
            }
        }
        None
    }

    /// Whether `shape` at `position` penetrates no static collider by more than a
    /// hair's width — used to reject an up-step candidate that would wedge the
    /// character into a ceiling.
    fn is_clear(&self, shape: &Shape, current_pose: &Isometry, position: Vector, bodies: &RigidBodySet, colliders: &ColliderSet) -> bool {
        let pose = Isometry::from_parts(position.into(), current_pose.rotation);
        for (_, collider) in colliders.iter() {
            let Some(body) = bodies.get(collider.parent) else { continue };
            if body.body_type != BodyType::Static {
                continue;
            }
            let other_pose = collider.world_pose(&body.pose());
            if let Some((_, raw)) = contacts::generate(shape, &pose, &collider.shape, &other_pose, 0.0) {
                if raw.iter().any(|c| c.penetration > 0.01) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::collider::Collider;

    #[test]
    fn down_step_lands_on_lower_platform() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let platform_body = bodies.insert(RigidBody::new_static(Vector::new(0.0, -0.2, 0.0))).unwrap();
        let mut platform = Collider::new(platform_body, Shape::cuboid(Vector::new(2.0, 0.1, 2.0)));
        platform.refresh_aabb(&bodies[platform_body].pose(), 0.0);
        colliders.insert(platform);

        let shape = Shape::capsule(0.5, 0.4);
        let current_pose = Isometry::translation(0.0, 1.0, 0.0);
        let stepper = Stepper::new(0.5);
        let result = stepper.try_step(&shape, &current_pose, Vector::new(0.0, 0.0, 0.0), Vector::y(), &bodies, &colliders);
        assert!(result.is_some());
    }
}
