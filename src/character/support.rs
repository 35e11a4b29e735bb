//! Classifies the character's current contacts into support/traction categories
//! (spec §4.H: `SupportFinder.updateSupports()`).

use crate::body::{RigidBodyHandle, RigidBodySet};
use crate::collider::{ColliderHandle, ColliderSet};
use crate::math::{Real, Vector};
use crate::narrow_phase::NarrowPhase;

/// How solid the ground under a character is this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportKind {
    None,
    /// Opposes gravity, but too steep/slick to sustain horizontal motion.
    SupportOnly,
    /// Opposes gravity and can sustain horizontal motion against friction.
    Traction,
}

#[derive(Debug, Clone, Copy)]
pub struct SupportData {
    pub kind: SupportKind,
    /// Points away from the ground, toward the character.
    pub normal: Vector,
    pub point: Vector,
    /// `None` for a static/kinematic support (nothing to apply a reaction impulse to).
    pub body: Option<RigidBodyHandle>,
}

/// Scans manifolds touching the character's collider and separates them into
/// traction-grade (flat enough for friction to hold a character up) and
/// support-only (opposes gravity, too steep to walk on) contacts.
pub struct SupportFinder {
    /// Contacts with `normal.dot(up) >= support_cos` oppose gravity enough to count
    /// as support at all.
    pub support_cos: Real,
    /// The stricter subset of those that can additionally sustain horizontal motion.
    pub traction_cos: Real,
}

impl Default for SupportFinder {
    fn default() -> Self {
        Self {
            support_cos: 0.1,
            traction_cos: 0.7,
        }
    }
}

impl SupportFinder {
    /// Returns the best traction contact and the best support-only contact found
    /// this step, each `None` if no manifold touching `character_collider` qualifies.
    pub fn update_supports(
        &self,
        character_collider: ColliderHandle,
        up: Vector,
        narrow_phase: &NarrowPhase,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
    ) -> (Option<SupportData>, Option<SupportData>) {
        let mut best_traction: Option<(Real, SupportData)> = None;
        let mut best_support: Option<(Real, SupportData)> = None;

        for manifold in narrow_phase.manifolds() {
            let is_first = if manifold.collider1 == character_collider {
                true
            } else if manifold.collider2 == character_collider {
                false
            } else {
                continue;
            };

            let other_body = if is_first { manifold.body2 } else { manifold.body1 };
            if colliders.get(if is_first { manifold.collider2 } else { manifold.collider1 }).is_none() {
                continue;
            }

            // The manifold normal points collider1 -> collider2; flip so it always
            // points away from the ground and toward the character.
            let normal_toward_character = if is_first { -manifold.normal } else { manifold.normal };
            let alignment = normal_toward_character.dot(&up);
            if alignment < self.support_cos {
                continue;
            }

            let kind = if alignment >= self.traction_cos {
                SupportKind::Traction
            } else {
                SupportKind::SupportOnly
            };
            let body = bodies.get(other_body).filter(|b| !b.is_static()).map(|_| other_body);

            for point in &manifold.points {
                let world_point = if is_first { point.point_a } else { point.point_b };
                let data = SupportData {
                    kind,
                    normal: normal_toward_character,
                    point: world_point.coords,
                    body,
                };

                if kind == SupportKind::Traction {
                    if best_traction.map(|(a, _)| alignment > a).unwrap_or(true) {
                        best_traction = Some((alignment, data));
                    }
                } else if best_support.map(|(a, _)| alignment > a).unwrap_or(true) {
                    best_support = Some((alignment, data));
                }
            }
        }

        (best_traction.map(|(_, d)| d), best_support.map(|(_, d)| d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::broad_phase::BroadPhasePairEvent;
    use crate::collider::{Collider, ColliderPair, Shape};
    use crate::math::Matrix3x3;

    #[test]
    fn flat_floor_contact_is_classified_as_traction() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let floor_body = bodies.insert(RigidBody::new_static(Vector::zeros())).unwrap();
        let mut floor = Collider::new(floor_body, Shape::plane(Vector::y(), 0.0));
        floor.refresh_aabb(&bodies[floor_body].pose(), 0.0);
        let floor_collider = colliders.insert(floor);

        // Capsule (half-height 0.5, radius 0.4) resting exactly on the floor plane.
        let char_body = bodies
            .insert(RigidBody::new_dynamic(Vector::new(0.0, 0.9, 0.0), 1.0, Matrix3x3::identity()))
            .unwrap();
        let mut character = Collider::new(char_body, Shape::capsule(0.5, 0.4));
        character.refresh_aabb(&bodies[char_body].pose(), 0.01);
        let char_collider = colliders.insert(character);

        let mut narrow_phase = NarrowPhase::new();
        let mut events = Vec::new();
        narrow_phase.handle_broad_phase_events(
            &[BroadPhasePairEvent::AddPair(ColliderPair::new(floor_collider, char_collider))],
            &colliders,
            &mut events,
        );
        narrow_phase.update(&colliders, &bodies, 0.01, &mut events);

        let finder = SupportFinder::default();
        let (traction, support) = finder.update_supports(char_collider, Vector::y(), &narrow_phase, &bodies, &colliders);
        assert!(traction.is_some());
        assert!(support.is_none());
        assert!(traction.unwrap().normal.dot(&Vector::y()) > 0.9);
    }
}
