//! Narrow phase: routes broad-phase candidate pairs to a per-pair state machine that
//! maintains a persistent contact manifold (spec §4.C-D).

pub(crate) mod contacts;
mod gjk;
pub mod manifold;

pub use manifold::{ContactManifold, ContactPoint};

use rustc_hash::FxHashMap;

use crate::body::RigidBodySet;
use crate::broad_phase::BroadPhasePairEvent;
use crate::collider::{ColliderPair, ColliderSet};
use crate::events::CollisionEvent;
use crate::math::Real;

/// `Unassigned -> Initialized -> Touching <-> Separated -> Cleaning` (spec §4.C-D).
/// `Unassigned`/`Cleaning` are transient: a handler is created already-`Initialized`
/// and removed the moment it stops being tracked, so only the steady states
/// (`Touching`/`Separated`) persist across steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairState {
    Initialized,
    Touching,
    Separated,
}

struct PairHandler {
    state: PairState,
    manifold: ContactManifold,
}

/// Owns one persistent manifold per candidate pair currently reported by the broad
/// phase.
#[derive(Default)]
pub struct NarrowPhase {
    handlers: FxHashMap<ColliderPair, PairHandler>,
}

impl NarrowPhase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies broad-phase add/remove notifications: creates a handler (and fires
    /// `CreatingPair`) for new pairs, tears one down (firing per-contact
    /// `CollisionEnded` plus orphaning its constraint) for pairs the broad phase no
    /// longer reports.
    pub fn handle_broad_phase_events(
        &mut self,
        broad_phase_events: &[BroadPhasePairEvent],
        colliders: &ColliderSet,
        out: &mut Vec<CollisionEvent>,
    ) {
        for event in broad_phase_events {
            match *event {
                BroadPhasePairEvent::AddPair(pair) => {
                    let (Some(c1), Some(c2)) = (colliders.get(pair.collider1), colliders.get(pair.collider2)) else {
                        continue;
                    };
                    let (body1, body2) = (c1.parent, c2.parent);
                    self.handlers.entry(pair).or_insert_with(|| {
                        out.push(CollisionEvent::CreatingPair(pair));
                        PairHandler {
                            state: PairState::Initialized,
                            manifold: ContactManifold::new(pair.collider1, pair.collider2, body1, body2),
                        }
                    });
                }
                BroadPhasePairEvent::DeletePair(pair) => {
                    if let Some(handler) = self.handlers.remove(&pair) {
                        if handler.manifold.is_touching() {
                            out.push(CollisionEvent::CollisionEnded(pair));
                        }
                    }
                }
            }
        }
    }

    /// Refreshes every tracked manifold from current collider poses, firing
    /// transition events (`InitialCollisionDetected`/`CollisionEnded`/`PairTouching`).
    pub fn update(
        &mut self,
        colliders: &ColliderSet,
        bodies: &RigidBodySet,
        prediction_distance: Real,
        out: &mut Vec<CollisionEvent>,
    ) {
        self.handlers.retain(|pair, handler| {
            let (Some(c1), Some(c2)) = (colliders.get(pair.collider1), colliders.get(pair.collider2)) else {
                return false;
            };
            let (Some(b1), Some(b2)) = (bodies.get(c1.parent), bodies.get(c2.parent)) else {
                return false;
            };

            let was_touching = handler.manifold.is_touching();
            let pose1 = c1.world_pose(&b1.pose());
            let pose2 = c2.world_pose(&b2.pose());

            match contacts::generate(&c1.shape, &pose1, &c2.shape, &pose2, prediction_distance) {
                Some((normal, raw)) => handler.manifold.update(normal, raw.into_iter().collect()),
                None => handler.manifold.clear(),
            }

            let now_touching = handler.manifold.is_touching();
            handler.state = if now_touching { PairState::Touching } else { PairState::Separated };

            out.push(CollisionEvent::PairUpdated(*pair));
            if now_touching {
                out.push(CollisionEvent::PairTouching(*pair));
            }
            if now_touching && !was_touching {
                out.push(CollisionEvent::InitialCollisionDetected(*pair));
            } else if was_touching && !now_touching {
                out.push(CollisionEvent::CollisionEnded(*pair));
            }

            true
        });
    }

    pub fn manifolds(&self) -> impl Iterator<Item = &ContactManifold> {
        self.handlers.values().filter(|h| h.manifold.is_touching()).map(|h| &h.manifold)
    }

    pub fn manifolds_mut(&mut self) -> impl Iterator<Item = &mut ContactManifold> {
        self.handlers.values_mut().filter(|h| h.manifold.is_touching()).map(|h| &mut h.manifold)
    }

    pub fn manifold_for(&self, pair: ColliderPair) -> Option<&ContactManifold> {
        self.handlers.get(&pair).map(|h| &h.manifold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{RigidBody, RigidBodySet};
    use crate::collider::{Collider, Shape};
    use crate::math::{Matrix3x3, Vector};

    #[test]
    fn touching_spheres_produce_one_contact() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let h1 = bodies.insert(RigidBody::new_dynamic(Vector::zeros(), 1.0, Matrix3x3::identity())).unwrap();
        let h2 = bodies
            .insert(RigidBody::new_dynamic(Vector::new(1.5, 0.0, 0.0), 1.0, Matrix3x3::identity()))
            .unwrap();
        let c1 = colliders.insert(Collider::new(h1, Shape::ball(1.0)));
        let c2 = colliders.insert(Collider::new(h2, Shape::ball(1.0)));

        let mut np = NarrowPhase::new();
        let mut events = Vec::new();
        np.handle_broad_phase_events(
            &[BroadPhasePairEvent::AddPair(ColliderPair::new(c1, c2))],
            &colliders,
            &mut events,
        );
        np.update(&colliders, &bodies, 0.01, &mut events);

        assert_eq!(np.manifolds().count(), 1);
        assert!(events.contains(&CollisionEvent::InitialCollisionDetected(ColliderPair::new(c1, c2))));
    }
}
