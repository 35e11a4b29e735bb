//! `Space`: owns every subsystem and drives one fixed-step tick end to end (spec §5
//! "Space/World composition root"). Broad phase -> narrow phase -> island solve ->
//! position integration -> continuous-collision clamping -> `Updateable` phases,
//! in that order, matching the pipeline shape of the teacher's own
//! `PhysicsPipeline::step`.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::body::{RigidBody, RigidBodyHandle, RigidBodySet};
use crate::broad_phase::{BroadPhase, BroadPhasePairEvent, Grid2DSortAndSweep};
use crate::collider::{Collider, ColliderHandle, ColliderPair, ColliderSet};
use crate::config::{IntegrationParameters, WorldConfig};
use crate::continuous;
use crate::dynamics::solver::{self, Constraint, ContactConstraint};
use crate::dynamics::{BoneConstraintHandle, BoneConstraintSet, SingleBoneConstraint};
use crate::errors::PhysicsResult;
use crate::events::{CollisionEvent, EventHandlers};
use crate::islands::{self, Island};
use crate::math::{Point, Real};
use crate::narrow_phase::NarrowPhase;
use crate::pipeline::{StepContext, Updateable};

/// Owns the whole simulation: bodies, colliders, the broad/narrow phase, the
/// articulated-constraint set, and every registered `Updateable` (character
/// controllers and any custom user behavior).
pub struct Space {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub bones: BoneConstraintSet,
    pub config: WorldConfig,
    pub params: IntegrationParameters,
    broad_phase: Grid2DSortAndSweep,
    narrow_phase: NarrowPhase,
    events: EventHandlers,
    updateables: Vec<Box<dyn Updateable>>,
    last_events: Vec<CollisionEvent>,
}

impl Space {
    pub fn new(config: WorldConfig, params: IntegrationParameters) -> Self {
        let broad_phase = Grid2DSortAndSweep::new(config.cell_size);
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            bones: BoneConstraintSet::new(),
            config,
            params,
            broad_phase,
            narrow_phase: NarrowPhase::new(),
            events: EventHandlers::new(),
            updateables: Vec::new(),
            last_events: Vec::new(),
        }
    }

    pub fn insert_body(&mut self, body: RigidBody) -> PhysicsResult<RigidBodyHandle> {
        self.bodies.insert(body)
    }

    pub fn insert_collider(&mut self, collider: Collider) -> ColliderHandle {
        let parent = collider.parent;
        let handle = self.colliders.insert(collider);
        if let Some(body) = self.bodies.get_mut(parent) {
            body.colliders.push(handle);
        }
        handle
    }

    pub fn insert_bone(&mut self, bone: SingleBoneConstraint) -> BoneConstraintHandle {
        self.bones.insert(bone)
    }

    pub fn register_event_handler(&mut self, handler: impl FnMut(&CollisionEvent) + Send + 'static) {
        self.events.register(handler);
    }

    pub fn register_updateable(&mut self, updateable: Box<dyn Updateable>) {
        self.updateables.push(updateable);
    }

    /// Events produced by the most recently completed `step`, for callers that
    /// want to inspect them directly rather than through a registered handler.
    pub fn last_events(&self) -> &[CollisionEvent] {
        &self.last_events
    }

    pub fn narrow_phase(&self) -> &NarrowPhase {
        &self.narrow_phase
    }

    /// Advances the whole world by `self.params.dt`.
    pub fn step(&mut self) {
        let dt = self.params.dt;
        let gravity = self.config.gravity;

        for (_, body) in self.bodies.iter_mut() {
            if body.is_dynamic() && !body.activation.sleeping {
                body.update_world_mass_properties();
                body.add_gravity(gravity, dt);
            }
        }

        let mut updateables = std::mem::take(&mut self.updateables);
        let mut events = Vec::new();
        {
            let mut ctx = StepContext {
                bodies: &mut self.bodies,
                colliders: &mut self.colliders,
                narrow_phase: &mut self.narrow_phase,
                config: &self.config,
                params: &self.params,
                events: &mut events,
            };
            for updateable in updateables.iter_mut() {
                updateable.before_solver(&mut ctx);
            }
        }

        for (_, collider) in self.colliders.iter_mut() {
            if let Some(body) = self.bodies.get(collider.parent) {
                if body.is_static() || !body.activation.sleeping {
                    let pose = body.pose();
                    collider.refresh_aabb(&pose, self.params.prediction_distance);
                }
            }
        }

        let mut bp_events = Vec::new();
        self.broad_phase.update(&self.colliders, &mut bp_events);
        self.narrow_phase.handle_broad_phase_events(&bp_events, &self.colliders, &mut events);
        self.narrow_phase
            .update(&self.colliders, &self.bodies, self.params.prediction_distance, &mut events);

        wake_on_new_contacts(&mut self.bodies, &self.narrow_phase, &events);
        self.events.dispatch_all(&events);

        solve_islands(&mut self.bodies, &mut self.narrow_phase, &mut self.bones, &self.params);

        {
            let mut ctx = StepContext {
                bodies: &mut self.bodies,
                colliders: &mut self.colliders,
                narrow_phase: &mut self.narrow_phase,
                config: &self.config,
                params: &self.params,
                events: &mut events,
            };
            for updateable in updateables.iter_mut() {
                updateable.before_position_update(&mut ctx);
            }
        }

        let mut swept_starts: Vec<(RigidBodyHandle, Point, Real)> = Vec::new();
        for (handle, body) in self.bodies.iter() {
            if matches!(body.update_mode, crate::body::PositionUpdateMode::Continuous) && body.is_dynamic() {
                if let Some(&collider) = body.colliders.first() {
                    let radius = self.colliders.get(collider).map(|c| c.shape.radius()).unwrap_or(0.0);
                    swept_starts.push((handle, Point::from(body.position), radius));
                }
            }
        }

        for (_, body) in self.bodies.iter_mut() {
            if body.is_dynamic() && body.activation.sleeping {
                continue;
            }
            body.integrate(dt);
        }

        for (handle, start, radius) in swept_starts {
            let Some(body) = self.bodies.get(handle) else { continue };
            let end = Point::from(body.position);
            if let Some((toi, normal)) = continuous::sweep_vs_statics(start, end, radius, &self.bodies, &self.colliders) {
                if let Some(body_mut) = self.bodies.get_mut(handle) {
                    let clamped = start + (end - start) * toi;
                    body_mut.position = clamped.coords;
                    let remaining = body_mut.linvel.dot(&normal);
                    if remaining < 0.0 {
                        body_mut.linvel -= normal * remaining;
                    }
                }
            }
        }

        for (_, body) in self.bodies.iter_mut() {
            if body.is_dynamic() {
                let energy = body.kinetic_energy();
                body.activation.update_energy(energy);
                if body.activation.is_below_threshold() {
                    body.activation.sleep();
                }
            }
        }

        {
            let mut ctx = StepContext {
                bodies: &mut self.bodies,
                colliders: &mut self.colliders,
                narrow_phase: &mut self.narrow_phase,
                config: &self.config,
                params: &self.params,
                events: &mut events,
            };
            for updateable in updateables.iter_mut() {
                updateable.end_of_time_step(&mut ctx);
            }
        }

        self.updateables = updateables;
        self.last_events = events;
    }
}

fn wake_on_new_contacts(bodies: &mut RigidBodySet, narrow_phase: &NarrowPhase, events: &[CollisionEvent]) {
    for event in events {
        if let CollisionEvent::InitialCollisionDetected(pair) = event {
            if let Some(manifold) = narrow_phase.manifold_for(*pair) {
                if let Some(body) = bodies.get_mut(manifold.body1) {
                    if body.is_dynamic() {
                        body.activation.wake_up();
                    }
                }
                if let Some(body) = bodies.get_mut(manifold.body2) {
                    if body.is_dynamic() {
                        body.activation.wake_up();
                    }
                }
            }
        }
    }
}

/// Builds islands from awake dynamic bodies, then solves each one independently
/// (spec §4.F: islands are solved without cross-island interaction this step).
fn solve_islands(bodies: &mut RigidBodySet, narrow_phase: &mut NarrowPhase, bones: &mut BoneConstraintSet, params: &IntegrationParameters) {
    let dynamic_bodies: Vec<RigidBodyHandle> = bodies
        .iter()
        .filter(|(_, b)| b.is_dynamic() && !b.activation.sleeping)
        .map(|(h, _)| h)
        .collect();

    let edges: Vec<(RigidBodyHandle, RigidBodyHandle)> = narrow_phase
        .manifolds()
        .filter_map(|m| {
            let b1 = bodies.get(m.body1)?;
            let b2 = bodies.get(m.body2)?;
            if b1.is_dynamic() && b2.is_dynamic() && !b1.activation.sleeping && !b2.activation.sleeping {
                Some((m.body1, m.body2))
            } else {
                None
            }
        })
        .collect();

    let islands: Vec<Island> = islands::build_islands(dynamic_bodies.into_iter(), edges.into_iter());

    for island in &islands {
        let body_set: FxHashSet<RigidBodyHandle> = island.bodies.iter().copied().collect();

        let mut prepared: FxHashMap<ColliderPair, ContactConstraint> = FxHashMap::default();
        for manifold in narrow_phase.manifolds() {
            if !(body_set.contains(&manifold.body1) || body_set.contains(&manifold.body2)) {
                continue;
            }
            let (Some(b1), Some(b2)) = (bodies.get(manifold.body1), bodies.get(manifold.body2)) else {
                continue;
            };
            let key = ColliderPair::new(manifold.collider1, manifold.collider2);
            prepared.insert(key, ContactConstraint::prepare(manifold, b1, b2, params.erp_inv_dt(), params.allowed_penetration));
        }

        let mut constraints: Vec<Constraint> = Vec::new();
        for manifold in narrow_phase.manifolds_mut() {
            let key = ColliderPair::new(manifold.collider1, manifold.collider2);
            if let Some(constraint) = prepared.remove(&key) {
                constraints.push(Constraint::Contact { constraint, manifold });
            }
        }

        for (_, bone) in bones.iter_mut() {
            if !body_set.contains(&bone.bone) {
                continue;
            }
            if let Some(body) = bodies.get(bone.bone) {
                let inv_inertia = *body.world_inv_inertia();
                bone.prepare(body.inv_mass, &inv_inertia);
            }
            constraints.push(Constraint::Bone(bone));
        }

        solver::solve_island(bodies, island, &mut constraints, params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::Shape;
    use crate::math::{Matrix3x3, Vector};

    #[test]
    fn dynamic_ball_falls_under_gravity() {
        let mut space = Space::new(WorldConfig::default(), IntegrationParameters::default());
        let body = space
            .insert_body(RigidBody::new_dynamic(Vector::new(0.0, 5.0, 0.0), 1.0, Matrix3x3::identity()))
            .unwrap();
        space.insert_collider(Collider::new(body, Shape::ball(0.5)));

        for _ in 0..30 {
            space.step();
        }
        assert!(space.bodies[body].position.y < 5.0);
    }

    #[test]
    fn ball_settles_on_floor_plane() {
        let mut space = Space::new(WorldConfig::default(), IntegrationParameters::default());
        let floor = space.insert_body(RigidBody::new_static(Vector::zeros())).unwrap();
        space.insert_collider(Collider::new(floor, Shape::plane(Vector::y(), 0.0)));

        let ball = space
            .insert_body(RigidBody::new_dynamic(Vector::new(0.0, 2.0, 0.0), 1.0, Matrix3x3::identity()))
            .unwrap();
        space.insert_collider(Collider::new(ball, Shape::ball(0.5)));

        for _ in 0..240 {
            space.step();
        }
        approx::assert_relative_eq!(space.bodies[ball].position.y, 0.5, epsilon = 0.05);
    }
}
