//! `CharacterController`: composes `SupportFinder`, `HorizontalMotionConstraint`,
//! and `Stepper` around one capsule body, implementing the per-step algorithm of
//! spec §4.H through the `Updateable` phases.

use crate::body::RigidBodyHandle;
use crate::collider::ColliderHandle;
use crate::config::CharacterConfig;
use crate::errors::{PhysicsError, PhysicsResult};
use crate::math::{Isometry, Real, Vector};
use crate::pipeline::{StepContext, Updateable};

use super::motion::HorizontalMotionConstraint;
use super::stepper::Stepper;
use super::support::{SupportData, SupportFinder, SupportKind};

pub struct CharacterController {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
    pub up: Vector,
    pub jump_speed: Real,
    pub sliding_jump_speed: Real,
    pub jump_force_factor: Real,
    pub glue_speed: Real,
    pub support_finder: SupportFinder,
    pub motion: HorizontalMotionConstraint,
    pub stepper: Stepper,
    had_traction: bool,
    current_support: Option<SupportData>,
    jump_requested: bool,
}

impl CharacterController {
    /// `jumpForceFactor < 0` is a caller precondition violation (spec §7.1), the
    /// one fallible part of building a character controller.
    pub fn new(body: RigidBodyHandle, collider: ColliderHandle, up: Vector, config: &CharacterConfig) -> PhysicsResult<Self> {
        if config.jump_force_factor < 0.0 {
            return Err(PhysicsError::NegativeJumpForceFactor(config.jump_force_factor));
        }
        Ok(Self {
            body,
            collider,
            up,
            jump_speed: config.jump_speed,
            sliding_jump_speed: config.sliding_jump_speed,
            jump_force_factor: config.jump_force_factor,
            glue_speed: config.glue_speed,
            support_finder: SupportFinder::default(),
            motion: HorizontalMotionConstraint::default(),
            stepper: Stepper::new(config.maximum_step_height),
            had_traction: false,
            current_support: None,
            jump_requested: false,
        })
    }

    pub fn set_desired_horizontal_velocity(&mut self, v: Vector) {
        self.motion.target_velocity = v;
    }

    pub fn request_jump(&mut self) {
        self.jump_requested = true;
    }

    pub fn has_traction(&self) -> bool {
        self.had_traction
    }

    /// Steps 1-9 of the character algorithm: classify supports, discard
    /// newly-acquired traction the character is flying away from, apply a
    /// requested jump, attempt stepping when airborne, glue to the ground, then
    /// hand off to `HorizontalMotionConstraint`.
    fn run_support_phase(&mut self, ctx: &mut StepContext) {
        let had_traction = self.had_traction;

        let (traction, support) =
            self.support_finder
                .update_supports(self.collider, self.up, ctx.narrow_phase, ctx.bodies, ctx.colliders);
        let mut support_data = traction.or(support);

        let Some((mut linvel, position, rotation)) = ctx.bodies.get(self.body).map(|b| (b.linvel, b.position, b.orientation)) else {
            return;
        };

        let support_velocity = support_data
            .as_ref()
            .and_then(|s| s.body)
            .and_then(|h| ctx.bodies.get(h))
            .zip(support_data.as_ref())
            .map(|(b, s)| b.point_velocity(s.point))
            .unwrap_or(Vector::zeros());
        let relative_velocity = linvel - support_velocity;
        let normal = support_data.as_ref().map(|s| s.normal).unwrap_or(self.up);
        let vertical = relative_velocity.dot(&normal);

        // Step: traction only just acquired while still flying away from it is
        // discarded rather than snapping the character to the surface mid-air.
        if !had_traction {
            if let Some(s) = &support_data {
                if s.kind == SupportKind::Traction && vertical < 0.0 {
                    support_data = None;
                }
            }
        }
        self.had_traction = matches!(support_data, Some(SupportData { kind: SupportKind::Traction, .. }));

        if self.jump_requested {
            self.jump_requested = false;
            if let Some(s) = support_data.take() {
                let (target, current, direction) = match s.kind {
                    SupportKind::Traction => (self.jump_speed, linvel.dot(&self.up), self.up),
                    _ => (self.sliding_jump_speed, linvel.dot(&(-s.normal)), -s.normal),
                };
                let dv = (target - current) * direction;
                linvel += dv;

                if let Some(support_handle) = s.body {
                    let character_mass = ctx
                        .bodies
                        .get(self.body)
                        .map(|b| if b.inv_mass > 0.0 { 1.0 / b.inv_mass } else { 0.0 })
                        .unwrap_or(0.0);
                    if let Some(support_body) = ctx.bodies.get_mut(support_handle) {
                        support_body.apply_impulse(-dv * character_mass * self.jump_force_factor, s.point);
                    }
                }
            }
        }

        // Airborne: try to step down onto (or up over) nearby ground before
        // accepting free fall for this step.
        if support_data.is_none() {
            let shape = ctx.colliders.get(self.collider).map(|c| c.shape);
            if let Some(shape) = shape {
                let pose = Isometry::from_parts(position.into(), rotation);
                let desired_horizontal = self.motion.target_velocity * ctx.params.dt;
                if let Some(new_position) =
                    self.stepper
                        .try_step(&shape, &pose, desired_horizontal, self.up, ctx.bodies, ctx.colliders)
                {
                    if let Some(body_mut) = ctx.bodies.get_mut(self.body) {
                        body_mut.position = new_position;
                    }
                    if let Some(body_now) = ctx.bodies.get(self.body) {
                        let new_pose = body_now.pose();
                        if let Some(collider_mut) = ctx.colliders.get_mut(self.collider) {
                            collider_mut.refresh_aabb(&new_pose, ctx.params.prediction_distance);
                        }
                    }
                    ctx.narrow_phase.update(ctx.colliders, ctx.bodies, ctx.params.prediction_distance, ctx.events);
                    let (new_traction, new_support) = self.support_finder.update_supports(
                        self.collider,
                        self.up,
                        ctx.narrow_phase,
                        ctx.bodies,
                        ctx.colliders,
                    );
                    support_data = new_traction.or(new_support);
                    self.had_traction = matches!(support_data, Some(SupportData { kind: SupportKind::Traction, .. }));
                }
            }
        }

        // Ground glue: a small downward velocity toward a traction surface is
        // zeroed rather than left to accumulate into a visible bounce each step.
        if let Some(s) = &support_data {
            if s.kind == SupportKind::Traction {
                let vert = (linvel - support_velocity).dot(&s.normal);
                if vert < 0.0 && vert > -self.glue_speed {
                    linvel -= s.normal * vert;
                }
            }
        }

        if let Some(body_mut) = ctx.bodies.get_mut(self.body) {
            body_mut.linvel = linvel;
            let normal = support_data.as_ref().map(|s| s.normal);
            self.motion.apply(body_mut, normal, self.up);
        }

        self.current_support = support_data;
    }
}

impl Updateable for CharacterController {
    fn before_solver(&mut self, ctx: &mut StepContext) {
        self.run_support_phase(ctx);
    }

    /// Repeats the ground-glue adjustment once more against the solver's final
    /// velocities, so position integration doesn't separate the character from the
    /// ground by the amount the island solve just added back (spec §4.H).
    fn before_position_update(&mut self, ctx: &mut StepContext) {
        let Some(support) = self.current_support else { return };
        if support.kind != SupportKind::Traction {
            return;
        }
        let Some(body) = ctx.bodies.get(self.body) else { return };
        let vertical = body.linvel.dot(&support.normal);
        if vertical < 0.0 && vertical > -self.glue_speed {
            if let Some(body_mut) = ctx.bodies.get_mut(self.body) {
                body_mut.linvel -= support.normal * vertical;
            }
        }
    }

    // `end_of_time_step` stays the trait default (empty): nothing in this
    // algorithm needs to run after positions are already integrated.
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{RigidBody, RigidBodySet};
    use crate::broad_phase::BroadPhasePairEvent;
    use crate::collider::{Collider, ColliderPair, ColliderSet, Shape};
    use crate::math::Matrix3x3;
    use crate::narrow_phase::NarrowPhase;

    #[test]
    fn rejects_negative_jump_force_factor() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let body = bodies.insert(RigidBody::new_dynamic(Vector::zeros(), 1.0, Matrix3x3::identity())).unwrap();
        let collider = colliders.insert(Collider::new(body, Shape::capsule(0.5, 0.4)));
        let mut config = CharacterConfig::default();
        config.jump_force_factor = -1.0;
        let result = CharacterController::new(body, collider, Vector::y(), &config);
        assert!(matches!(result, Err(PhysicsError::NegativeJumpForceFactor(_))));
    }

    #[test]
    fn standing_on_flat_ground_grants_traction_and_glues() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let floor_body = bodies.insert(RigidBody::new_static(Vector::zeros())).unwrap();
        let mut floor = Collider::new(floor_body, Shape::plane(Vector::y(), 0.0));
        floor.refresh_aabb(&bodies[floor_body].pose(), 0.0);
        let floor_collider = colliders.insert(floor);

        let char_body = bodies
            .insert(RigidBody::new_dynamic(Vector::new(0.0, 0.9, 0.0), 1.0, Matrix3x3::identity()))
            .unwrap();
        bodies[char_body].linvel = Vector::new(0.0, -0.3, 0.0);
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

        let config = CharacterConfig::default();
        let mut controller = CharacterController::new(char_body, char_collider, Vector::y(), &config).unwrap();

        let params = crate::config::IntegrationParameters::default();
        let world_config = crate::config::WorldConfig::default();
        let mut ctx = StepContext {
            bodies: &mut bodies,
            colliders: &mut colliders,
            narrow_phase: &mut narrow_phase,
            config: &world_config,
            params: &params,
            events: &mut events,
        };
        controller.before_solver(&mut ctx);

        assert!(controller.has_traction());
        assert!(bodies[char_body].linvel.y >= -1e-4);
    }
}
