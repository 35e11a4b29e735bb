//! Per-step orchestration hooks (spec §6 "Updateable phases"). `Space::step` drives
//! every registered `Updateable` through three phases per step; the character
//! controller is the built-in implementer, but the trait stays open so a caller can
//! add their own constraint-like behavior without reaching into the solver's closed
//! tagged union (spec §9 "Polymorphism": closed union in the hot loop, a narrow
//! trait only at the extension points).

use crate::body::RigidBodySet;
use crate::collider::ColliderSet;
use crate::config::{IntegrationParameters, WorldConfig};
use crate::events::CollisionEvent;
use crate::narrow_phase::NarrowPhase;

/// Borrowed view of simulation state handed to each `Updateable` phase.
pub struct StepContext<'a> {
    pub bodies: &'a mut RigidBodySet,
    pub colliders: &'a mut ColliderSet,
    pub narrow_phase: &'a mut NarrowPhase,
    pub config: &'a WorldConfig,
    pub params: &'a IntegrationParameters,
    pub events: &'a mut Vec<CollisionEvent>,
}

/// A behavior that runs at fixed points in the per-step pipeline, outside the
/// solver's own constraint set. Default phases are no-ops so an implementer only
/// needs to override the ones it cares about.
pub trait Updateable: Send {
    /// Runs before the island solve, with fresh broad/narrow-phase results already
    /// available for this step.
    fn before_solver(&mut self, ctx: &mut StepContext) {
        let _ = ctx;
    }

    /// Runs after the solve but before positions are integrated, so a behavior can
    /// react to the solver's final velocities before they're baked into motion.
    fn before_position_update(&mut self, ctx: &mut StepContext) {
        let _ = ctx;
    }

    /// Runs once positions are integrated. Empty for the character controller
    /// (spec §9 Open Question resolution: nothing needs to run this late).
    fn end_of_time_step(&mut self, ctx: &mut StepContext) {
        let _ = ctx;
    }
}
