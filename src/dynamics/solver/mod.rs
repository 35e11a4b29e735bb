//! The iterative PGS solver (spec §4.F): a closed tagged union of constraint kinds
//! dispatched through a `match` in the hot per-iteration loop, per the "Polymorphism"
//! design note — no `dyn Trait` in the solve path.

mod bone_constraint;
mod contact_constraint;

pub use bone_constraint::SingleBoneConstraint;
pub use contact_constraint::ContactConstraint;

use crate::body::RigidBodySet;
use crate::config::IntegrationParameters;
use crate::islands::Island;
use crate::narrow_phase::ContactManifold;

fn body_handles(manifold: &ContactManifold) -> (crate::body::RigidBodyHandle, crate::body::RigidBodyHandle) {
    (manifold.body1, manifold.body2)
}

/// One prepared constraint ready for this step's solve. Built once per step from the
/// narrow phase's manifolds and the registered articulated constraints. Both variants
/// borrow their persistent state directly (the manifold's `ContactPoint` impulses, the
/// bone constraint's `accumulated_impulse`) rather than copying it, so warm-start data
/// written during this solve is already where next step will look for it.
pub enum Constraint<'a> {
    Contact { constraint: ContactConstraint, manifold: &'a mut ContactManifold },
    Bone(&'a mut SingleBoneConstraint),
}

/// Runs warm start, `velocity_iterations` velocity sweeps, and
/// `position_iterations` split-impulse position sweeps over a single island's
/// constraints, in insertion order, never rebalancing mid-iteration (spec §4.F:
/// "solver processes constraints in insertion order and never rebalances").
pub fn solve_island(bodies: &mut RigidBodySet, island: &Island, constraints: &mut [Constraint], params: &IntegrationParameters) {
    let _ = island; // bodies are addressed directly through each constraint's handles

    for constraint in constraints.iter_mut() {
        match constraint {
            Constraint::Contact { constraint, manifold } => {
                let (h1, h2) = body_handles(manifold);
                let (Some(b1), Some(b2)) = bodies.get2_mut(h1, h2) else {
                    continue;
                };
                constraint.warm_start(manifold, b1, b2);
            }
            Constraint::Bone(bone) => {
                if let Some(body) = bodies.get_mut(bone.bone) {
                    let inv_inertia = *body.world_inv_inertia();
                    bone.warm_start(&mut body.linvel, &mut body.angvel, body.inv_mass, &inv_inertia);
                }
            }
        }
    }

    for _ in 0..params.velocity_iterations {
        for constraint in constraints.iter_mut() {
            match constraint {
                Constraint::Contact { constraint, manifold } => {
                    let (h1, h2) = body_handles(manifold);
                    let (Some(b1), Some(b2)) = bodies.get2_mut(h1, h2) else {
                        continue;
                    };
                    constraint.solve_velocity(manifold, b1, b2);
                }
                Constraint::Bone(bone) => {
                    if let Some(body) = bodies.get_mut(bone.bone) {
                        let inv_inertia = *body.world_inv_inertia();
                        let inv_mass = body.inv_mass;
                        bone.solve_velocity(&mut body.linvel, &mut body.angvel, inv_mass, &inv_inertia);
                    }
                }
            }
        }
    }

    for _ in 0..params.position_iterations {
        for constraint in constraints.iter_mut() {
            if let Constraint::Contact { constraint, manifold } = constraint {
                let (h1, h2) = body_handles(manifold);
                let (Some(b1), Some(b2)) = bodies.get2_mut(h1, h2) else {
                    continue;
                };
                constraint.solve_position(manifold, b1, b2, params.erp, params.allowed_penetration);
            }
        }
    }
}

