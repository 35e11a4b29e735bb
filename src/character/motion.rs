//! Drives the character's planar velocity toward a desired horizontal target,
//! applied directly to the body outside the solver's island step (spec §4.H: "not
//! thread-safe, must run on the main thread between solver phases").

use crate::body::RigidBody;
use crate::math::Vector;

#[derive(Debug, Clone, Copy, Default)]
pub struct HorizontalMotionConstraint {
    /// Desired velocity, projected onto the support plane when one exists. Set by
    /// the owning game/input layer each frame.
    pub target_velocity: Vector,
}

impl HorizontalMotionConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces `body`'s velocity component orthogonal to `normal` (the support
    /// normal if grounded, `up` otherwise) with `target_velocity`, leaving the
    /// component along `normal` untouched so gravity/jump/ground-glue still apply.
    pub fn apply(&self, body: &mut RigidBody, normal: Option<Vector>, up: Vector) {
        let axis = normal.unwrap_or(up);
        let along_axis = body.linvel.dot(&axis) * axis;
        body.linvel = along_axis + self.target_velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Matrix3x3;

    #[test]
    fn apply_preserves_vertical_component() {
        let mut body = RigidBody::new_dynamic(Vector::zeros(), 1.0, Matrix3x3::identity());
        body.linvel = Vector::new(0.0, -3.0, 0.0);
        let constraint = HorizontalMotionConstraint {
            target_velocity: Vector::new(2.0, 0.0, 0.0),
        };
        constraint.apply(&mut body, None, Vector::y());
        assert_eq!(body.linvel, Vector::new(2.0, -3.0, 0.0));
    }
}
