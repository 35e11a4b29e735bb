//! Scenario 3: a body held by a single bone constraint pinned to a fixed anchor
//! should swing under gravity while staying near the anchor's fixed radius, rather
//! than flying off to infinity or freezing in place.
//!
//! The kernel does not recompute a bone constraint's position error on its own each
//! step (that belongs to whatever higher layer owns the articulated skeleton); a
//! caller drives it the same way this test does, by refreshing `linear_error` from
//! the current relative position before each `Space::step()`.

use rigid3d::dynamics::SingleBoneConstraint;
use rigid3d::math::{Matrix3x3, Vector};
use rigid3d::{IntegrationParameters, RigidBody, Space, WorldConfig};

#[test]
fn pendulum_single_bone() {
    let mut space = Space::new(WorldConfig::default(), IntegrationParameters::default());

    let anchor = Vector::new(0.0, 3.0, 0.0);
    let arm_length = 2.0;
    let start = anchor + Vector::new(arm_length, 0.0, 0.0);

    let bob = space.insert_body(RigidBody::new_dynamic(start, 1.0, Matrix3x3::identity())).unwrap();

    let bone = SingleBoneConstraint::new(bob, Matrix3x3::identity(), Matrix3x3::zeros(), 0.01, 0.2, 50.0);
    let bone_handle = space.insert_bone(bone);

    let mut max_deviation: f32 = 0.0;
    for _ in 0..240 {
        let position = space.bodies[bob].position;
        let to_anchor = anchor - position;
        let deviation = (to_anchor.norm() - arm_length).abs();
        max_deviation = max_deviation.max(deviation);

        if let Some(bone) = space.bones.get_mut(bone_handle) {
            bone.linear_error = to_anchor;
        }
        space.step();
    }

    // The constraint should keep the bob within a bounded band around its rest
    // radius rather than letting it fall away unconstrained under gravity.
    assert!(max_deviation < arm_length, "bob strayed implausibly far from its anchor: {max_deviation}");

    let final_position = space.bodies[bob].position;
    assert!(final_position.iter().all(|c| c.is_finite()), "pendulum integration diverged");
    // Gravity should have pulled the bob below its starting height at some point
    // during the swing.
    assert!(final_position.y < start.y, "pendulum should have swung downward from its horizontal start");
}
