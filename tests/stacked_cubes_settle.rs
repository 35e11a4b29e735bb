//! Scenario 1: a short stack of cuboids dropped onto a floor plane should settle into
//! a resting configuration (near-zero velocities, boxes not interpenetrating) rather
//! than jittering or sinking through each other.

use rigid3d::math::{Matrix3x3, Vector};
use rigid3d::{Collider, IntegrationParameters, RigidBody, Shape, Space, WorldConfig};

#[test]
fn stacked_cubes_settle() {
    let mut space = Space::new(WorldConfig::default(), IntegrationParameters::default());

    let floor = space.insert_body(RigidBody::new_static(Vector::zeros())).unwrap();
    space.insert_collider(Collider::new(floor, Shape::plane(Vector::y(), 0.0)));

    let half = Vector::new(0.5, 0.5, 0.5);
    let mut boxes = Vec::new();
    for i in 0..3 {
        // Dropped with a small vertical gap so they fall and settle rather than
        // starting already touching.
        let y = 0.5 + (i as f32) * 1.05 + 0.3;
        let handle = space
            .insert_body(RigidBody::new_dynamic(Vector::new(0.0, y, 0.0), 1.0, Matrix3x3::identity()))
            .unwrap();
        space.insert_collider(Collider::new(handle, Shape::cuboid(half)));
        boxes.push(handle);
    }

    for _ in 0..360 {
        space.step();
    }

    let mut heights: Vec<f32> = boxes.iter().map(|&h| space.bodies[h].position.y).collect();
    heights.sort_by(|a, b| a.partial_cmp(b).unwrap());

    // Bottom box rests on the floor, each next box rests on the one below with no
    // interpenetration (allowing a little slack for solver residual penetration).
    assert!((heights[0] - 0.5).abs() < 0.1, "bottom box should settle at y=0.5, got {}", heights[0]);
    assert!(heights[1] - heights[0] > 0.9, "boxes should not interpenetrate: {:?}", heights);
    assert!(heights[2] - heights[1] > 0.9, "boxes should not interpenetrate: {:?}", heights);

    for &handle in &boxes {
        let body = &space.bodies[handle];
        assert!(body.linvel.norm() < 0.5, "box should have settled, linvel = {:?}", body.linvel);
    }
}
