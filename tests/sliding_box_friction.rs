//! Scenario 2: a box given an initial horizontal velocity on a flat floor should be
//! decelerated by friction rather than sliding forever or being stopped instantly.

use rigid3d::math::{Matrix3x3, Vector};
use rigid3d::{Collider, IntegrationParameters, Material, RigidBody, Shape, Space, WorldConfig};

#[test]
fn sliding_box_friction() {
    let mut space = Space::new(WorldConfig::default(), IntegrationParameters::default());

    let floor = space.insert_body(RigidBody::new_static(Vector::zeros())).unwrap();
    let mut floor_collider = Collider::new(floor, Shape::plane(Vector::y(), 0.0));
    floor_collider.material = Material { friction: 0.6, restitution: 0.0 };
    space.insert_collider(floor_collider);

    let half = Vector::new(0.5, 0.5, 0.5);
    let body = space
        .insert_body(RigidBody::new_dynamic(Vector::new(0.0, 0.5, 0.0), 1.0, Matrix3x3::identity()))
        .unwrap();
    space.bodies[body].linvel = Vector::new(4.0, 0.0, 0.0);
    let mut box_collider = Collider::new(body, Shape::cuboid(half));
    box_collider.material = Material { friction: 0.6, restitution: 0.0 };
    space.insert_collider(box_collider);

    let initial_speed = space.bodies[body].linvel.x;

    for _ in 0..30 {
        space.step();
    }
    let mid_speed = space.bodies[body].linvel.x;
    assert!(mid_speed < initial_speed, "friction should have slowed the box down");
    assert!(mid_speed >= 0.0, "friction should not reverse the box's direction of travel");

    for _ in 0..200 {
        space.step();
    }
    let final_speed = space.bodies[body].linvel.x;
    assert!(final_speed.abs() < 0.1, "box should have come to rest under friction, got {final_speed}");
    assert!((space.bodies[body].position.y - 0.5).abs() < 0.1, "box should still be resting on the floor");
}
