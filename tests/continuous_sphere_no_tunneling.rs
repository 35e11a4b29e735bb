//! Scenario 6: a small, fast-moving sphere marked for continuous collision should be
//! stopped at a thin wall instead of tunneling through it in a single step, while the
//! same sphere left on discrete updates does tunnel — this is the contrast the
//! kernel's swept-sphere pass exists to fix.

use rigid3d::body::PositionUpdateMode;
use rigid3d::math::{Matrix3x3, Vector};
use rigid3d::{Collider, IntegrationParameters, RigidBody, Shape, Space, WorldConfig};

fn world_with_thin_wall() -> (Space, rigid3d::RigidBodyHandle) {
    let mut config = WorldConfig::default();
    config.gravity = Vector::zeros();
    let mut space = Space::new(config, IntegrationParameters::default());

    let wall = space.insert_body(RigidBody::new_static(Vector::new(5.0, 0.0, 0.0))).unwrap();
    space.insert_collider(Collider::new(wall, Shape::cuboid(Vector::new(0.05, 2.0, 2.0))));

    let ball = space
        .insert_body(RigidBody::new_dynamic(Vector::new(0.0, 0.0, 0.0), 1.0, Matrix3x3::identity()))
        .unwrap();
    space.insert_collider(Collider::new(ball, Shape::ball(0.1)));
    // Fast enough to cross the wall's 0.1-unit thickness in well under one 1/60s step.
    space.bodies[ball].linvel = Vector::new(600.0, 0.0, 0.0);

    (space, ball)
}

#[test]
fn continuous_sphere_stops_at_wall() {
    let (mut space, ball) = world_with_thin_wall();
    space.bodies[ball].update_mode = PositionUpdateMode::Continuous;

    space.step();

    let x = space.bodies[ball].position.x;
    assert!(x < 4.9, "continuous sphere should be clamped before reaching the wall, got x={x}");
    assert!(x > -1.0, "sphere should have made real progress toward the wall before being clamped");
}

#[test]
fn discrete_sphere_tunnels_through_the_same_wall() {
    let (mut space, ball) = world_with_thin_wall();
    // Left on the default `Discrete` update mode deliberately, to document the
    // failure mode continuous collision exists to avoid.

    space.step();

    let x = space.bodies[ball].position.x;
    assert!(x > 5.05, "discrete integration should tunnel straight through the thin wall, got x={x}");
}
