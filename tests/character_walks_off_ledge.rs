//! Scenario 4: a character walking across a platform loses traction the moment it
//! walks off the edge and falls freely, rather than floating in place or snapping
//! back onto the ledge behind it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rigid3d::character::CharacterController;
use rigid3d::math::{Matrix3x3, Vector};
use rigid3d::{CharacterConfig, Collider, CollisionEvent, IntegrationParameters, RigidBody, Shape, Space, WorldConfig};

#[test]
fn character_walks_off_ledge() {
    let mut space = Space::new(WorldConfig::default(), IntegrationParameters::default());

    // A platform that ends at x = 2.0; nothing supports the character past it.
    let platform = space.insert_body(RigidBody::new_static(Vector::new(0.0, 0.0, 0.0))).unwrap();
    space.insert_collider(Collider::new(platform, Shape::cuboid(Vector::new(2.0, 0.1, 2.0))));

    let char_body = space
        .insert_body(RigidBody::new_dynamic(Vector::new(0.0, 1.0, 0.0), 1.0, Matrix3x3::identity()))
        .unwrap();
    let char_collider = space.insert_collider(Collider::new(char_body, Shape::capsule(0.5, 0.4)));

    let lost_contact = Arc::new(AtomicBool::new(false));
    let lost_contact_writer = lost_contact.clone();
    space.register_event_handler(move |event| {
        if let CollisionEvent::CollisionEnded(pair) = event {
            if pair.collider1 == char_collider || pair.collider2 == char_collider {
                lost_contact_writer.store(true, Ordering::SeqCst);
            }
        }
    });

    let config = CharacterConfig::default();
    let mut controller = CharacterController::new(char_body, char_collider, Vector::y(), &config).unwrap();
    controller.set_desired_horizontal_velocity(Vector::new(3.0, 0.0, 0.0));
    space.register_updateable(Box::new(controller));

    // Let the character land on the platform before it starts walking off it.
    for _ in 0..30 {
        space.step();
    }
    assert!(!lost_contact.load(Ordering::SeqCst), "character should still be on the platform early on");

    let starting_y = space.bodies[char_body].position.y;

    for _ in 0..120 {
        space.step();
    }

    assert!(
        space.bodies[char_body].position.x > 2.0,
        "character should have walked past the platform's edge"
    );
    assert!(lost_contact.load(Ordering::SeqCst), "character should have lost contact with the platform");
    assert!(
        space.bodies[char_body].position.y < starting_y - 0.3,
        "character should be falling after leaving the platform"
    );
}
